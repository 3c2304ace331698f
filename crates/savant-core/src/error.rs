use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidPrecision,
    UnknownStrategy,
    MalformedInput,
    UnknownResultClass,
    InputReadFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::InvalidPrecision => "E1003",
            Self::UnknownStrategy => "E1004",
            Self::MalformedInput => "E2001",
            Self::UnknownResultClass => "E2002",
            Self::InputReadFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidPrecision => "Invalid precision value",
            Self::UnknownStrategy => "Unknown scoring strategy",
            Self::MalformedInput => "Malformed search hits input",
            Self::UnknownResultClass => "Result class not found in response",
            Self::InputReadFailed => "Input read failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .savant/config.toml and retry."),
            Self::InvalidPrecision => Some("Pass a finite decimal number, e.g. --precision 0.4."),
            Self::UnknownStrategy => Some("Use one of: threshold, relative."),
            Self::MalformedInput => {
                Some("Provide a JSON array of hits or a raw vector-store GraphQL response.")
            }
            Self::UnknownResultClass => Some("Pass --class with the class name used in the query."),
            Self::InputReadFailed => Some("Check the file path and read permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Configuration errors surfaced by the ranking engine before any hit is read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    /// Precision could not be parsed as a finite number.
    #[error("invalid precision {0:?}: expected a finite number")]
    InvalidPrecision(String),

    /// Strategy name is neither `threshold` nor `relative`.
    #[error("unknown scoring strategy {0:?}")]
    UnknownStrategy(String),
}

impl RankError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidPrecision(_) => ErrorCode::InvalidPrecision,
            Self::UnknownStrategy(_) => ErrorCode::UnknownStrategy,
        }
    }

    /// Remediation text for terminal and JSON error output.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or_else(|| self.error_code().message())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, RankError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidPrecision,
            ErrorCode::UnknownStrategy,
            ErrorCode::MalformedInput,
            ErrorCode::UnknownResultClass,
            ErrorCode::InputReadFailed,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidPrecision.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn rank_error_maps_to_code_and_hint() {
        let err = RankError::InvalidPrecision("abc".into());
        assert_eq!(err.error_code(), ErrorCode::InvalidPrecision);
        assert!(err.to_string().contains("abc"));
        assert!(err.suggestion().contains("--precision"));

        let err = RankError::UnknownStrategy("fuzzy".into());
        assert_eq!(err.error_code().code(), "E1004");
    }
}
