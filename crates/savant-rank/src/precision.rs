//! Precision parsing and per-strategy clamping.
//!
//! Precision means different things per strategy: an absolute distance
//! cutoff for [`StrategyKind::Threshold`], a spread multiplier over the best
//! distance for [`StrategyKind::Relative`]. Out-of-band values are clamped
//! silently; values that are not numbers at all are rejected.

use savant_core::{RankError, StrategyKind};

/// Lowest absolute threshold accepted by the threshold strategy.
pub const MIN_PRECISION: f64 = 0.05;

/// Highest absolute threshold accepted by the threshold strategy.
pub const MAX_PRECISION: f64 = 0.7;

/// Floor for the relative spread multiplier. Below 1.0 the cutoff would fall
/// under the best distance and stop the walk immediately.
pub const MIN_RELATIVE_PRECISION: f64 = 1.1;

/// Clamp a finite precision into the band used by `strategy`.
#[must_use]
pub const fn clamp_precision(strategy: StrategyKind, raw: f64) -> f64 {
    match strategy {
        StrategyKind::Threshold => raw.clamp(MIN_PRECISION, MAX_PRECISION),
        StrategyKind::Relative => raw.max(MIN_RELATIVE_PRECISION),
    }
}

/// Parse caller-supplied precision text.
///
/// # Errors
///
/// Returns [`RankError::InvalidPrecision`] when `raw` is not a finite number.
pub fn parse_precision(raw: &str) -> Result<f64, RankError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RankError::InvalidPrecision(raw.to_string()))
}

/// Reject NaN and infinities that slipped in through a config file.
///
/// # Errors
///
/// Returns [`RankError::InvalidPrecision`] for non-finite values.
pub fn ensure_finite(value: f64) -> Result<f64, RankError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RankError::InvalidPrecision(value.to_string()))
    }
}
