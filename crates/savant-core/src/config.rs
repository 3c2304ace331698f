use crate::error::RankError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Which distance-to-relevance conversion a ranking call uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// `(precision - distance) / precision`, hits beyond `precision` discarded.
    #[default]
    Threshold,
    /// Min-max normalization over the head of the distance-sorted hit list.
    Relative,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Relative => "relative",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = RankError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "threshold" => Ok(Self::Threshold),
            "relative" | "minmax" | "min-max" => Ok(Self::Relative),
            _ => Err(RankError::UnknownStrategy(raw.to_string())),
        }
    }
}

/// Scalar parameters of one ranking call.
///
/// Loaded from `.savant/config.toml` under the `[ranking]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Absolute distance threshold (threshold strategy) or relative spread
    /// multiplier (relative strategy). Clamped per strategy before use.
    #[serde(default = "default_precision")]
    pub precision: f64,

    /// Only the first `result_cap` hits of the input are considered.
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,

    /// When set, hits tagged with a different embedding model are ignored.
    #[serde(default)]
    pub model: Option<String>,

    /// Maximum number of experts to return; `None` keeps all of them.
    #[serde(default)]
    pub max_experts: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            precision: default_precision(),
            result_cap: default_result_cap(),
            model: None,
            max_experts: None,
        }
    }
}

impl RankingConfig {
    #[must_use]
    pub fn with_strategy(strategy: StrategyKind, precision: f64) -> Self {
        Self {
            strategy,
            precision,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `.savant/config.toml` under `project_root`; a missing file yields defaults.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".savant/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("loaded project config from {}", path.display());
    Ok(config)
}

/// Load `<config_dir>/savant/config.toml`; a missing file yields defaults.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("savant/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_precision() -> f64 {
    0.5
}

const fn default_result_cap() -> usize {
    100
}
