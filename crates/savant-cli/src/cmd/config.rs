//! `savant config`: effective ranking configuration.
//!
//! Layers, lowest to highest: built-in defaults, `.savant/config.toml`,
//! `SAVANT_PRECISION` / `SAVANT_STRATEGY`, command-line flags.

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode};
use savant_core::config::{load_project_config, load_user_config};
use savant_core::{ErrorCode, RankError, RankingConfig, StrategyKind};
use savant_rank::parse_precision;
use serde::Serialize;
use std::path::Path;

/// Optional values that replace fields of a [`RankingConfig`].
///
/// Precision and strategy stay textual until applied so that env vars and
/// flags report the same errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingOverrides {
    pub precision: Option<String>,
    pub strategy: Option<String>,
    pub model: Option<String>,
    pub result_cap: Option<usize>,
    pub max_experts: Option<usize>,
}

impl RankingOverrides {
    /// Overrides taken from `SAVANT_PRECISION` and `SAVANT_STRATEGY`.
    pub fn from_env() -> Self {
        Self::from_env_values(
            std::env::var("SAVANT_PRECISION").ok(),
            std::env::var("SAVANT_STRATEGY").ok(),
        )
    }

    fn from_env_values(precision: Option<String>, strategy: Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            precision: non_empty(precision),
            strategy: non_empty(strategy),
            ..Self::default()
        }
    }

    /// Apply this layer on top of `config`.
    pub fn apply(&self, mut config: RankingConfig) -> Result<RankingConfig, RankError> {
        if let Some(raw) = &self.strategy {
            config.strategy = raw.parse::<StrategyKind>()?;
        }
        if let Some(raw) = &self.precision {
            config.precision = parse_precision(raw)?;
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(cap) = self.result_cap {
            config.result_cap = cap;
        }
        if let Some(limit) = self.max_experts {
            config.max_experts = Some(limit);
        }
        Ok(config)
    }
}

/// Resolve the ranking configuration for `project_root` with `flags` on top.
pub fn resolve_ranking_config(
    project_root: &Path,
    flags: &RankingOverrides,
) -> Result<RankingConfig, CliError> {
    let project = load_project_config(project_root)
        .map_err(|err| CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")))?;
    let config = RankingOverrides::from_env().apply(project.ranking)?;
    Ok(flags.apply(config)?)
}

#[derive(Debug, Serialize)]
struct ConfigOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    project_file: Option<String>,
    ranking: RankingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

/// Execute `savant config`.
///
/// # Errors
///
/// Fails when a config file cannot be parsed, an environment override is
/// invalid, or output rendering fails.
pub fn run_config(output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let ranking = resolve_ranking_config(project_root, &RankingOverrides::default())?;
    let user = load_user_config()
        .map_err(|err| CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")))?;
    let project_path = project_root.join(".savant/config.toml");

    let value = ConfigOutput {
        project_file: project_path
            .exists()
            .then(|| project_path.display().to_string()),
        ranking,
        output: user.output,
    };

    render_mode(
        output,
        &value,
        |v, w| {
            for (key, val) in config_lines(v) {
                writeln!(w, "{key}={val}")?;
            }
            Ok(())
        },
        |v, w| {
            pretty_section(w, "Ranking configuration")?;
            for (key, val) in config_lines(v) {
                pretty_kv(w, key, val)?;
            }
            Ok(())
        },
    )
}

fn config_lines(value: &ConfigOutput) -> Vec<(&'static str, String)> {
    let ranking = &value.ranking;
    let unset = || "-".to_string();
    vec![
        ("strategy", ranking.strategy.to_string()),
        ("precision", ranking.precision.to_string()),
        ("result_cap", ranking.result_cap.to_string()),
        ("model", ranking.model.clone().unwrap_or_else(unset)),
        (
            "max_experts",
            ranking.max_experts.map_or_else(unset, |n| n.to_string()),
        ),
        ("output", value.output.clone().unwrap_or_else(unset)),
        (
            "project_file",
            value.project_file.clone().unwrap_or_else(unset),
        ),
    ]
}
