//! `savant rank`: rank experts from sentence-level vector-search hits.
//!
//! Input is either a JSON array of hits or the raw GraphQL response of the
//! sentence index, read from a file or stdin.

use crate::cmd::config::{RankingOverrides, resolve_ranking_config};
use crate::output::{CliError, OutputMode, pretty_rule, pretty_section, render_mode};
use clap::Args;
use savant_core::{ErrorCode, SentenceHit, StrategyKind};
use savant_rank::weaviate::{ResponseError, is_raw_response, parse_response};
use savant_rank::{AuthorRanking, RankingEngine, RankingSummary};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Evidence sentences longer than this are cut in pretty output.
const PRETTY_TEXT_WIDTH: usize = 96;

#[derive(Args, Debug)]
#[command(
    about = "Rank experts from vector-search hits",
    long_about = "Aggregate sentence-level nearest-neighbour hits into a ranked list of experts.\n\n\
                  Each admitted hit credits every author of its publication once per distinct \
                  sentence text. The threshold strategy scores (precision - distance) / precision; \
                  the relative strategy normalizes distances over the head of the result list.",
    after_help = "EXAMPLES:\n    # Rank hits saved from a query\n    savant rank --hits hits.json\n\n\
                  # Pipe a raw vector-store response, relative scoring\n    \
                  curl ... | savant rank --hits - --strategy relative --precision 1.5\n\n\
                  # Top 5 experts, SBERT hits only, machine-readable\n    \
                  savant rank --hits response.json --class SbertSentence --model sbert -n 5 --format json"
)]
pub struct RankArgs {
    /// Hits file (JSON array or raw vector-store response). `-` reads stdin.
    #[arg(long, value_name = "FILE", default_value = "-")]
    pub hits: PathBuf,

    /// Max distance (threshold) or spread multiplier (relative).
    #[arg(short, long, value_name = "P", allow_hyphen_values = true)]
    pub precision: Option<String>,

    /// Scoring strategy: threshold or relative.
    #[arg(short, long, value_name = "NAME")]
    pub strategy: Option<String>,

    /// Only use hits produced by this embedding model.
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Result class to read from a raw response (e.g. SbertSentence).
    #[arg(long, value_name = "NAME")]
    pub class: Option<String>,

    /// Maximum number of experts to return.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Only the first N hits of the input are considered.
    #[arg(long, value_name = "N")]
    pub result_cap: Option<usize>,
}

impl RankArgs {
    fn overrides(&self) -> RankingOverrides {
        RankingOverrides {
            precision: self.precision.clone(),
            strategy: self.strategy.clone(),
            model: self.model.clone(),
            result_cap: self.result_cap,
            max_experts: self.limit,
        }
    }
}

/// JSON envelope for rank output.
#[derive(Debug, Serialize)]
pub struct RankOutput {
    pub strategy: StrategyKind,
    /// Precision after clamping.
    pub precision: f64,
    /// Number of experts returned.
    pub count: usize,
    /// Array entries or response records that could not be read as hits.
    pub unreadable: usize,
    pub summary: RankingSummary,
    /// Best expert first.
    pub experts: Vec<AuthorRanking>,
}

#[derive(Debug)]
struct LoadedHits {
    hits: Vec<SentenceHit>,
    unreadable: usize,
}

/// Execute `savant rank`.
///
/// # Errors
///
/// Fails when the input cannot be read or parsed, the configuration is
/// invalid, or output rendering fails.
pub fn run_rank(args: &RankArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let config = resolve_ranking_config(project_root, &args.overrides())?;
    let engine = RankingEngine::new(&config).map_err(CliError::from)?;

    let body = read_input(&args.hits)?;
    let loaded = parse_hits(&body, args.class.as_deref())?;

    let (experts, summary) = engine.rank_with_summary(&loaded.hits);
    info!(
        "ranked {} experts from {} hits ({} admitted)",
        experts.len(),
        summary.hits,
        summary.admitted
    );

    let value = RankOutput {
        strategy: engine.strategy(),
        precision: engine.precision(),
        count: experts.len(),
        unreadable: loaded.unreadable,
        summary,
        experts,
    };

    render_mode(output, &value, render_text, render_pretty)
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let (label, result) = if path.as_os_str() == "-" {
        let mut buf = String::new();
        let result = io::stdin().read_to_string(&mut buf).map(|_| buf);
        ("stdin".to_string(), result)
    } else {
        (path.display().to_string(), std::fs::read_to_string(path))
    };

    result.map_err(|err| {
        CliError::coded(
            ErrorCode::InputReadFailed,
            format!("failed to read {label}: {err}"),
        )
    })
}

fn parse_hits(body: &str, class: Option<&str>) -> Result<LoadedHits, CliError> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        CliError::coded(
            ErrorCode::MalformedInput,
            format!("input is not valid JSON: {err}"),
        )
    })?;

    if is_raw_response(&value) {
        let parsed = parse_response(body, class).map_err(|err| response_error(&err))?;
        debug!("read {} hits from a raw response", parsed.hits.len());
        return Ok(LoadedHits {
            hits: parsed.hits,
            unreadable: parsed.unreadable,
        });
    }

    let Value::Array(items) = value else {
        return Err(CliError::coded(
            ErrorCode::MalformedInput,
            "expected a JSON array of hits or a vector-store response object",
        ));
    };
    if let Some(class) = class {
        debug!("--class {class} ignored for a plain hit array");
    }

    let total = items.len();
    let hits: Vec<SentenceHit> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(hit) => Some(hit),
            Err(err) => {
                warn!("skipping unreadable hit #{index}: {err}");
                None
            }
        })
        .collect();

    Ok(LoadedHits {
        unreadable: total - hits.len(),
        hits,
    })
}

fn response_error(err: &ResponseError) -> CliError {
    let code = match err {
        ResponseError::UnknownClass(..) | ResponseError::AmbiguousClass(_) => {
            ErrorCode::UnknownResultClass
        }
        ResponseError::Json(_) | ResponseError::Backend(_) | ResponseError::MissingData => {
            ErrorCode::MalformedInput
        }
    };
    CliError::coded(code, err.to_string())
}

fn render_text(value: &RankOutput, w: &mut dyn Write) -> io::Result<()> {
    if value.experts.is_empty() {
        return Ok(());
    }
    writeln!(w, "rank\tscore\tidentifier\tname\tpublications\tsentences")?;
    for (index, expert) in value.experts.iter().enumerate() {
        let sentences: usize = expert.publications.iter().map(|p| p.sentences.len()).sum();
        writeln!(
            w,
            "{}\t{:.4}\t{}\t{}\t{}\t{}",
            index + 1,
            expert.score,
            expert.identifier,
            expert.name,
            expert.publications.len(),
            sentences
        )?;
    }
    Ok(())
}

fn render_pretty(value: &RankOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "Experts ({} strategy, precision {:.2}): {} from {} of {} hits",
            value.strategy, value.precision, value.count, value.summary.admitted, value.summary.hits
        ),
    )?;
    if value.experts.is_empty() {
        writeln!(w, "No expert matched.")?;
        return Ok(());
    }

    for (index, expert) in value.experts.iter().enumerate() {
        let marker = if expert.own_institution { " *" } else { "" };
        writeln!(
            w,
            "{:>3}. {} [{}]{marker}",
            index + 1,
            display_name(expert),
            expert.identifier
        )?;
        writeln!(
            w,
            "     score {:.4}  max {:.4}  avg {:.4}  min distance {:.4}",
            expert.score, expert.max_score, expert.avg_score, expert.min_distance
        )?;
        for publication in &expert.publications {
            let meta = &publication.publication;
            let title = [meta.title.en.as_str(), meta.title.fr.as_str()]
                .into_iter()
                .find(|t| !t.is_empty())
                .unwrap_or(meta.doc_id.as_str());
            writeln!(
                w,
                "     - {:.4}  {} ({})",
                publication.score, title, meta.doc_id
            )?;
            for sentence in &publication.sentences {
                writeln!(
                    w,
                    "         {:.4}  {}",
                    sentence.score,
                    truncate(&sentence.text, PRETTY_TEXT_WIDTH)
                )?;
            }
        }
    }
    pretty_rule(w)?;
    if value.experts.iter().any(|e| e.own_institution) {
        writeln!(w, "* member of the home institution")?;
    }
    Ok(())
}

fn display_name(expert: &AuthorRanking) -> &str {
    if expert.name.is_empty() {
        &expert.identifier
    } else {
        &expert.name
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
