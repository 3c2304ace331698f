//! Ranking entry point.
//!
//! [`RankingEngine`] validates and clamps configuration once, then runs the
//! pure pipeline for each call:
//!
//! 1. select candidates (result cap, embedding model)
//! 2. build the scorer (the relative strategy derives its range here)
//! 3. drop malformed and inadmissible hits
//! 4. fold hits per author with text deduplication
//! 5. order and emit rankings
//!
//! The engine holds no state between calls and is safe to share across
//! threads.

use crate::aggregate::AuthorAggregator;
use crate::filter::{FilterStats, admissible_hits, select_candidates};
use crate::format::{AuthorRanking, format_rankings};
use crate::precision::{clamp_precision, ensure_finite};
use crate::score::ScoringStrategy;
use savant_core::{RankError, RankingConfig, SentenceHit, StrategyKind};
use serde::Serialize;
use tracing::{debug, instrument};

/// What happened to the hits of one ranking call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankingSummary {
    pub hits: usize,
    #[serde(flatten)]
    pub filter: FilterStats,
    /// Hits that reached aggregation.
    pub admitted: usize,
    /// `(hit, author)` credits skipped because the text was already counted.
    pub duplicate_credits: usize,
    /// Authors in the final output.
    pub authors: usize,
}

/// A validated ranking configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEngine {
    strategy: StrategyKind,
    precision: f64,
    result_cap: usize,
    model: Option<String>,
    max_experts: Option<usize>,
}

impl RankingEngine {
    /// Validate `config` and clamp its precision for the chosen strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InvalidPrecision`] for a non-finite precision.
    pub fn new(config: &RankingConfig) -> Result<Self, RankError> {
        let raw = ensure_finite(config.precision)?;
        let precision = clamp_precision(config.strategy, raw);
        if (precision - raw).abs() > f64::EPSILON {
            debug!(
                "precision {raw} clamped to {precision} for {} strategy",
                config.strategy
            );
        }

        Ok(Self {
            strategy: config.strategy,
            precision,
            result_cap: config.result_cap,
            model: config.model.clone(),
            max_experts: config.max_experts,
        })
    }

    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Precision after clamping; used for every hit of every call.
    #[must_use]
    pub const fn precision(&self) -> f64 {
        self.precision
    }

    /// Rank experts for `hits`, which should be sorted by ascending distance.
    #[must_use]
    pub fn rank(&self, hits: &[SentenceHit]) -> Vec<AuthorRanking> {
        self.rank_with_summary(hits).0
    }

    /// Rank experts and report how many hits each stage discarded.
    #[instrument(skip_all, fields(hits = hits.len(), strategy = %self.strategy))]
    pub fn rank_with_summary(&self, hits: &[SentenceHit]) -> (Vec<AuthorRanking>, RankingSummary) {
        let mut stats = FilterStats::default();
        let candidates =
            select_candidates(hits, self.result_cap, self.model.as_deref(), &mut stats);

        let scorer =
            ScoringStrategy::for_hits(self.strategy, self.precision, candidates.iter().copied());
        if let ScoringStrategy::Relative { range: Some(range) } = scorer {
            debug!("relative distance range [{}, {}]", range.min, range.max);
        }

        let admitted = admissible_hits(&candidates, &scorer, &mut stats);
        let mut aggregator = AuthorAggregator::new();
        for hit in &admitted {
            aggregator.add(hit);
        }
        let duplicate_credits = aggregator.duplicate_credits();
        let rankings = format_rankings(aggregator.finish(), self.max_experts);

        let summary = RankingSummary {
            hits: hits.len(),
            filter: stats,
            admitted: admitted.len(),
            duplicate_credits,
            authors: rankings.len(),
        };
        debug!(?summary, "ranking complete");

        (rankings, summary)
    }
}

/// One-shot ranking with a fresh engine.
///
/// # Errors
///
/// Returns [`RankError::InvalidPrecision`] for a non-finite precision.
pub fn rank(
    hits: &[SentenceHit],
    config: &RankingConfig,
) -> Result<Vec<AuthorRanking>, RankError> {
    Ok(RankingEngine::new(config)?.rank(hits))
}
