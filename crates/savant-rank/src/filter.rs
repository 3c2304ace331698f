//! Hit admission and per-author text deduplication.
//!
//! Filtering happens in two passes. [`select_candidates`] bounds the input to
//! the hits this call considers at all (result cap, embedding model); the
//! relative scorer computes its distance range over that list.
//! [`admissible_hits`] then drops malformed hits and scores the rest.
//!
//! Deduplication is by literal sentence text. The same sentence is often
//! indexed once per embedding model, under a different sentence id, and must
//! not credit an author twice.

use crate::score::ScoringStrategy;
use savant_core::{AuthorRef, PublicationRef, SentenceHit};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Counters describing why hits did not reach aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Hits inside the result cap.
    pub considered: usize,
    /// Hits past the result cap.
    pub beyond_cap: usize,
    /// Hits produced by another embedding model than the requested one.
    pub off_model: usize,
    /// Hits missing a publication or authors, or with an invalid distance.
    pub malformed: usize,
    /// Hits the scoring strategy rejected.
    pub inadmissible: usize,
}

/// A hit that passed every filter, with its relations unwrapped.
#[derive(Debug, Clone, Copy)]
pub struct ScoredHit<'h> {
    pub hit: &'h SentenceHit,
    pub publication: &'h PublicationRef,
    pub authors: &'h [AuthorRef],
    pub score: f64,
}

/// Keep the first `result_cap` hits whose model matches `model`.
///
/// Hits without a model tag are always kept; only a conflicting tag excludes
/// a hit.
pub fn select_candidates<'h>(
    hits: &'h [SentenceHit],
    result_cap: usize,
    model: Option<&str>,
    stats: &mut FilterStats,
) -> Vec<&'h SentenceHit> {
    let capped = hits.len().min(result_cap);
    stats.considered += capped;
    stats.beyond_cap += hits.len() - capped;

    hits[..capped]
        .iter()
        .filter(|hit| match (model, hit.model.as_deref()) {
            (Some(wanted), Some(actual)) if wanted != actual => {
                stats.off_model += 1;
                false
            }
            _ => true,
        })
        .collect()
}

/// Drop malformed hits and score the rest, preserving input order.
pub fn admissible_hits<'h>(
    candidates: &[&'h SentenceHit],
    scorer: &ScoringStrategy,
    stats: &mut FilterStats,
) -> Vec<ScoredHit<'h>> {
    let mut out = Vec::with_capacity(candidates.len());
    for &hit in candidates {
        let Some((publication, authors)) = hit.relations() else {
            debug!(
                "dropping hit {} without publication or authors",
                hit.sentence_id
            );
            stats.malformed += 1;
            continue;
        };
        if !hit.has_valid_distance() {
            debug!(
                "dropping hit {} with invalid distance {}",
                hit.sentence_id, hit.distance
            );
            stats.malformed += 1;
            continue;
        }

        let Some(score) = scorer.score(hit.distance) else {
            trace!(
                "hit {} at distance {} is inadmissible",
                hit.sentence_id, hit.distance
            );
            stats.inadmissible += 1;
            continue;
        };

        out.push(ScoredHit {
            hit,
            publication,
            authors,
            score,
        });
    }
    out
}

/// Remembers which sentence texts each author has already been credited for.
#[derive(Debug, Default)]
pub struct TextDeduper<'h> {
    credited: HashMap<&'h str, HashSet<&'h str>>,
}

impl<'h> TextDeduper<'h> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text` for `author`; false if it was credited before.
    pub fn first_credit(&mut self, author: &'h str, text: &'h str) -> bool {
        self.credited.entry(author).or_default().insert(text)
    }
}
