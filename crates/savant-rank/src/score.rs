//! Distance-to-relevance conversion.
//!
//! Two strategies are available:
//!
//! | Strategy    | Score                                   | Admissible when        |
//! |-------------|-----------------------------------------|------------------------|
//! | `threshold` | `(p - d) / p`                           | `d <= p`, score > 0    |
//! | `relative`  | `max(0, (max - d) / (max - min))`       | a range exists         |
//!
//! For `relative`, `min` is the best distance and `max` the last distance
//! visited before the walk reached `p * min`. The range is computed once per
//! ranking call from the whole candidate list; every hit is then scored
//! against it.

use savant_core::{SentenceHit, StrategyKind};
use tracing::debug;

/// Threshold score: `(precision - distance) / precision`.
///
/// Returns `None` when the hit lies beyond the threshold.
#[must_use]
pub fn threshold_score(distance: f64, precision: f64) -> Option<f64> {
    if distance > precision {
        return None;
    }
    Some((precision - distance) / precision)
}

/// Normalization range for the relative strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRange {
    pub min: f64,
    pub max: f64,
}

impl DistanceRange {
    /// Walk ascending distances until one reaches `precision * min`.
    ///
    /// The hit that trips the cutoff is still the last visited one, so it
    /// becomes `max` and scores exactly zero. Returns `None` for an empty
    /// sequence.
    #[must_use]
    pub fn from_sorted(distances: impl IntoIterator<Item = f64>, precision: f64) -> Option<Self> {
        let mut distances = distances.into_iter();
        let min = distances.next()?;
        let cutoff = precision * min;
        let mut max = min;
        for distance in distances {
            max = distance;
            if distance >= cutoff {
                break;
            }
        }
        Some(Self { min, max })
    }

    /// True when every visited hit shared the same distance.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }
}

/// Min-max normalized score, floored at zero.
///
/// A degenerate range scores 1.0 at or below its single distance and 0.0
/// above it.
#[must_use]
pub fn relative_score(distance: f64, range: DistanceRange) -> f64 {
    if range.is_degenerate() {
        return if distance <= range.min { 1.0 } else { 0.0 };
    }
    ((range.max - distance) / (range.max - range.min)).max(0.0)
}

/// A scorer configured for one ranking call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringStrategy {
    Threshold { precision: f64 },
    Relative { range: Option<DistanceRange> },
}

impl ScoringStrategy {
    /// Build the scorer for the candidate `hits` of this call. `precision`
    /// must already be clamped.
    ///
    /// Hits with an invalid distance are skipped when computing the
    /// relative range. The range walk assumes ascending distances; the first
    /// valid candidate is taken as the best one, whatever its relations.
    #[must_use]
    pub fn for_hits<'h>(
        kind: StrategyKind,
        precision: f64,
        hits: impl IntoIterator<Item = &'h SentenceHit>,
    ) -> Self {
        match kind {
            StrategyKind::Threshold => Self::Threshold { precision },
            StrategyKind::Relative => {
                let distances: Vec<f64> = hits
                    .into_iter()
                    .filter(|hit| hit.has_valid_distance())
                    .map(|hit| hit.distance)
                    .collect();
                if distances.windows(2).any(|pair| pair[1] < pair[0]) {
                    debug!("candidate distances are not ascending; range follows input order");
                }
                Self::Relative {
                    range: DistanceRange::from_sorted(distances, precision),
                }
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Threshold { .. } => StrategyKind::Threshold,
            Self::Relative { .. } => StrategyKind::Relative,
        }
    }

    /// Score one distance, or `None` when the hit is inadmissible.
    ///
    /// The threshold strategy rejects non-positive scores; the relative
    /// strategy admits zero so that evidence past the cutoff is still kept.
    #[must_use]
    pub fn score(&self, distance: f64) -> Option<f64> {
        match *self {
            Self::Threshold { precision } => {
                threshold_score(distance, precision).filter(|score| *score > 0.0)
            }
            Self::Relative { range } => range.map(|range| relative_score(distance, range)),
        }
    }
}
