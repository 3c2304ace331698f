#![forbid(unsafe_code)]
//! savant-rank library.
//!
//! Turns a flat, distance-ordered list of sentence hits into a ranked list of
//! experts with supporting evidence:
//!
//! ```text
//! hits ──► filter ──► aggregate ──► format ──► Vec<AuthorRanking>
//!            ▲
//!          score (threshold | relative), precision clamped once per call
//! ```
//!
//! # Conventions
//!
//! - **Errors**: configuration problems are [`savant_core::RankError`];
//!   malformed hits are dropped and counted, never surfaced.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod engine;
pub mod filter;
pub mod format;
pub mod precision;
pub mod score;
pub mod weaviate;

pub use aggregate::{AuthorAccumulator, PublicationAccumulator};
pub use engine::{RankingEngine, RankingSummary, rank};
pub use format::{AuthorRanking, PublicationRanking, SentenceEvidence, format_rankings};
pub use precision::{
    MAX_PRECISION, MIN_PRECISION, MIN_RELATIVE_PRECISION, clamp_precision, parse_precision,
};
pub use score::{DistanceRange, ScoringStrategy};
