#![forbid(unsafe_code)]
//! savant-core library.
//!
//! Typed data model for sentence-level search hits, ranking configuration,
//! and the machine-readable error taxonomy shared by the other crates.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for library failures, `anyhow::Result` for
//!   file/config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;

pub use config::{RankingConfig, StrategyKind};
pub use error::{ErrorCode, RankError};
pub use model::{AuthorRef, Localized, PublicationRef, SentenceHit};
