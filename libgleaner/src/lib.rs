//! Gleaner - contest-sweeping engine for the Fediverse
//!
//! This library provides the core machinery for discovering contest posts
//! on a social platform, deciding which engagement actions each post asks
//! for, and carrying those actions out at a rate-governed, human-looking
//! pace.

pub mod churn;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pacing;
pub mod platforms;
pub mod textgen;
pub mod triage;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Window};
pub use engine::{Engine, RunSummary};
pub use error::{Failure, FatalError, GleanerError, Result};
pub use pacing::{Pacer, Shutdown};
pub use types::{ActionKind, ActionOutcome, ActionSet, Author, Post, Verdict};
