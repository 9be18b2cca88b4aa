//! Error types shared by the lookup pipeline
//!
//! Only conditions that abort a pass are errors. Out-of-range durations,
//! duplicate entries and weight reconciliation are reported through the
//! outcome types of their modules and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a log transformation or a generate pass
#[derive(Error, Debug)]
pub enum SkillTimeError {
    #[error("malformed skill string {input:?}: {reason}")]
    MalformedSkillString { input: String, reason: String },

    #[error("skill string {input:?} yields {count} argument tokens, expected key/value pairs")]
    OddArgumentTokens { input: String, count: usize },

    #[error("invalid mixture: {0}")]
    InvalidMixture(String),

    #[error("invalid bounds: lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error(
        "bounds unreachable: accepted {accepted} of {requested} samples after {draws} draws"
    )]
    BoundsUnreachable {
        accepted: usize,
        requested: usize,
        draws: u64,
    },

    #[error("store I/O failed at {}: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid document at {}:{line}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, SkillTimeError>;
