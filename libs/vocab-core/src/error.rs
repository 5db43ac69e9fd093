//! Error types for vocab-core.

use thiserror::Error;

/// Caller errors detected by the domain layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid quality {0}: expected 1 (hard), 2 (medium) or 3 (easy)")]
    InvalidQuality(String),

    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    #[error("invalid queue limit: {0}")]
    InvalidLimit(i64),
}
