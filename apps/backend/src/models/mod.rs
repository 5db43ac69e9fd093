//! API request and response types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vocab_core::CoreError;

// Re-export shared types from vocab-core
pub use vocab_core::types::{
    ConceptCard, DailyGoalProgress, DailyStats, Direction, ProgressRecord, Quality, QueuedCard,
};

use crate::error::{ApiError, Result};

/// Parse a direction string from a request, as a validation error.
pub fn parse_direction(raw: &str) -> Result<Direction> {
    raw.parse::<Direction>().map_err(ApiError::from)
}

/// Parse a 1-3 quality value from a request, as a validation error.
///
/// The raw JSON value is checked here so that out-of-range and non-integer
/// values get the same validation response as 0 or 4.
pub fn parse_quality(raw: &Value) -> Result<Quality> {
    match raw.as_i64() {
        Some(value) => Quality::try_from(value).map_err(ApiError::from),
        None => Err(CoreError::InvalidQuality(raw.to_string()).into()),
    }
}

// Study types
#[derive(Debug, Serialize, Deserialize)]
pub struct StudyQueueQuery {
    pub direction: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudyQueueResponse {
    pub direction: Direction,
    pub cards: Vec<QueuedCard>,
    pub learning_count: usize,
    pub review_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponseRequest {
    pub concept_id: i64,
    pub direction: String,
    pub quality: Value,
}

// Stats types
#[derive(Debug, Serialize, Deserialize)]
pub struct DailyStatsQuery {
    pub direction: String,
}

// Concept types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConceptRequest {
    pub id: Option<i64>,
    pub source_text: String,
    pub target_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub concept_id: i64,
    pub records: Vec<ProgressRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeselectionResponse {
    pub concept_id: i64,
    pub retired_records: usize,
}

// Progress types
#[derive(Debug, Serialize, Deserialize)]
pub struct MasteredRequest {
    pub mastered: bool,
}
