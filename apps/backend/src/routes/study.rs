//! Study endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use vocab_core::types::PhaseKind;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/study/queue
pub async fn queue(
    State(state): State<AppState>,
    Query(query): Query<StudyQueueQuery>,
) -> Result<Json<StudyQueueResponse>> {
    let direction = parse_direction(&query.direction)?;
    let limit = query.limit.unwrap_or(state.queue_limit);

    let cards = {
        let repo = state.repository()?;
        state.study.fetch_queue(&repo, direction, limit, Utc::now())?
    };

    let learning_count = cards
        .iter()
        .filter(|c| c.phase == PhaseKind::Learning)
        .count();
    let review_count = cards.len() - learning_count;

    Ok(Json(StudyQueueResponse {
        direction,
        cards,
        learning_count,
        review_count,
    }))
}

/// POST /api/study/review
pub async fn review(
    State(state): State<AppState>,
    Json(payload): Json<SubmitResponseRequest>,
) -> Result<Json<ProgressRecord>> {
    let direction = parse_direction(&payload.direction)?;
    let quality = parse_quality(&payload.quality)?;
    if payload.concept_id <= 0 {
        return Err(ApiError::Validation(format!(
            "invalid concept id {}",
            payload.concept_id
        )));
    }

    let mut repo = state.repository()?;
    let record =
        state
            .study
            .submit_response(&mut repo, payload.concept_id, direction, quality, Utc::now())?;

    Ok(Json(record))
}
