//! Progress record endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/progress/:concept_id/:direction
pub async fn get(
    State(state): State<AppState>,
    Path((concept_id, direction)): Path<(i64, String)>,
) -> Result<Json<ProgressRecord>> {
    let direction = parse_direction(&direction)?;
    let repo = state.repository()?;
    Ok(Json(state.study.progress(&repo, concept_id, direction)?))
}

/// PUT /api/progress/:concept_id/:direction/mastered
pub async fn set_mastered(
    State(state): State<AppState>,
    Path((concept_id, direction)): Path<(i64, String)>,
    Json(payload): Json<MasteredRequest>,
) -> Result<Json<ProgressRecord>> {
    let direction = parse_direction(&direction)?;
    let repo = state.repository()?;
    let record =
        state
            .study
            .set_mastered(&repo, concept_id, direction, payload.mastered, Utc::now())?;
    tracing::info!(concept_id, %direction, mastered = payload.mastered, "mastery updated");
    Ok(Json(record))
}
