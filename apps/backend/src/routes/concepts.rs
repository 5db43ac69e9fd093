//! Dictionary and selection endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/concepts
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateConceptRequest>,
) -> Result<(StatusCode, Json<ConceptCard>)> {
    let repo = state.repository()?;
    let concept = state.study.add_concept(
        &repo,
        payload.id,
        &payload.source_text,
        &payload.target_text,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(concept)))
}

/// GET /api/concepts/:id
pub async fn get(
    State(state): State<AppState>,
    Path(concept_id): Path<i64>,
) -> Result<Json<ConceptCard>> {
    let repo = state.repository()?;
    Ok(Json(state.study.concept(&repo, concept_id)?))
}

/// POST /api/concepts/:id/selection
pub async fn select(
    State(state): State<AppState>,
    Path(concept_id): Path<i64>,
) -> Result<Json<SelectionResponse>> {
    let mut repo = state.repository()?;
    let records = state.study.select_concept(&mut repo, concept_id, Utc::now())?;
    Ok(Json(SelectionResponse {
        concept_id,
        records,
    }))
}

/// DELETE /api/concepts/:id/selection
pub async fn deselect(
    State(state): State<AppState>,
    Path(concept_id): Path<i64>,
) -> Result<Json<DeselectionResponse>> {
    let mut repo = state.repository()?;
    let retired_records = state.study.deselect_concept(&mut repo, concept_id, Utc::now())?;
    Ok(Json(DeselectionResponse {
        concept_id,
        retired_records,
    }))
}
