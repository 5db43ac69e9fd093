//! Daily progress endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/stats/daily
pub async fn daily(
    State(state): State<AppState>,
    Query(query): Query<DailyStatsQuery>,
) -> Result<Json<DailyStats>> {
    let direction = parse_direction(&query.direction)?;
    let repo = state.repository()?;
    let stats = state.study.daily_stats(&repo, direction, &Local::now())?;
    Ok(Json(stats))
}

/// GET /api/stats/goal
pub async fn goal(State(state): State<AppState>) -> Result<Json<DailyGoalProgress>> {
    let repo = state.repository()?;
    let progress = state.study.daily_goal_progress(&repo, &Local::now())?;
    Ok(Json(progress))
}
