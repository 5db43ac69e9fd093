//! Daily stats and goal API tests.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use common::fixtures;
use common::{TestContext, TEST_DAILY_GOAL};

async fn answer(server: &TestServer, concept_id: i64, direction: &str, quality: u8) {
    server
        .post("/api/study/review")
        .json(&fixtures::review_request(concept_id, direction, quality))
        .await
        .assert_status_ok();
}

async fn daily(server: &TestServer, direction: &str) -> Value {
    let response = server
        .get("/api/stats/daily")
        .add_query_param("direction", direction)
        .await;
    response.assert_status_ok();
    response.json()
}

/// Test stats start at zero.
#[tokio::test]
async fn test_daily_stats_empty() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_selected(&server, 2).await;

    let body = daily(&server, "a_to_b").await;

    assert_eq!(body["direction"], "a_to_b");
    assert_eq!(body["studied_today"], 0);
    assert_eq!(body["graduated_today"], 0);
    assert_eq!(body["daily_goal"], TEST_DAILY_GOAL);
}

/// Test a graduation is counted once, and later reviews do not recount it.
#[tokio::test]
async fn test_daily_stats_counts_graduation_once() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_selected(&server, 2).await;

    answer(&server, 1, "a_to_b", 2).await;
    let body = daily(&server, "a_to_b").await;
    assert_eq!(body["studied_today"], 1);
    assert_eq!(body["graduated_today"], 0);

    answer(&server, 1, "a_to_b", 2).await;
    let body = daily(&server, "a_to_b").await;
    assert_eq!(body["graduated_today"], 1);

    // Reviewing the graduated card again the same day.
    answer(&server, 1, "a_to_b", 3).await;
    answer(&server, 2, "a_to_b", 1).await;
    let body = daily(&server, "a_to_b").await;
    assert_eq!(body["studied_today"], 2);
    assert_eq!(body["graduated_today"], 1);

    let body = daily(&server, "b_to_a").await;
    assert_eq!(body["studied_today"], 0);
    assert_eq!(body["graduated_today"], 0);
}

/// Test the goal sums graduations over both directions.
#[tokio::test]
async fn test_daily_goal_progress() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_selected(&server, 2).await;

    let response = server.get("/api/stats/goal").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["graduated_today"], 0);
    assert_eq!(body["remaining"], TEST_DAILY_GOAL);
    assert_eq!(body["goal_met"], false);

    for (concept_id, direction) in [(1, "a_to_b"), (1, "b_to_a"), (2, "a_to_b")] {
        answer(&server, concept_id, direction, 3).await;
        answer(&server, concept_id, direction, 3).await;
    }

    let response = server.get("/api/stats/goal").await;
    let body: Value = response.json();
    assert_eq!(body["graduated_today"], 3);
    assert_eq!(body["daily_goal"], TEST_DAILY_GOAL);
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["goal_met"], true);
}

/// Test a missing or invalid direction is rejected.
#[tokio::test]
async fn test_daily_stats_invalid_direction() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/stats/daily")
        .add_query_param("direction", "both")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
