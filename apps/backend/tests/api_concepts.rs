//! Concept, selection and progress API tests.

mod common;

use axum::http::StatusCode;
use serde_json::Value;

use common::fixtures;
use common::TestContext;

/// Test creating and fetching a dictionary entry.
#[tokio::test]
async fn test_create_and_get_concept() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/concepts")
        .json(&fixtures::concept_request(Some(7), " perro ", "dog"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], 7);
    assert_eq!(body["source_text"], "perro");

    let response = server.get("/api/concepts/7").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["target_text"], "dog");
}

/// Test empty concept text is rejected.
#[tokio::test]
async fn test_create_concept_empty_text() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/concepts")
        .json(&fixtures::concept_request(None, "  ", "dog"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

/// Test fetching an unknown concept.
#[tokio::test]
async fn test_get_concept_not_found() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/api/concepts/99").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

/// Test selecting a concept creates learning records in both directions.
#[tokio::test]
async fn test_select_concept() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_concepts(2);

    let response = server.post("/api/concepts/2/selection").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["direction"], "a_to_b");
    assert_eq!(records[1]["direction"], "b_to_a");
    for record in records {
        assert_eq!(record["phase"]["phase"], "learning");
        assert_eq!(record["phase"]["session_position"], 1);
        assert_eq!(record["is_selected"], true);
    }

    let response = server.post("/api/concepts/99/selection").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

/// Test deselecting removes a concept from the queue but keeps its progress.
#[tokio::test]
async fn test_deselect_concept() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_selected(&server, 2).await;

    let response = server.delete("/api/concepts/1/selection").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["retired_records"], 2);

    let response = server
        .get("/api/study/queue")
        .add_query_param("direction", "a_to_b")
        .await;
    let body: Value = response.json();
    assert_eq!(body["cards"].as_array().unwrap().len(), 1);
    assert_eq!(body["cards"][0]["concept_id"], 2);

    let response = server.get("/api/progress/1/a_to_b").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["is_selected"], false);
}

/// Test marking a card mastered removes it from the queue until cleared.
#[tokio::test]
async fn test_set_mastered() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_selected(&server, 2).await;

    let response = server
        .put("/api/progress/1/b_to_a/mastered")
        .json(&fixtures::mastered_request(true))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["is_mastered"], true);

    let response = server
        .get("/api/study/queue")
        .add_query_param("direction", "b_to_a")
        .await;
    let body: Value = response.json();
    assert_eq!(body["cards"][0]["concept_id"], 2);
    assert_eq!(body["cards"].as_array().unwrap().len(), 1);

    server
        .put("/api/progress/1/b_to_a/mastered")
        .json(&fixtures::mastered_request(false))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/study/queue")
        .add_query_param("direction", "b_to_a")
        .await;
    let body: Value = response.json();
    assert_eq!(body["cards"].as_array().unwrap().len(), 2);
}

/// Test progress lookups for missing records and bad directions.
#[tokio::test]
async fn test_progress_errors() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.seed_concepts(1);

    let response = server.get("/api/progress/1/a_to_b").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/api/progress/1/sideways").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .put("/api/progress/1/a_to_b/mastered")
        .json(&fixtures::mastered_request(true))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
