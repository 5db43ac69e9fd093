//! Request bodies and sample data for integration tests.

use serde_json::{json, Value};

/// Deterministic word pair for concept `id`.
pub fn word_pair(id: i64) -> (String, String) {
    (format!("palabra {}", id), format!("word {}", id))
}

pub fn review_request(concept_id: i64, direction: &str, quality: u8) -> Value {
    review_request_with(concept_id, direction, json!(quality))
}

/// Review body with an arbitrary JSON `quality`, for malformed input.
pub fn review_request_with(concept_id: i64, direction: &str, quality: Value) -> Value {
    json!({
        "concept_id": concept_id,
        "direction": direction,
        "quality": quality,
    })
}

pub fn concept_request(id: Option<i64>, source_text: &str, target_text: &str) -> Value {
    json!({
        "id": id,
        "source_text": source_text,
        "target_text": target_text,
    })
}

pub fn mastered_request(mastered: bool) -> Value {
    json!({ "mastered": mastered })
}
