//! Study queue eligibility and ordering.

use crate::types::{Direction, Phase, ProgressRecord};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Whether `record` should be presented in `direction` at `now`.
///
/// Learning records are always eligible; review records only once due.
/// Mastered and deselected records never are.
pub fn is_eligible(record: &ProgressRecord, direction: Direction, now: DateTime<Utc>) -> bool {
    if !record.is_selected || record.is_mastered || record.direction != direction {
        return false;
    }
    match record.phase {
        Phase::Learning { .. } => true,
        Phase::Review { next_review_at, .. } => next_review_at <= now,
    }
}

/// Presentation order: learning before review, learning by session position,
/// review by due time, then concept id.
pub fn queue_order(a: &ProgressRecord, b: &ProgressRecord) -> Ordering {
    match (&a.phase, &b.phase) {
        (Phase::Learning { session_position: pa }, Phase::Learning { session_position: pb }) => {
            pa.cmp(pb)
        }
        (Phase::Learning { .. }, Phase::Review { .. }) => Ordering::Less,
        (Phase::Review { .. }, Phase::Learning { .. }) => Ordering::Greater,
        (
            Phase::Review { next_review_at: da, .. },
            Phase::Review { next_review_at: db, .. },
        ) => da.cmp(db),
    }
    .then_with(|| a.concept_id.cmp(&b.concept_id))
}

/// Merge candidate records into the ordered queue for `direction`.
pub fn select_queue<I>(
    candidates: I,
    direction: Direction,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ProgressRecord>
where
    I: IntoIterator<Item = ProgressRecord>,
{
    let mut queue: Vec<ProgressRecord> = candidates
        .into_iter()
        .filter(|record| is_eligible(record, direction, now))
        .collect();
    queue.sort_by(queue_order);
    queue.truncate(limit);
    queue
}
