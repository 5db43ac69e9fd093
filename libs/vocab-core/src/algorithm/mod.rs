//! Spaced repetition update engines.

pub mod phased_sm2;

use crate::types::{ProgressRecord, Quality};
use chrono::{DateTime, Utc};

/// Trait for update engines driving a progress record through its phases.
pub trait ReviewScheduler: Send + Sync {
    /// Engine identifier, stored alongside each review log entry.
    fn name(&self) -> &'static str;

    /// Compute the record that results from answering `record` with `quality` at `now`.
    ///
    /// `max_learning_position` is the highest session position currently
    /// assigned in the record's direction; any learning placement goes
    /// strictly behind it.
    fn update(
        &self,
        record: &ProgressRecord,
        quality: Quality,
        max_learning_position: i64,
        now: DateTime<Utc>,
    ) -> ProgressRecord;
}
