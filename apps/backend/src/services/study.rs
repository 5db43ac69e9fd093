//! Study session operations: queue selection, response recording, daily
//! accounting and concept selection.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use rusqlite::Connection;
use vocab_core::queue::select_queue;
use vocab_core::types::{
    ConceptCard, DailyGoalProgress, DailyStats, Direction, ProgressRecord, Quality, QueuedCard,
};
use vocab_core::{CoreError, ReviewScheduler};

use crate::db::date_utils::study_day_bounds;
use crate::db::{
    ConceptRepository, ProgressRepository, ReviewLogEntry, ReviewLogRepository,
    SelectionRepository, SqliteRepository,
};
use crate::error::{ApiError, Result};
use crate::services::positions;

/// Consumer-facing study service. Holds the update engine and daily goal
/// settings; storage is passed in per call.
pub struct StudyService {
    scheduler: Box<dyn ReviewScheduler>,
    daily_goal: u32,
    daily_reset_hour: u32,
}

impl StudyService {
    pub fn new(scheduler: Box<dyn ReviewScheduler>, daily_goal: u32, daily_reset_hour: u32) -> Self {
        Self {
            scheduler,
            daily_goal,
            daily_reset_hour,
        }
    }

    /// Ordered cards due in `direction` at `now`, at most `limit`.
    pub fn fetch_queue(
        &self,
        store: &Connection,
        direction: Direction,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueuedCard>> {
        if limit < 0 {
            return Err(CoreError::InvalidLimit(limit).into());
        }
        let limit = limit as usize;

        let learning = store.learning_records(direction, limit)?;
        let remaining = limit.saturating_sub(learning.len());
        let reviews = if remaining > 0 {
            store.due_review_records(direction, now, remaining)?
        } else {
            Vec::new()
        };

        let records = select_queue(learning.into_iter().chain(reviews), direction, now, limit);

        let mut cards = Vec::with_capacity(records.len());
        for record in &records {
            match store.get_concept(record.concept_id)? {
                Some(concept) => cards.push(QueuedCard::new(&concept, record)),
                None => tracing::warn!(
                    concept_id = record.concept_id,
                    %direction,
                    "progress record without dictionary entry, skipping"
                ),
            }
        }
        Ok(cards)
    }

    /// Record one learner response and return the updated progress record.
    ///
    /// The position read, the update and the review log entry are written in
    /// one transaction; on error nothing is persisted.
    pub fn submit_response(
        &self,
        repo: &mut SqliteRepository,
        concept_id: i64,
        direction: Direction,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord> {
        // Timestamps are stored in milliseconds.
        let now = now.trunc_subsecs(3);
        repo.transaction(|tx| {
            if tx.get_concept(concept_id)?.is_none() {
                return Err(ApiError::NotFound(format!("concept {}", concept_id)));
            }

            let max_position = positions::current_max(tx, direction)?;
            let (current, max_position) = match tx.get_progress(concept_id, direction)? {
                Some(record) => (record, max_position),
                None => {
                    let position = max_position + 1;
                    let mut fresh = ProgressRecord::new_learning(concept_id, direction, position, now);
                    fresh.is_selected = tx.is_selected(concept_id)?;
                    tracing::debug!(concept_id, %direction, position, "creating progress record");
                    (fresh, position)
                }
            };

            let updated = self.scheduler.update(&current, quality, max_position, now);
            positions::record_placement(tx, &updated)?;
            tx.upsert_progress(&updated)?;

            let entry = ReviewLogEntry::new(&current, &updated, quality, now, self.scheduler.name());
            tx.insert_review(&entry)?;

            tracing::debug!(
                concept_id,
                %direction,
                quality = quality.to_value(),
                phase = updated.phase_kind().as_str(),
                "recorded response"
            );
            if entry.is_graduation() {
                tracing::info!(concept_id, %direction, "concept graduated to review");
            } else if current.phase_kind() != updated.phase_kind() {
                tracing::info!(concept_id, %direction, "concept returned to learning");
            }

            Ok(updated)
        })
    }

    /// Progress for the study day containing `now`, in one direction.
    pub fn daily_stats<Tz: TimeZone>(
        &self,
        store: &Connection,
        direction: Direction,
        now: &DateTime<Tz>,
    ) -> Result<DailyStats> {
        let (start, end) = study_day_bounds(now, self.daily_reset_hour);
        Ok(DailyStats {
            direction,
            studied_today: store.count_studied(direction, start, end)?,
            graduated_today: self.graduated_between(store, direction, start, end)?,
            daily_goal: self.daily_goal,
        })
    }

    /// Concepts graduated in `direction` within `[start, end)`.
    pub fn graduated_between(
        &self,
        store: &Connection,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32> {
        Ok(store.count_graduations(direction, start, end)?)
    }

    /// Daily goal progress summed over both directions.
    pub fn daily_goal_progress<Tz: TimeZone>(
        &self,
        store: &Connection,
        now: &DateTime<Tz>,
    ) -> Result<DailyGoalProgress> {
        let (start, end) = study_day_bounds(now, self.daily_reset_hour);
        let mut graduated = 0;
        for direction in Direction::ALL {
            graduated += self.graduated_between(store, direction, start, end)?;
        }
        Ok(DailyGoalProgress::new(graduated, self.daily_goal))
    }

    /// Add or rename a dictionary entry.
    pub fn add_concept(
        &self,
        store: &Connection,
        id: Option<i64>,
        source_text: &str,
        target_text: &str,
        now: DateTime<Utc>,
    ) -> Result<ConceptCard> {
        if source_text.trim().is_empty() || target_text.trim().is_empty() {
            return Err(ApiError::Validation("concept text must not be empty".to_string()));
        }
        Ok(store.insert_concept(id, source_text.trim(), target_text.trim(), now)?)
    }

    pub fn concept(&self, store: &Connection, concept_id: i64) -> Result<ConceptCard> {
        store
            .get_concept(concept_id)?
            .ok_or_else(|| ApiError::NotFound(format!("concept {}", concept_id)))
    }

    /// Start studying a concept: join the selection set and place both
    /// directions at the back of their learning queues. Existing records are
    /// reactivated with their memory state intact.
    pub fn select_concept(
        &self,
        repo: &mut SqliteRepository,
        concept_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressRecord>> {
        let now = now.trunc_subsecs(3);
        repo.transaction(|tx| {
            if tx.get_concept(concept_id)?.is_none() {
                return Err(ApiError::NotFound(format!("concept {}", concept_id)));
            }
            tx.select_concept(concept_id, now)?;
            tx.set_selected(concept_id, true, now)?;

            let mut records = Vec::with_capacity(Direction::ALL.len());
            for direction in Direction::ALL {
                let record = match tx.get_progress(concept_id, direction)? {
                    Some(existing) => existing,
                    None => {
                        let position = positions::next_position(tx, direction)?;
                        let record = ProgressRecord::new_learning(concept_id, direction, position, now);
                        tx.upsert_progress(&record)?;
                        record
                    }
                };
                records.push(record);
            }

            tracing::info!(concept_id, "concept selected");
            Ok(records)
        })
    }

    /// Stop studying a concept. Records are kept but leave every queue.
    pub fn deselect_concept(
        &self,
        repo: &mut SqliteRepository,
        concept_id: i64,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        repo.transaction(|tx| {
            tx.deselect_concept(concept_id)?;
            let retired = tx.set_selected(concept_id, false, now)?;
            tracing::info!(concept_id, retired, "concept deselected");
            Ok(retired)
        })
    }

    pub fn progress(
        &self,
        store: &Connection,
        concept_id: i64,
        direction: Direction,
    ) -> Result<ProgressRecord> {
        store
            .get_progress(concept_id, direction)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("progress for concept {} ({})", concept_id, direction))
            })
    }

    /// Set or clear the terminal mastered flag.
    pub fn set_mastered(
        &self,
        store: &Connection,
        concept_id: i64,
        direction: Direction,
        mastered: bool,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord> {
        if !store.set_mastered(concept_id, direction, mastered, now)? {
            return Err(ApiError::NotFound(format!(
                "progress for concept {} ({})",
                concept_id, direction
            )));
        }
        self.progress(store, concept_id, direction)
    }
}
