//! Repository pattern for database access.
//!
//! The repository traits are implemented for [`rusqlite::Connection`], so the
//! same calls work on the open connection and inside a
//! [`rusqlite::Transaction`] (which derefs to a connection).
//! [`SqliteRepository`] owns the connection and hands out transactions.

use crate::db::error::DbError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::ops::Deref;
use std::path::Path;
use vocab_core::types::{ConceptCard, Direction, Phase, PhaseKind, ProgressRecord, Quality};

type Result<T> = std::result::Result<T, DbError>;

/// Repository for progress records, one per (concept, direction).
pub trait ProgressRepository {
    fn get_progress(&self, concept_id: i64, direction: Direction) -> Result<Option<ProgressRecord>>;
    fn upsert_progress(&self, record: &ProgressRecord) -> Result<()>;
    /// Selected, unmastered learning records by session position.
    fn learning_records(&self, direction: Direction, limit: usize) -> Result<Vec<ProgressRecord>>;
    /// Selected, unmastered review records due at `now`, most overdue first.
    fn due_review_records(
        &self,
        direction: Direction,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProgressRecord>>;
    fn max_session_position(&self, direction: Direction) -> Result<Option<i64>>;
    fn set_selected(&self, concept_id: i64, selected: bool, now: DateTime<Utc>) -> Result<usize>;
    fn set_mastered(
        &self,
        concept_id: i64,
        direction: Direction,
        mastered: bool,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Repository for the per-direction session position high-water mark.
pub trait SessionPositionRepository {
    fn last_assigned_position(&self, direction: Direction) -> Result<i64>;
    fn record_assigned_position(&self, direction: Direction, position: i64) -> Result<()>;
}

/// Repository for the concept dictionary.
pub trait ConceptRepository {
    fn get_concept(&self, id: i64) -> Result<Option<ConceptCard>>;
    fn insert_concept(
        &self,
        id: Option<i64>,
        source_text: &str,
        target_text: &str,
        now: DateTime<Utc>,
    ) -> Result<ConceptCard>;
}

/// Repository for the set of concepts the learner studies.
pub trait SelectionRepository {
    fn is_selected(&self, concept_id: i64) -> Result<bool>;
    fn select_concept(&self, concept_id: i64, now: DateTime<Utc>) -> Result<()>;
    fn deselect_concept(&self, concept_id: i64) -> Result<()>;
}

/// One learner response, as recorded in the review log.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReviewLogEntry {
    pub concept_id: i64,
    pub direction: Direction,
    pub quality: Quality,
    pub reviewed_at: DateTime<Utc>,
    pub phase_before: PhaseKind,
    pub phase_after: PhaseKind,
    pub interval_before: Option<f64>,
    pub interval_after: Option<f64>,
    pub ease_before: Option<f64>,
    pub ease_after: Option<f64>,
    pub algorithm: String,
}

impl ReviewLogEntry {
    pub fn new(
        before: &ProgressRecord,
        after: &ProgressRecord,
        quality: Quality,
        now: DateTime<Utc>,
        algorithm: &str,
    ) -> Self {
        Self {
            concept_id: after.concept_id,
            direction: after.direction,
            quality,
            reviewed_at: now,
            phase_before: before.phase_kind(),
            phase_after: after.phase_kind(),
            interval_before: before.interval_days(),
            interval_after: after.interval_days(),
            ease_before: before.ease_factor(),
            ease_after: after.ease_factor(),
            algorithm: algorithm.to_string(),
        }
    }

    pub fn is_graduation(&self) -> bool {
        self.phase_before == PhaseKind::Learning && self.phase_after == PhaseKind::Review
    }
}

/// Repository for the review log and the counts derived from it.
pub trait ReviewLogRepository {
    fn insert_review(&self, entry: &ReviewLogEntry) -> Result<i64>;
    /// Distinct concepts that moved from learning to review within `[start, end)`.
    fn count_graduations(
        &self,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32>;
    /// Distinct concepts answered at least once within `[start, end)`.
    fn count_studied(
        &self,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32>;
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating and migrating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        super::schema::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write made
    /// through the transaction.
    pub fn transaction<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<DbError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f(&*tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

impl Deref for SqliteRepository {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

const PROGRESS_COLUMNS: &str = "concept_id, direction, repetitions, interval_days, ease_factor,
    next_review_at, last_review_at, is_selected, is_mastered, learning_phase, session_position,
    hard_presses, successful_reviews, relearn_ease, created_at, updated_at";

/// Progress row exactly as stored.
#[derive(Debug, Clone)]
struct ProgressRow {
    concept_id: i64,
    direction: i64,
    repetitions: u32,
    interval_days: f64,
    ease_factor: f64,
    next_review_at: i64,
    last_review_at: Option<i64>,
    is_selected: bool,
    is_mastered: bool,
    learning_phase: bool,
    session_position: Option<i64>,
    hard_presses: u32,
    successful_reviews: u32,
    relearn_ease: Option<f64>,
    created_at: i64,
    updated_at: i64,
}

impl ProgressRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            concept_id: row.get(0)?,
            direction: row.get(1)?,
            repetitions: row.get(2)?,
            interval_days: row.get(3)?,
            ease_factor: row.get(4)?,
            next_review_at: row.get(5)?,
            last_review_at: row.get(6)?,
            is_selected: row.get(7)?,
            is_mastered: row.get(8)?,
            learning_phase: row.get(9)?,
            session_position: row.get(10)?,
            hard_presses: row.get(11)?,
            successful_reviews: row.get(12)?,
            relearn_ease: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    /// Flatten a record into storage columns. Learning rows keep neutral
    /// interval/ease values and use the last update as their due time.
    fn from_record(record: &ProgressRecord) -> Self {
        let (learning_phase, session_position, interval_days, ease_factor, next_review_at) =
            match record.phase {
                Phase::Learning { session_position } => {
                    (true, Some(session_position), 0.0, 2.5, record.updated_at)
                }
                Phase::Review {
                    interval_days,
                    ease_factor,
                    next_review_at,
                } => (false, None, interval_days, ease_factor, next_review_at),
            };

        Self {
            concept_id: record.concept_id,
            direction: record.direction.to_value(),
            repetitions: record.repetitions,
            interval_days,
            ease_factor,
            next_review_at: next_review_at.timestamp_millis(),
            last_review_at: record.last_review_at.map(|t| t.timestamp_millis()),
            is_selected: record.is_selected,
            is_mastered: record.is_mastered,
            learning_phase,
            session_position,
            hard_presses: record.hard_presses,
            successful_reviews: record.successful_reviews,
            relearn_ease: if learning_phase { record.relearn_ease } else { None },
            created_at: record.created_at.timestamp_millis(),
            updated_at: record.updated_at.timestamp_millis(),
        }
    }

    fn into_record(self) -> Result<ProgressRecord> {
        let direction = Direction::from_value(self.direction).ok_or_else(|| {
            DbError::InvalidData(format!(
                "concept {}: unknown direction {}",
                self.concept_id, self.direction
            ))
        })?;

        let phase = if self.learning_phase {
            let session_position = self.session_position.ok_or_else(|| {
                DbError::InvalidData(format!(
                    "concept {} ({}): learning row without session position",
                    self.concept_id, direction
                ))
            })?;
            Phase::Learning { session_position }
        } else {
            Phase::Review {
                interval_days: self.interval_days,
                ease_factor: self.ease_factor,
                next_review_at: from_millis(self.next_review_at)?,
            }
        };

        Ok(ProgressRecord {
            concept_id: self.concept_id,
            direction,
            phase,
            repetitions: self.repetitions,
            last_review_at: self.last_review_at.map(from_millis).transpose()?,
            hard_presses: self.hard_presses,
            successful_reviews: self.successful_reviews,
            relearn_ease: if self.learning_phase { self.relearn_ease } else { None },
            is_mastered: self.is_mastered,
            is_selected: self.is_selected,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::InvalidData(format!("timestamp out of range: {}", millis)))
}

fn collect_records(
    rows: impl Iterator<Item = rusqlite::Result<ProgressRow>>,
) -> Result<Vec<ProgressRecord>> {
    rows.map(|row| row.map_err(DbError::from).and_then(ProgressRow::into_record))
        .collect()
}

impl ProgressRepository for Connection {
    fn get_progress(&self, concept_id: i64, direction: Direction) -> Result<Option<ProgressRecord>> {
        let sql = format!(
            "SELECT {} FROM word_progress WHERE concept_id = ?1 AND direction = ?2",
            PROGRESS_COLUMNS
        );
        self.query_row(&sql, params![concept_id, direction.to_value()], ProgressRow::from_row)
            .optional()?
            .map(ProgressRow::into_record)
            .transpose()
    }

    fn upsert_progress(&self, record: &ProgressRecord) -> Result<()> {
        let row = ProgressRow::from_record(record);
        self.execute(
            "INSERT INTO word_progress (concept_id, direction, repetitions, interval_days, ease_factor,
                next_review_at, last_review_at, is_selected, is_mastered, learning_phase, session_position,
                hard_presses, successful_reviews, relearn_ease, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT (concept_id, direction) DO UPDATE SET
                repetitions = excluded.repetitions,
                interval_days = excluded.interval_days,
                ease_factor = excluded.ease_factor,
                next_review_at = excluded.next_review_at,
                last_review_at = excluded.last_review_at,
                is_selected = excluded.is_selected,
                is_mastered = excluded.is_mastered,
                learning_phase = excluded.learning_phase,
                session_position = excluded.session_position,
                hard_presses = excluded.hard_presses,
                successful_reviews = excluded.successful_reviews,
                relearn_ease = excluded.relearn_ease,
                updated_at = excluded.updated_at",
            params![
                row.concept_id,
                row.direction,
                row.repetitions,
                row.interval_days,
                row.ease_factor,
                row.next_review_at,
                row.last_review_at,
                row.is_selected,
                row.is_mastered,
                row.learning_phase,
                row.session_position,
                row.hard_presses,
                row.successful_reviews,
                row.relearn_ease,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    }

    fn learning_records(&self, direction: Direction, limit: usize) -> Result<Vec<ProgressRecord>> {
        let sql = format!(
            "SELECT {} FROM word_progress
             WHERE direction = ?1 AND learning_phase = 1 AND is_selected = 1 AND is_mastered = 0
             ORDER BY session_position, concept_id
             LIMIT ?2",
            PROGRESS_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt.query_map(params![direction.to_value(), limit as i64], ProgressRow::from_row)?;
        collect_records(rows)
    }

    fn due_review_records(
        &self,
        direction: Direction,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProgressRecord>> {
        let sql = format!(
            "SELECT {} FROM word_progress
             WHERE direction = ?1 AND learning_phase = 0 AND is_selected = 1 AND is_mastered = 0
                AND next_review_at <= ?2
             ORDER BY next_review_at, concept_id
             LIMIT ?3",
            PROGRESS_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt.query_map(
            params![direction.to_value(), now.timestamp_millis(), limit as i64],
            ProgressRow::from_row,
        )?;
        collect_records(rows)
    }

    fn max_session_position(&self, direction: Direction) -> Result<Option<i64>> {
        let max = self.query_row(
            "SELECT MAX(session_position) FROM word_progress WHERE direction = ?1 AND learning_phase = 1",
            params![direction.to_value()],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    fn set_selected(&self, concept_id: i64, selected: bool, now: DateTime<Utc>) -> Result<usize> {
        let count = self.execute(
            "UPDATE word_progress SET is_selected = ?1, updated_at = ?2 WHERE concept_id = ?3",
            params![selected, now.timestamp_millis(), concept_id],
        )?;
        Ok(count)
    }

    fn set_mastered(
        &self,
        concept_id: i64,
        direction: Direction,
        mastered: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let count = self.execute(
            "UPDATE word_progress SET is_mastered = ?1, updated_at = ?2 WHERE concept_id = ?3 AND direction = ?4",
            params![mastered, now.timestamp_millis(), concept_id, direction.to_value()],
        )?;
        Ok(count > 0)
    }
}

impl SessionPositionRepository for Connection {
    fn last_assigned_position(&self, direction: Direction) -> Result<i64> {
        let last = self
            .query_row(
                "SELECT last_assigned FROM session_positions WHERE direction = ?1",
                params![direction.to_value()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(last.unwrap_or(0))
    }

    fn record_assigned_position(&self, direction: Direction, position: i64) -> Result<()> {
        self.execute(
            "INSERT INTO session_positions (direction, last_assigned) VALUES (?1, ?2)
             ON CONFLICT (direction) DO UPDATE SET last_assigned = MAX(last_assigned, excluded.last_assigned)",
            params![direction.to_value(), position],
        )?;
        Ok(())
    }
}

impl ConceptRepository for Connection {
    fn get_concept(&self, id: i64) -> Result<Option<ConceptCard>> {
        self.query_row(
            "SELECT id, source_text, target_text FROM concepts WHERE id = ?1",
            params![id],
            |row| {
                Ok(ConceptCard {
                    id: row.get(0)?,
                    source_text: row.get(1)?,
                    target_text: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    fn insert_concept(
        &self,
        id: Option<i64>,
        source_text: &str,
        target_text: &str,
        now: DateTime<Utc>,
    ) -> Result<ConceptCard> {
        let id = match id {
            Some(id) => {
                self.execute(
                    "INSERT INTO concepts (id, source_text, target_text, created_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (id) DO UPDATE SET source_text = excluded.source_text, target_text = excluded.target_text",
                    params![id, source_text, target_text, now.timestamp_millis()],
                )?;
                id
            }
            None => {
                self.execute(
                    "INSERT INTO concepts (source_text, target_text, created_at) VALUES (?1, ?2, ?3)",
                    params![source_text, target_text, now.timestamp_millis()],
                )?;
                self.last_insert_rowid()
            }
        };

        Ok(ConceptCard {
            id,
            source_text: source_text.to_string(),
            target_text: target_text.to_string(),
        })
    }
}

impl SelectionRepository for Connection {
    fn is_selected(&self, concept_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .query_row(
                "SELECT concept_id FROM selected_concepts WHERE concept_id = ?1",
                params![concept_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn select_concept(&self, concept_id: i64, now: DateTime<Utc>) -> Result<()> {
        self.execute(
            "INSERT OR IGNORE INTO selected_concepts (concept_id, selected_at) VALUES (?1, ?2)",
            params![concept_id, now.timestamp_millis()],
        )?;
        Ok(())
    }

    fn deselect_concept(&self, concept_id: i64) -> Result<()> {
        self.execute(
            "DELETE FROM selected_concepts WHERE concept_id = ?1",
            params![concept_id],
        )?;
        Ok(())
    }
}

impl ReviewLogRepository for Connection {
    fn insert_review(&self, entry: &ReviewLogEntry) -> Result<i64> {
        self.execute(
            "INSERT INTO review_log (concept_id, direction, quality, reviewed_at, phase_before, phase_after,
                interval_before, interval_after, ease_before, ease_after, algorithm)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.concept_id,
                entry.direction.to_value(),
                entry.quality.to_value(),
                entry.reviewed_at.timestamp_millis(),
                entry.phase_before.as_str(),
                entry.phase_after.as_str(),
                entry.interval_before,
                entry.interval_after,
                entry.ease_before,
                entry.ease_after,
                entry.algorithm,
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn count_graduations(
        &self,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32> {
        let count = self.query_row(
            "SELECT COUNT(DISTINCT concept_id) FROM review_log
             WHERE direction = ?1 AND phase_before = 'learning' AND phase_after = 'review'
                AND reviewed_at >= ?2 AND reviewed_at < ?3",
            params![direction.to_value(), start.timestamp_millis(), end.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_studied(
        &self,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32> {
        let count = self.query_row(
            "SELECT COUNT(DISTINCT concept_id) FROM review_log
             WHERE direction = ?1 AND reviewed_at >= ?2 AND reviewed_at < ?3",
            params![direction.to_value(), start.timestamp_millis(), end.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
