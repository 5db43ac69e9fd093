//! Session position assignment for learning-phase records.
//!
//! Positions grow per direction and are never handed out twice. The current
//! maximum is read from the store on every call, inside the caller's
//! transaction, so it cannot drift from what is persisted.

use crate::db::{DbError, ProgressRepository, SessionPositionRepository};
use vocab_core::types::{Direction, ProgressRecord};

type Result<T> = std::result::Result<T, DbError>;

/// Highest position ever assigned in `direction`, 0 if none.
pub fn current_max<R>(store: &R, direction: Direction) -> Result<i64>
where
    R: ProgressRepository + SessionPositionRepository + ?Sized,
{
    let learning_max = store.max_session_position(direction)?.unwrap_or(0);
    let high_water = store.last_assigned_position(direction)?;
    Ok(learning_max.max(high_water))
}

/// Reserve the position behind every queued card in `direction`.
pub fn next_position<R>(store: &R, direction: Direction) -> Result<i64>
where
    R: ProgressRepository + SessionPositionRepository + ?Sized,
{
    let position = current_max(store, direction)? + 1;
    store.record_assigned_position(direction, position)?;
    Ok(position)
}

/// Persist the high-water mark for a record the engine placed in the queue.
pub fn record_placement<R>(store: &R, record: &ProgressRecord) -> Result<()>
where
    R: SessionPositionRepository + ?Sized,
{
    if let Some(position) = record.session_position() {
        store.record_assigned_position(record.direction, position)?;
    }
    Ok(())
}
