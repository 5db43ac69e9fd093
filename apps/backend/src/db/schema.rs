//! SQLite schema definitions and versioned migrations.
//!
//! Each migration runs in its own transaction and is recorded in
//! `schema_migrations`. Migrations are append-only: a database created by an
//! older build is brought forward without losing progress.

use crate::db::error::DbError;
use chrono::Utc;
use rusqlite::{params, Connection};

type Result<T> = std::result::Result<T, DbError>;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 4;

/// A single schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// v1: dictionary, selection set and the original progress table.
const V1_INITIAL: &str = r#"
CREATE TABLE IF NOT EXISTS concepts (
    id INTEGER PRIMARY KEY,
    source_text TEXT NOT NULL,
    target_text TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS selected_concepts (
    concept_id INTEGER PRIMARY KEY REFERENCES concepts(id),
    selected_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS word_progress (
    concept_id INTEGER NOT NULL REFERENCES concepts(id),
    direction INTEGER NOT NULL CHECK (direction IN (0, 1)),
    repetitions INTEGER NOT NULL DEFAULT 0,
    interval_days REAL NOT NULL DEFAULT 0,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    next_review_at INTEGER NOT NULL,
    last_review_at INTEGER,
    is_selected INTEGER NOT NULL DEFAULT 1,
    is_mastered INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (concept_id, direction)
);
"#;

/// v2: learning phase columns. Every row that exists at this point was
/// scheduled by interval only, so it is backfilled with a success count above
/// the graduation threshold.
const V2_LEARNING_PHASE: &str = r#"
ALTER TABLE word_progress ADD COLUMN learning_phase INTEGER NOT NULL DEFAULT 0;
ALTER TABLE word_progress ADD COLUMN session_position INTEGER;
ALTER TABLE word_progress ADD COLUMN hard_presses INTEGER NOT NULL DEFAULT 0;
ALTER TABLE word_progress ADD COLUMN successful_reviews INTEGER NOT NULL DEFAULT 0;

UPDATE word_progress SET successful_reviews = 3 WHERE learning_phase = 0;
"#;

/// v3: scheduling indexes, review log and position high-water marks.
const V3_REVIEW_LOG: &str = r#"
CREATE INDEX IF NOT EXISTS idx_word_progress_phase ON word_progress(learning_phase);
CREATE INDEX IF NOT EXISTS idx_word_progress_position ON word_progress(session_position);
CREATE INDEX IF NOT EXISTS idx_word_progress_due ON word_progress(direction, next_review_at);

CREATE TABLE IF NOT EXISTS review_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    concept_id INTEGER NOT NULL,
    direction INTEGER NOT NULL,
    quality INTEGER NOT NULL,
    reviewed_at INTEGER NOT NULL,
    phase_before TEXT NOT NULL,
    phase_after TEXT NOT NULL,
    interval_before REAL,
    interval_after REAL,
    ease_before REAL,
    ease_after REAL,
    algorithm TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_log_window ON review_log(direction, reviewed_at);

CREATE TABLE IF NOT EXISTS session_positions (
    direction INTEGER PRIMARY KEY,
    last_assigned INTEGER NOT NULL
);

INSERT OR IGNORE INTO session_positions (direction, last_assigned) VALUES (0, 0), (1, 0);
"#;

/// v4: ease kept across a demotion to learning. NULL for every other row.
const V4_RELEARN_EASE: &str = r#"
ALTER TABLE word_progress ADD COLUMN relearn_ease REAL;
"#;

/// All migrations in version order.
pub const MIGRATIONS: [Migration; 4] = [
    Migration {
        version: 1,
        name: "initial schema",
        sql: V1_INITIAL,
    },
    Migration {
        version: 2,
        name: "learning phase columns",
        sql: V2_LEARNING_PHASE,
    },
    Migration {
        version: 3,
        name: "review log and scheduling indexes",
        sql: V3_REVIEW_LOG,
    },
    Migration {
        version: 4,
        name: "relearn ease",
        sql: V4_RELEARN_EASE,
    },
];

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        );",
    )?;
    Ok(())
}

/// Highest applied migration version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> Result<i32> {
    ensure_migrations_table(conn)?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Bring the schema up to [`SCHEMA_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<i32> {
    migrate_to(conn, SCHEMA_VERSION)
}

/// Apply pending migrations up to and including `target`.
pub fn migrate_to(conn: &Connection, target: i32) -> Result<i32> {
    let applied = current_version(conn)?;
    tracing::debug!(current = applied, target_version = target, "checking schema version");

    let mut version = applied;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied && m.version <= target) {
        tracing::info!(version = migration.version, migration = migration.name, "applying migration");
        apply(conn, migration)?;
        version = migration.version;
    }

    Ok(version)
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql).map_err(|e| {
        DbError::Migration(format!("v{} ({}) failed: {}", migration.version, migration.name, e))
    })?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, Utc::now().timestamp_millis()],
    )?;
    tx.commit()?;
    Ok(())
}
