//! Core review-scheduling library for the vocabulary study service.
//!
//! Provides:
//! - Progress record types (ProgressRecord, Phase, Direction, Quality, etc.)
//! - The phased SM-2 update engine (learning queue followed by spaced review)
//! - Study queue eligibility and ordering
//! - Daily goal arithmetic

pub mod algorithm;
pub mod error;
pub mod queue;
pub mod types;

pub use algorithm::{phased_sm2::PhasedSm2, ReviewScheduler};
pub use error::CoreError;
pub use queue::{is_eligible, queue_order, select_queue};
pub use types::{
    ConceptCard, DailyGoalProgress, DailyStats, Direction, Phase, PhaseKind, ProgressRecord,
    Quality, QueuedCard,
};
