//! Core types for the vocabulary review scheduler.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a concept is shown as the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Source word shown, target word expected.
    #[serde(rename = "a_to_b")]
    AToB,
    /// Target word shown, source word expected.
    #[serde(rename = "b_to_a")]
    BToA,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::AToB, Direction::BToA];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AToB => "a_to_b",
            Self::BToA => "b_to_a",
        }
    }

    /// Storage value (0 or 1).
    pub fn to_value(self) -> i64 {
        match self {
            Self::AToB => 0,
            Self::BToA => 1,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::AToB),
            1 => Some(Self::BToA),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a_to_b" => Ok(Self::AToB),
            "b_to_a" => Ok(Self::BToA),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

/// Learner's self-reported recall difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Hard,
    Medium,
    Easy,
}

impl Quality {
    /// Convert to 3-point numeric value (1-3).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Hard => 1,
            Self::Medium => 2,
            Self::Easy => 3,
        }
    }

    /// Medium and Easy count towards graduation; Hard does not.
    pub fn is_qualifying(self) -> bool {
        !matches!(self, Self::Hard)
    }
}

impl TryFrom<i64> for Quality {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Hard),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Easy),
            other => Err(CoreError::InvalidQuality(other.to_string())),
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

/// Scheduling phase of a progress record.
///
/// The learning variant is the only one carrying a session position, and the
/// review variant is the only one carrying interval and ease.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Learning {
        session_position: i64,
    },
    Review {
        interval_days: f64,
        ease_factor: f64,
        next_review_at: DateTime<Utc>,
    },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Learning { .. } => PhaseKind::Learning,
            Self::Review { .. } => PhaseKind::Review,
        }
    }
}

/// Phase without its payload, used for logging and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Learning,
    Review,
}

impl PhaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Review => "review",
        }
    }
}

/// Memory state of one concept in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub concept_id: i64,
    pub direction: Direction,
    pub phase: Phase,
    pub repetitions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review_at: Option<DateTime<Utc>>,
    pub hard_presses: u32,
    pub successful_reviews: u32,
    /// Ease lowered by review lapses, restored when a demoted record graduates again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relearn_ease: Option<f64>,
    pub is_mastered: bool,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Fresh learning-phase record placed at `session_position`.
    pub fn new_learning(
        concept_id: i64,
        direction: Direction,
        session_position: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            concept_id,
            direction,
            phase: Phase::Learning { session_position },
            repetitions: 0,
            last_review_at: None,
            hard_presses: 0,
            successful_reviews: 0,
            relearn_ease: None,
            is_mastered: false,
            is_selected: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn is_learning(&self) -> bool {
        matches!(self.phase, Phase::Learning { .. })
    }

    pub fn session_position(&self) -> Option<i64> {
        match self.phase {
            Phase::Learning { session_position } => Some(session_position),
            Phase::Review { .. } => None,
        }
    }

    pub fn interval_days(&self) -> Option<f64> {
        match self.phase {
            Phase::Review { interval_days, .. } => Some(interval_days),
            Phase::Learning { .. } => None,
        }
    }

    pub fn ease_factor(&self) -> Option<f64> {
        match self.phase {
            Phase::Review { ease_factor, .. } => Some(ease_factor),
            Phase::Learning { .. } => None,
        }
    }

    pub fn next_review_at(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            Phase::Review { next_review_at, .. } => Some(next_review_at),
            Phase::Learning { .. } => None,
        }
    }
}

/// Word pair from the concept dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptCard {
    pub id: i64,
    pub source_text: String,
    pub target_text: String,
}

impl ConceptCard {
    /// Side shown to the learner.
    pub fn prompt(&self, direction: Direction) -> &str {
        match direction {
            Direction::AToB => &self.source_text,
            Direction::BToA => &self.target_text,
        }
    }

    /// Side the learner is expected to recall.
    pub fn answer(&self, direction: Direction) -> &str {
        match direction {
            Direction::AToB => &self.target_text,
            Direction::BToA => &self.source_text,
        }
    }
}

/// One entry of a fetched study queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCard {
    pub concept_id: i64,
    pub direction: Direction,
    pub prompt: String,
    pub answer: String,
    pub phase: PhaseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
}

impl QueuedCard {
    pub fn new(concept: &ConceptCard, record: &ProgressRecord) -> Self {
        Self {
            concept_id: concept.id,
            direction: record.direction,
            prompt: concept.prompt(record.direction).to_string(),
            answer: concept.answer(record.direction).to_string(),
            phase: record.phase_kind(),
            session_position: record.session_position(),
            next_review_at: record.next_review_at(),
        }
    }
}

/// Per-direction progress for one study day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub direction: Direction,
    pub studied_today: u32,
    pub graduated_today: u32,
    pub daily_goal: u32,
}

/// Daily goal progress across both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoalProgress {
    pub graduated_today: u32,
    pub daily_goal: u32,
    pub remaining: u32,
    pub goal_met: bool,
}

impl DailyGoalProgress {
    pub fn new(graduated_today: u32, daily_goal: u32) -> Self {
        Self {
            graduated_today,
            daily_goal,
            remaining: daily_goal.saturating_sub(graduated_today),
            goal_met: graduated_today >= daily_goal,
        }
    }
}
