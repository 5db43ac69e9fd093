//! Environment configuration.
//!
//! Values come from the process environment (after `.env` is loaded by
//! dotenvy). A variable that is set but malformed is an error rather than a
//! silent fallback to the default.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use vocab_core::PhasedSm2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the study service.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Graduations per study day counted as a met goal.
    pub daily_goal: u32,
    /// Local hour (0-23) at which a new study day begins.
    pub daily_reset_hour: u32,
    /// Queue size used when a request does not pass `limit`.
    pub queue_limit: i64,
    pub scheduler: PhasedSm2,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PhasedSm2::default();

        let daily_reset_hour = parse(&lookup, "DAILY_RESET_HOUR", 0u32)?;
        if daily_reset_hour > 23 {
            return Err(invalid("DAILY_RESET_HOUR", daily_reset_hour, "must be 0-23"));
        }

        let queue_limit = parse(&lookup, "QUEUE_LIMIT", 20i64)?;
        if queue_limit < 0 {
            return Err(invalid("QUEUE_LIMIT", queue_limit, "must not be negative"));
        }

        let easy_bonus = parse(&lookup, "SRS_EASY_BONUS", defaults.easy_bonus)?;
        if !easy_bonus.is_finite() || easy_bonus < 1.0 {
            return Err(invalid("SRS_EASY_BONUS", easy_bonus, "must be finite and at least 1.0"));
        }

        let lapse_ease_penalty =
            parse(&lookup, "SRS_LAPSE_EASE_PENALTY", defaults.lapse_ease_penalty)?;
        if !lapse_ease_penalty.is_finite() || lapse_ease_penalty <= 0.0 {
            return Err(invalid("SRS_LAPSE_EASE_PENALTY", lapse_ease_penalty, "must be finite and positive"));
        }

        let graduation_threshold =
            parse(&lookup, "SRS_GRADUATION_THRESHOLD", defaults.graduation_threshold)?;
        if graduation_threshold == 0 {
            return Err(invalid("SRS_GRADUATION_THRESHOLD", graduation_threshold, "must be at least 1"));
        }

        let relearn_after_lapses =
            parse(&lookup, "SRS_RELEARN_AFTER_LAPSES", defaults.relearn_after_lapses)?;
        if relearn_after_lapses == 0 {
            return Err(invalid("SRS_RELEARN_AFTER_LAPSES", relearn_after_lapses, "must be at least 1"));
        }

        let scheduler = PhasedSm2 {
            graduation_threshold,
            hard_press_tolerance: parse(
                &lookup,
                "SRS_HARD_PRESS_TOLERANCE",
                defaults.hard_press_tolerance,
            )?,
            easy_bonus,
            lapse_ease_penalty,
            relearn_after_lapses,
            ..defaults
        };

        Ok(Self {
            database_path: match lookup("DATABASE_PATH") {
                Some(path) => PathBuf::from(path),
                None => default_database_path(),
            },
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(&lookup, "PORT", 3000u16)?,
            daily_goal: parse(&lookup, "DAILY_GOAL", 10u32)?,
            daily_reset_hour,
            queue_limit,
            scheduler,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_database_path() -> PathBuf {
    // Use app data directory for production, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-study")
        .join("progress.db")
}

fn parse<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
