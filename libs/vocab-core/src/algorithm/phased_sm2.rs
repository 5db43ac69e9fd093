//! SM-2 with a bounded learning phase.
//!
//! New records cycle through a session queue until they collect enough
//! Medium/Easy answers, then graduate into interval-based review. Review
//! lapses shorten the interval and, when repeated, send the record back to
//! the learning queue.

use super::ReviewScheduler;
use crate::types::{Phase, ProgressRecord, Quality};
use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Phased SM-2 engine with configurable parameters.
#[derive(Debug, Clone)]
pub struct PhasedSm2 {
    /// Qualifying answers needed to leave the learning phase.
    pub graduation_threshold: u32,
    /// Hard presses allowed before each extra one raises the threshold.
    pub hard_press_tolerance: u32,
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub graduating_interval: f64,
    pub lapse_interval: f64,
    pub lapse_ease_penalty: f64,
    pub medium_ease_delta: f64,
    pub easy_ease_delta: f64,
    pub easy_bonus: f64,
    /// Review-phase Hard presses that demote the record to learning.
    pub relearn_after_lapses: u32,
    pub maximum_interval: f64,
}

impl Default for PhasedSm2 {
    fn default() -> Self {
        Self {
            graduation_threshold: 2,
            hard_press_tolerance: 1,
            initial_ease: 2.5,
            minimum_ease: 1.3,
            graduating_interval: 1.0,
            lapse_interval: 1.0,
            lapse_ease_penalty: 0.2,
            medium_ease_delta: 0.0,
            easy_ease_delta: 0.15,
            easy_bonus: 1.3,
            relearn_after_lapses: 3,
            maximum_interval: 36_500.0,
        }
    }
}

impl ReviewScheduler for PhasedSm2 {
    fn name(&self) -> &'static str {
        "phased_sm2"
    }

    fn update(
        &self,
        record: &ProgressRecord,
        quality: Quality,
        max_learning_position: i64,
        now: DateTime<Utc>,
    ) -> ProgressRecord {
        let mut next = record.clone();
        next.last_review_at = Some(now);
        next.updated_at = now;

        match record.phase {
            Phase::Learning { .. } => {
                self.update_learning(&mut next, quality, max_learning_position, now)
            }
            Phase::Review {
                interval_days,
                ease_factor,
                ..
            } => self.update_review(
                &mut next,
                quality,
                interval_days,
                ease_factor,
                max_learning_position,
                now,
            ),
        }

        next
    }
}

impl PhasedSm2 {
    /// Successful answers a learning record needs given its hard presses.
    pub fn required_successes(&self, hard_presses: u32) -> u32 {
        self.graduation_threshold + hard_presses.saturating_sub(self.hard_press_tolerance)
    }

    fn update_learning(
        &self,
        next: &mut ProgressRecord,
        quality: Quality,
        max_learning_position: i64,
        now: DateTime<Utc>,
    ) {
        if !quality.is_qualifying() {
            next.repetitions = 0;
            next.hard_presses += 1;
            next.phase = Phase::Learning {
                session_position: max_learning_position + 1,
            };
            return;
        }

        next.repetitions += 1;
        next.successful_reviews += 1;

        if next.successful_reviews >= self.required_successes(next.hard_presses) {
            next.hard_presses = 0;
            let ease = next.relearn_ease.take().unwrap_or(self.initial_ease);
            next.phase = self.review_phase(self.graduating_interval, ease, now);
        } else {
            next.phase = Phase::Learning {
                session_position: max_learning_position + 1,
            };
        }
    }

    fn update_review(
        &self,
        next: &mut ProgressRecord,
        quality: Quality,
        interval_days: f64,
        ease_factor: f64,
        max_learning_position: i64,
        now: DateTime<Utc>,
    ) {
        match quality {
            Quality::Hard => {
                next.repetitions = 0;
                next.hard_presses += 1;
                let ease = (ease_factor - self.lapse_ease_penalty).max(self.minimum_ease);

                if next.hard_presses >= self.relearn_after_lapses {
                    next.hard_presses = 0;
                    next.successful_reviews = 0;
                    next.relearn_ease = Some(ease);
                    next.phase = Phase::Learning {
                        session_position: max_learning_position + 1,
                    };
                } else {
                    next.phase = self.review_phase(self.lapse_interval, ease, now);
                }
            }
            Quality::Medium | Quality::Easy => {
                let (ease_adj, multiplier) = match quality {
                    Quality::Easy => (self.easy_ease_delta, ease_factor * self.easy_bonus),
                    _ => (self.medium_ease_delta, ease_factor),
                };
                next.repetitions += 1;
                next.successful_reviews += 1;
                let ease = (ease_factor + ease_adj).max(self.minimum_ease);
                next.phase = self.review_phase(interval_days * multiplier, ease, now);
            }
        }
    }

    fn review_phase(&self, interval_days: f64, ease_factor: f64, now: DateTime<Utc>) -> Phase {
        let interval_days = interval_days.clamp(1.0, self.maximum_interval);
        let offset = Duration::milliseconds((interval_days * MILLIS_PER_DAY).round() as i64);
        Phase::Review {
            interval_days,
            ease_factor,
            next_review_at: now + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
    }

    fn review_record(interval_days: f64, ease_factor: f64) -> ProgressRecord {
        let mut record = ProgressRecord::new_learning(1, Direction::AToB, 1, now());
        record.phase = Phase::Review {
            interval_days,
            ease_factor,
            next_review_at: now(),
        };
        record.repetitions = 3;
        record.successful_reviews = 3;
        record
    }

    fn assert_phase_invariant(record: &ProgressRecord) {
        assert_eq!(record.is_learning(), record.session_position().is_some());
    }

    #[test]
    fn first_easy_answer_requeues_learning_record() {
        let sm2 = PhasedSm2::default();
        let record = ProgressRecord::new_learning(1, Direction::AToB, 3, now());

        let next = sm2.update(&record, Quality::Easy, 5, now());

        assert!(next.is_learning());
        assert_eq!(next.session_position(), Some(6));
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.successful_reviews, 1);
        assert_eq!(next.last_review_at, Some(now()));
        assert_phase_invariant(&next);
    }

    #[test]
    fn second_qualifying_answer_graduates() {
        let sm2 = PhasedSm2::default();
        let mut record = ProgressRecord::new_learning(1, Direction::AToB, 3, now());
        record.successful_reviews = 1;
        record.repetitions = 1;

        let next = sm2.update(&record, Quality::Medium, 5, now());

        assert_eq!(
            next.phase,
            Phase::Review {
                interval_days: 1.0,
                ease_factor: 2.5,
                next_review_at: now() + Duration::days(1),
            }
        );
        assert_eq!(next.session_position(), None);
        assert_eq!(next.repetitions, 2);
        assert_eq!(next.hard_presses, 0);
        assert_phase_invariant(&next);
    }

    #[test]
    fn hard_in_learning_moves_to_back_and_resets_repetitions() {
        let sm2 = PhasedSm2::default();
        let mut record = ProgressRecord::new_learning(1, Direction::AToB, 2, now());
        record.repetitions = 1;
        record.successful_reviews = 1;

        let next = sm2.update(&record, Quality::Hard, 9, now());

        assert_eq!(next.session_position(), Some(10));
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.hard_presses, 1);
        assert_eq!(next.successful_reviews, 1);
    }

    #[test]
    fn excess_hard_presses_delay_graduation() {
        let sm2 = PhasedSm2::default();
        let mut record = ProgressRecord::new_learning(1, Direction::AToB, 2, now());
        record.hard_presses = 3;
        record.successful_reviews = 2;

        // 2 + (3 - 1) = 4 successes required
        let next = sm2.update(&record, Quality::Easy, 4, now());
        assert!(next.is_learning());
        assert_eq!(next.session_position(), Some(5));

        let next = sm2.update(&next, Quality::Easy, 5, now());
        assert!(!next.is_learning());
    }

    #[test]
    fn easy_review_applies_bonus() {
        let sm2 = PhasedSm2::default();
        let record = review_record(6.0, 2.3);

        let next = sm2.update(&record, Quality::Easy, 0, now());

        let interval = next.interval_days().unwrap();
        let ease = next.ease_factor().unwrap();
        assert!(interval > 6.0 * 2.3);
        assert!((interval - 6.0 * 2.3 * 1.3).abs() < 1e-9);
        assert!(ease > 2.3 && ease < 2.5);
        assert_eq!(next.repetitions, 4);
        assert!(next.next_review_at().unwrap() > now() + Duration::days(17));
    }

    #[test]
    fn medium_review_multiplies_by_ease() {
        let sm2 = PhasedSm2::default();
        let record = review_record(4.0, 2.5);

        let next = sm2.update(&record, Quality::Medium, 0, now());

        assert_eq!(next.interval_days(), Some(10.0));
        assert_eq!(next.ease_factor(), Some(2.5));
        assert_eq!(next.next_review_at(), Some(now() + Duration::days(10)));
    }

    #[test]
    fn hard_review_is_a_lapse() {
        let sm2 = PhasedSm2::default();
        let record = review_record(12.0, 2.5);

        let next = sm2.update(&record, Quality::Hard, 0, now());

        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval_days(), Some(1.0));
        let ease = next.ease_factor().unwrap();
        assert!(ease < 2.5 && ease >= 1.3);
        assert_eq!(next.next_review_at(), Some(now() + Duration::days(1)));
        assert_eq!(next.hard_presses, 1);
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let sm2 = PhasedSm2::default();
        let record = review_record(10.0, 1.4);

        let next = sm2.update(&record, Quality::Hard, 0, now());

        assert_eq!(next.ease_factor(), Some(1.3));
    }

    #[test]
    fn repeated_lapses_demote_to_learning() {
        let sm2 = PhasedSm2::default();
        let mut record = review_record(10.0, 2.5);
        record.hard_presses = 2;

        let next = sm2.update(&record, Quality::Hard, 7, now());

        assert_eq!(next.session_position(), Some(8));
        assert_eq!(next.hard_presses, 0);
        assert_eq!(next.successful_reviews, 0);
        assert!((next.relearn_ease.unwrap() - 2.3).abs() < 1e-9);
        assert_phase_invariant(&next);
    }

    #[test]
    fn regraduation_keeps_lapsed_ease() {
        let sm2 = PhasedSm2::default();
        let mut record = review_record(10.0, 1.6);
        record.hard_presses = 2;

        let demoted = sm2.update(&record, Quality::Hard, 7, now());
        let requeued = sm2.update(&demoted, Quality::Medium, 8, now());
        assert_eq!(requeued.relearn_ease, demoted.relearn_ease);

        let graduated = sm2.update(&requeued, Quality::Easy, 9, now());

        let ease = graduated.ease_factor().unwrap();
        assert!((ease - 1.4).abs() < 1e-9);
        assert_eq!(graduated.interval_days(), Some(1.0));
        assert_eq!(graduated.relearn_ease, None);
    }

    #[test]
    fn review_due_time_never_precedes_update() {
        let sm2 = PhasedSm2::default();
        let qualities = [Quality::Hard, Quality::Medium, Quality::Easy];
        for quality in qualities {
            for (interval, ease) in [(0.2, 1.3), (1.0, 2.5), (30.0, 1.8)] {
                let next = sm2.update(&review_record(interval, ease), quality, 0, now());
                assert_phase_invariant(&next);
                if let Some(due) = next.next_review_at() {
                    assert!(due >= now());
                }
                assert!(next.ease_factor().map_or(true, |e| e >= 1.3));
            }
        }
    }

    #[test]
    fn interval_is_capped() {
        let sm2 = PhasedSm2::default();
        let record = review_record(30_000.0, 2.5);

        let next = sm2.update(&record, Quality::Easy, 0, now());

        assert_eq!(next.interval_days(), Some(sm2.maximum_interval));
    }
}
