//! Per-(user, word) review state and the spaced-repetition ladder.
//!
//! A [`WordProgress`] climbs one rung of [`REVIEW_INTERVALS`] each time the
//! word is remembered and drops one rung each time it is forgotten.
//! Proficiency moves in fixed steps of [`PROFICIENCY_STEP`] and is kept on
//! the tenths grid so it never drifts through repeated float additions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::{UserId, WordId};

/// Review interval ladder in days, indexed by review stage.
pub const REVIEW_INTERVALS: [i64; 6] = [1, 2, 4, 7, 15, 30];

/// Highest review stage.
pub const MAX_REVIEW_STAGE: u8 = (REVIEW_INTERVALS.len() - 1) as u8;

/// Proficiency change applied by a single review.
pub const PROFICIENCY_STEP: f64 = 0.1;

/// Number of proficiency steps between 0.0 and 1.0.
const PROFICIENCY_STEPS: i64 = 10;

/// Interval for a review stage, clamped to the ladder.
pub fn review_interval(stage: u8) -> Duration {
    let index = usize::from(stage.min(MAX_REVIEW_STAGE));
    Duration::days(REVIEW_INTERVALS[index])
}

/// Move `proficiency` by one step and snap it to the tenths grid.
fn step_proficiency(proficiency: f64, remembered: bool) -> f64 {
    let steps = (proficiency * PROFICIENCY_STEPS as f64).round() as i64;
    let next = if remembered { steps + 1 } else { steps - 1 };
    next.clamp(0, PROFICIENCY_STEPS) as f64 / PROFICIENCY_STEPS as f64
}

/// One review attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// When the review happened.
    pub time: DateTime<Utc>,
    /// Whether the learner recalled the word.
    pub remembered: bool,
}

/// Review state of one word for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordProgress {
    pub user_id: UserId,
    pub word_id: WordId,
    /// Recall confidence in `[0.0, 1.0]`, always a multiple of 0.1.
    pub proficiency: f64,
    /// Index into [`REVIEW_INTERVALS`].
    pub review_stage: u8,
    /// Every review attempt, oldest first. Only ever appended to.
    pub review_history: Vec<ReviewEntry>,
    /// When the user started learning this word.
    pub first_learn_time: DateTime<Utc>,
    pub last_review_time: DateTime<Utc>,
    /// Always `last_review_time + review_interval(review_stage)`.
    pub next_review_time: DateTime<Utc>,
}

impl WordProgress {
    /// Fresh progress at stage 0 with no history.
    pub fn new(user_id: UserId, word_id: WordId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            word_id,
            proficiency: 0.0,
            review_stage: 0,
            review_history: Vec::new(),
            first_learn_time: now,
            last_review_time: now,
            next_review_time: now + review_interval(0),
        }
    }

    /// Apply one review outcome at `now`.
    pub fn apply_review(&mut self, remembered: bool, now: DateTime<Utc>) {
        self.review_history.push(ReviewEntry {
            time: now,
            remembered,
        });

        let stage = self.review_stage.min(MAX_REVIEW_STAGE);
        self.review_stage = if remembered {
            (stage + 1).min(MAX_REVIEW_STAGE)
        } else {
            stage.saturating_sub(1)
        };
        self.proficiency = step_proficiency(self.proficiency, remembered);

        self.last_review_time = now;
        self.next_review_time = now + review_interval(self.review_stage);
    }

    /// Whether the word is due for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_time <= now
    }

    /// Number of review attempts in `[start, end)`.
    pub fn reviews_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
        self.review_history
            .iter()
            .filter(|entry| entry.time >= start && entry.time < end)
            .count()
    }

    /// Storage key for this record.
    pub fn key(&self) -> String {
        progress_key(&self.user_id, &self.word_id)
    }
}

/// Storage key for a (user, word) pair.
pub fn progress_key(user_id: &UserId, word_id: &WordId) -> String {
    format!("{}/{}", user_id, word_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn progress() -> WordProgress {
        WordProgress::new(
            UserId::new("u1").unwrap(),
            WordId::new("apple").unwrap(),
            t0(),
        )
    }

    #[test]
    fn test_new_progress_defaults() {
        let p = progress();
        assert_eq!(p.review_stage, 0);
        assert_eq!(p.proficiency, 0.0);
        assert!(p.review_history.is_empty());
        assert_eq!(p.first_learn_time, t0());
        assert_eq!(p.next_review_time, t0() + Duration::days(1));
    }

    #[test]
    fn test_remembered_climbs_ladder() {
        let mut p = progress();
        for _ in 0..4 {
            p.apply_review(true, t0());
        }
        assert_eq!(p.review_stage, 4);
        assert_eq!(p.proficiency, 0.4);
        assert_eq!(p.next_review_time, p.last_review_time + Duration::days(15));
    }

    #[test]
    fn test_forgotten_drops_one_stage() {
        let mut p = progress();
        for _ in 0..3 {
            p.apply_review(true, t0());
        }
        assert_eq!(p.review_stage, 3);
        assert_eq!(p.proficiency, 0.3);

        let later = t0() + Duration::hours(5);
        p.apply_review(false, later);
        assert_eq!(p.review_stage, 2);
        assert_eq!(p.proficiency, 0.2);
        assert_eq!(p.last_review_time, later);
        assert_eq!(p.next_review_time, later + Duration::days(4));
    }

    #[test]
    fn test_stage_and_proficiency_clamp_at_top() {
        let mut p = progress();
        for _ in 0..20 {
            p.apply_review(true, t0());
        }
        assert_eq!(p.review_stage, MAX_REVIEW_STAGE);
        assert_eq!(p.proficiency, 1.0);
        assert_eq!(p.next_review_time, t0() + Duration::days(30));
    }

    #[test]
    fn test_out_of_range_stage_is_clamped() {
        let mut p = progress();
        p.review_stage = u8::MAX;
        p.apply_review(true, t0());
        assert_eq!(p.review_stage, MAX_REVIEW_STAGE);
        assert_eq!(p.next_review_time, t0() + Duration::days(30));

        p.review_stage = u8::MAX;
        p.apply_review(false, t0());
        assert_eq!(p.review_stage, MAX_REVIEW_STAGE - 1);
        assert_eq!(p.next_review_time, t0() + Duration::days(15));
    }

    #[test]
    fn test_stage_and_proficiency_clamp_at_bottom() {
        let mut p = progress();
        p.apply_review(false, t0());
        p.apply_review(false, t0());
        assert_eq!(p.review_stage, 0);
        assert_eq!(p.proficiency, 0.0);
        assert_eq!(p.next_review_time, t0() + Duration::days(1));
    }

    #[test]
    fn test_history_is_append_only() {
        let mut p = progress();
        p.apply_review(true, t0());
        p.apply_review(false, t0() + Duration::minutes(1));
        p.apply_review(true, t0() + Duration::minutes(2));

        let outcomes: Vec<bool> = p.review_history.iter().map(|e| e.remembered).collect();
        assert_eq!(outcomes, vec![true, false, true]);
        assert!(p
            .review_history
            .windows(2)
            .all(|pair| pair[0].time <= pair[1].time));
    }

    #[test]
    fn test_reviews_between() {
        let mut p = progress();
        p.apply_review(true, t0());
        p.apply_review(true, t0() + Duration::days(1));
        assert_eq!(p.reviews_between(t0(), t0() + Duration::days(1)), 1);
        assert_eq!(p.reviews_between(t0(), t0() + Duration::days(2)), 2);
    }

    #[test]
    fn test_is_due() {
        let p = progress();
        assert!(!p.is_due(t0()));
        assert!(p.is_due(t0() + Duration::days(1)));
    }

    #[test]
    fn test_key() {
        assert_eq!(progress().key(), "u1/apple");
    }

    #[test]
    fn test_serde_roundtrip_keeps_history() {
        let mut p = progress();
        p.apply_review(true, t0());
        let json = serde_json::to_string(&p).unwrap();
        let back: WordProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: proficiency stays in [0, 1] on the tenths grid
            #[test]
            fn prop_proficiency_bounded_and_quantized(
                outcomes in proptest::collection::vec(any::<bool>(), 0..60),
            ) {
                let mut p = progress();
                for remembered in outcomes {
                    p.apply_review(remembered, t0());
                    prop_assert!((0.0..=1.0).contains(&p.proficiency));
                    let tenths = p.proficiency * 10.0;
                    prop_assert!((tenths - tenths.round()).abs() < 1e-9);
                }
            }

            // Property: stage stays on the ladder and next review matches it
            #[test]
            fn prop_next_review_matches_ladder(
                outcomes in proptest::collection::vec(any::<bool>(), 0..60),
                gap_minutes in 0i64..100_000,
            ) {
                let mut p = progress();
                let mut now = t0();
                for remembered in outcomes {
                    now += Duration::minutes(gap_minutes);
                    p.apply_review(remembered, now);
                    prop_assert!(p.review_stage <= MAX_REVIEW_STAGE);
                    prop_assert_eq!(
                        p.next_review_time,
                        p.last_review_time
                            + Duration::days(REVIEW_INTERVALS[p.review_stage as usize])
                    );
                }
            }

            // Property: stage and proficiency track the net count of outcomes
            #[test]
            fn prop_single_step_changes(
                outcomes in proptest::collection::vec(any::<bool>(), 1..40),
            ) {
                let mut p = progress();
                for remembered in outcomes {
                    let before_stage = i16::from(p.review_stage);
                    let before_prof = p.proficiency;
                    p.apply_review(remembered, t0());
                    let stage_delta = i16::from(p.review_stage) - before_stage;
                    let prof_delta = p.proficiency - before_prof;
                    prop_assert!(stage_delta.abs() <= 1);
                    prop_assert!(prof_delta.abs() <= PROFICIENCY_STEP + 1e-9);
                    if remembered {
                        prop_assert!(stage_delta >= 0 && prof_delta >= 0.0);
                    } else {
                        prop_assert!(stage_delta <= 0 && prof_delta <= 0.0);
                    }
                }
            }
        }
    }
}
