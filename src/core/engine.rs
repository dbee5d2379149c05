//! Daily clock-in evaluation.
//!
//! [`ClockInEngine`] keeps one [`ClockInRecord`] per user per calendar day.
//! Today's record is created lazily with targets copied from the user's goal
//! and a streak carried over from yesterday. Clocking in recomputes today's
//! counts from word progress and marks the day achieved once both targets
//! are met.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::core::clock::{day_bounds, Clock};
use crate::core::clock_in::{clock_in_key, ClockInDay, ClockInRecord, ClockInState};
use crate::core::goal::{LearningGoal, DEFAULT_DAILY_NEW_WORDS, DEFAULT_DAILY_REVIEW_WORDS};
use crate::core::ids::UserId;
use crate::error::{Result, WordtrailError};
use crate::storage::{ClockInStore, GoalStore, ProgressQuery, ProgressStore};

/// Number of days covered by [`ClockInEngine::weekly_history`].
pub const WEEKLY_HISTORY_DAYS: u32 = 7;

/// Today's clock-in at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockInSummary {
    pub user_id: UserId,
    pub day: NaiveDate,
    pub state: ClockInState,
    pub status: bool,
    /// Achieved days immediately before today.
    pub streak_days: u32,
    pub new_words_completed: u32,
    pub new_words_target: u32,
    pub review_words_completed: u32,
    pub review_words_target: u32,
}

impl ClockInSummary {
    /// Streak including today once today is achieved.
    pub fn current_streak(&self) -> u32 {
        self.streak_days + u32::from(self.status)
    }

    pub fn new_words_remaining(&self) -> u32 {
        self.new_words_target.saturating_sub(self.new_words_completed)
    }

    pub fn review_words_remaining(&self) -> u32 {
        self.review_words_target
            .saturating_sub(self.review_words_completed)
    }
}

impl From<&ClockInRecord> for ClockInSummary {
    fn from(record: &ClockInRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            day: record.day,
            state: record.state(),
            status: record.status,
            streak_days: record.streak_days,
            new_words_completed: record.new_words_completed,
            new_words_target: record.new_words_target,
            review_words_completed: record.review_words_completed,
            review_words_target: record.review_words_target,
        }
    }
}

/// Creates and evaluates daily clock-in records.
pub struct ClockInEngine<S, C> {
    store: S,
    clock: C,
    default_new_words: u32,
    default_review_words: u32,
}

impl<S, C> ClockInEngine<S, C>
where
    S: ProgressStore + ClockInStore + GoalStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            default_new_words: DEFAULT_DAILY_NEW_WORDS,
            default_review_words: DEFAULT_DAILY_REVIEW_WORDS,
        }
    }

    /// Targets used for users who never set a goal.
    pub fn with_default_goal(mut self, new_words: u32, review_words: u32) -> Self {
        self.default_new_words = new_words;
        self.default_review_words = review_words;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The user's stored goal, or the configured default.
    pub fn learning_goal(&self, user_id: &UserId) -> Result<LearningGoal> {
        Ok(self.store.get_goal(user_id)?.unwrap_or_else(|| {
            LearningGoal::implicit(
                user_id.clone(),
                self.default_new_words,
                self.default_review_words,
            )
        }))
    }

    /// Replace the user's goal. Records already created keep their targets.
    pub fn set_learning_goal(
        &self,
        user_id: &UserId,
        daily_new_words: i64,
        daily_review_words: i64,
    ) -> Result<LearningGoal> {
        let goal = LearningGoal::new(
            user_id.clone(),
            daily_new_words,
            daily_review_words,
            self.clock.now(),
        )?;
        self.store.save_goal(&goal)?;
        tracing::debug!(
            user = %user_id,
            new_words = goal.daily_new_words_goal,
            review_words = goal.daily_review_words_goal,
            "updated learning goal"
        );
        Ok(goal)
    }

    /// Today's record, creating it if this is the first call of the day.
    pub fn get_or_create_today_clock_in(&self, user_id: &UserId) -> Result<ClockInRecord> {
        let today = self.clock.today();
        if let Some(existing) = self.store.get_clock_in(user_id, today)? {
            return Ok(existing);
        }

        let goal = self.learning_goal(user_id)?;
        let streak = self.carried_streak(user_id, today)?;
        let candidate = ClockInRecord::new(user_id.clone(), today, &goal, streak, self.clock.now());

        match self.store.create_clock_in(&candidate) {
            Ok(()) => {
                tracing::debug!(user = %user_id, day = %today, streak, "created clock-in record");
                Ok(candidate)
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(user = %user_id, day = %today, "lost create race, re-reading");
                self.store.get_clock_in(user_id, today)?.ok_or_else(|| {
                    WordtrailError::invalid_state(format!(
                        "clock-in record {} vanished after conflict",
                        clock_in_key(user_id, today)
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Streak for a new record on `today`.
    fn carried_streak(&self, user_id: &UserId, today: NaiveDate) -> Result<u32> {
        let prior = self.store.latest_clock_in_before(user_id, today)?;
        Ok(match prior {
            Some(prior) if prior.status && prior.day.succ_opt() == Some(today) => {
                prior.streak_days + 1
            }
            _ => 0,
        })
    }

    /// Recount today's work and mark the day achieved when both targets are met.
    ///
    /// An achieved day is returned unchanged.
    pub fn try_clock_in(&self, user_id: &UserId) -> Result<ClockInRecord> {
        let mut record = self.get_or_create_today_clock_in(user_id)?;
        if record.status {
            return Ok(record);
        }

        let (start, end) = day_bounds(record.day, self.clock.offset());
        let (new_words, reviews) = self.count_today(user_id, start, end)?;

        record.new_words_completed = new_words;
        record.review_words_completed = reviews;
        record.status = record.goals_met();
        record.updated_at = self.clock.now();
        self.store.save_clock_in(&record)?;

        if record.status {
            tracing::info!(
                user = %user_id,
                day = %record.day,
                streak = record.streak_days,
                "daily goal achieved"
            );
        }

        // A concurrent attempt may already have achieved the day.
        Ok(self
            .store
            .get_clock_in(user_id, record.day)?
            .unwrap_or(record))
    }

    /// Words first learned in `[start, end)` and review attempts in it.
    fn count_today(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(u32, u32)> {
        let new_words = self.store.count_progress(
            user_id,
            &ProgressQuery::all().first_learned_between(start, end),
        )?;
        let reviews: usize = self
            .store
            .query_progress(user_id, &ProgressQuery::all())?
            .iter()
            .map(|p| p.reviews_between(start, end))
            .sum();
        Ok((saturating_u32(new_words), saturating_u32(reviews)))
    }

    /// The last [`WEEKLY_HISTORY_DAYS`] days including today, today first.
    ///
    /// Days without a record are returned as `NotStarted` placeholders.
    pub fn weekly_history(&self, user_id: &UserId) -> Result<Vec<ClockInDay>> {
        let today = self.clock.today();
        let first = today - Duration::days(i64::from(WEEKLY_HISTORY_DAYS) - 1);
        let records = self.store.clock_ins_between(user_id, first, today)?;

        Ok((0..i64::from(WEEKLY_HISTORY_DAYS))
            .map(|back| today - Duration::days(back))
            .map(|day| {
                records
                    .iter()
                    .find(|r| r.day == day)
                    .map(ClockInDay::from)
                    .unwrap_or_else(|| ClockInDay::missing(day))
            })
            .collect())
    }

    /// Today's status, creating the record if needed.
    pub fn clock_in_summary(&self, user_id: &UserId) -> Result<ClockInSummary> {
        let record = self.get_or_create_today_clock_in(user_id)?;
        Ok(ClockInSummary::from(&record))
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
