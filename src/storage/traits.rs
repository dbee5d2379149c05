//! Storage traits for wordtrail.
//!
//! Each record family has its own trait so engines can state exactly what they
//! need. Both the in-memory and the file backend implement all of them.
//!
//! Create-if-absent (`create_*`) is the uniqueness constraint the engines rely
//! on: it must fail with [`WordtrailError::Conflict`](crate::error::WordtrailError::Conflict)
//! when a record already exists under the same key, atomically with respect
//! to other writers.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{ActivityRecord, ClockInRecord, LearningGoal, UserId, WordId, WordProgress};
use crate::error::Result;

/// Filter over one user's [`WordProgress`] records.
///
/// Every bound is optional; an empty query matches everything. Ranges on
/// instants are half-open except `next_review_until`, which is inclusive so
/// that "due at or before now" can be expressed directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressQuery {
    /// Restrict to these words.
    pub word_ids: Option<HashSet<WordId>>,
    /// `next_review_time >= from`.
    pub next_review_from: Option<DateTime<Utc>>,
    /// `next_review_time < before`.
    pub next_review_before: Option<DateTime<Utc>>,
    /// `next_review_time <= until`.
    pub next_review_until: Option<DateTime<Utc>>,
    /// `first_learn_time` in `[start, end)`.
    pub first_learned_in: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// `proficiency >= min`.
    pub min_proficiency: Option<f64>,
    /// `proficiency < max`.
    pub max_proficiency_exclusive: Option<f64>,
    /// `proficiency <= max`.
    pub max_proficiency: Option<f64>,
}

impl ProgressQuery {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given words.
    pub fn in_words(mut self, word_ids: HashSet<WordId>) -> Self {
        self.word_ids = Some(word_ids);
        self
    }

    /// Restrict to the given words, if any.
    pub fn in_words_opt(mut self, word_ids: Option<HashSet<WordId>>) -> Self {
        self.word_ids = word_ids;
        self
    }

    /// Next review falls in `[start, end)`.
    pub fn next_review_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.next_review_from = Some(start);
        self.next_review_before = Some(end);
        self
    }

    /// Next review is at or before `until`.
    pub fn due_by(mut self, until: DateTime<Utc>) -> Self {
        self.next_review_until = Some(until);
        self
    }

    /// First learned in `[start, end)`.
    pub fn first_learned_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.first_learned_in = Some((start, end));
        self
    }

    /// Proficiency in `[min, max)`.
    pub fn proficiency_range(mut self, min: f64, max_exclusive: f64) -> Self {
        self.min_proficiency = Some(min);
        self.max_proficiency_exclusive = Some(max_exclusive);
        self
    }

    /// Proficiency in `[min, max]`.
    pub fn proficiency_range_inclusive(mut self, min: f64, max: f64) -> Self {
        self.min_proficiency = Some(min);
        self.max_proficiency = Some(max);
        self
    }

    /// Proficiency at least `min`.
    pub fn proficiency_at_least(mut self, min: f64) -> Self {
        self.min_proficiency = Some(min);
        self
    }

    /// Whether `progress` satisfies every bound.
    pub fn matches(&self, progress: &WordProgress) -> bool {
        if let Some(ref ids) = self.word_ids {
            if !ids.contains(&progress.word_id) {
                return false;
            }
        }
        if let Some(from) = self.next_review_from {
            if progress.next_review_time < from {
                return false;
            }
        }
        if let Some(before) = self.next_review_before {
            if progress.next_review_time >= before {
                return false;
            }
        }
        if let Some(until) = self.next_review_until {
            if progress.next_review_time > until {
                return false;
            }
        }
        if let Some((start, end)) = self.first_learned_in {
            if progress.first_learn_time < start || progress.first_learn_time >= end {
                return false;
            }
        }
        if let Some(min) = self.min_proficiency {
            if progress.proficiency < min {
                return false;
            }
        }
        if let Some(max) = self.max_proficiency_exclusive {
            if progress.proficiency >= max {
                return false;
            }
        }
        if let Some(max) = self.max_proficiency {
            if progress.proficiency > max {
                return false;
            }
        }
        true
    }
}

/// Persistence for [`WordProgress`], unique per (user, word).
pub trait ProgressStore: Send + Sync {
    /// Point lookup. `Ok(None)` if the pair was never studied.
    fn get_progress(&self, user_id: &UserId, word_id: &WordId) -> Result<Option<WordProgress>>;

    /// Insert a new record; `Conflict` if one already exists for the pair.
    fn create_progress(&self, progress: &WordProgress) -> Result<()>;

    /// Insert or overwrite. Last writer wins.
    fn save_progress(&self, progress: &WordProgress) -> Result<()>;

    /// All of a user's records matching `query`, in no particular order.
    fn query_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<Vec<WordProgress>>;

    /// Number of matching records.
    fn count_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<usize> {
        Ok(self.query_progress(user_id, query)?.len())
    }

    /// Words the user has any progress on.
    fn studied_word_ids(&self, user_id: &UserId) -> Result<HashSet<WordId>> {
        Ok(self
            .query_progress(user_id, &ProgressQuery::all())?
            .into_iter()
            .map(|p| p.word_id)
            .collect())
    }
}

/// Persistence for [`ClockInRecord`], unique per (user, day).
pub trait ClockInStore: Send + Sync {
    /// Point lookup.
    fn get_clock_in(&self, user_id: &UserId, day: NaiveDate) -> Result<Option<ClockInRecord>>;

    /// Insert a new record; `Conflict` if the day already has one.
    fn create_clock_in(&self, record: &ClockInRecord) -> Result<()>;

    /// Insert or overwrite. A stored `status = true` is never replaced by
    /// `false`, so a day stays achieved even if attempts race.
    fn save_clock_in(&self, record: &ClockInRecord) -> Result<()>;

    /// The latest record strictly before `day`.
    fn latest_clock_in_before(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> Result<Option<ClockInRecord>>;

    /// Records with `from <= day <= to`, oldest first.
    fn clock_ins_between(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClockInRecord>>;
}

/// Persistence for [`LearningGoal`], one per user.
pub trait GoalStore: Send + Sync {
    /// The stored goal, if the user ever set one.
    fn get_goal(&self, user_id: &UserId) -> Result<Option<LearningGoal>>;

    /// Insert or overwrite.
    fn save_goal(&self, goal: &LearningGoal) -> Result<()>;
}

/// Append-only persistence for [`ActivityRecord`].
pub trait ActivityStore: Send + Sync {
    /// Append one record.
    fn append_activity(&self, record: &ActivityRecord) -> Result<()>;

    /// Records with `start <= at < end`, oldest first.
    fn activities_between(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>>;

    /// All of a user's records, oldest first.
    fn activities(&self, user_id: &UserId) -> Result<Vec<ActivityRecord>> {
        self.activities_between(user_id, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
    }
}

/// Blanket implementations for Arc-wrapped stores.
///
/// This allows sharing one store between engines and tests.
impl<T: ProgressStore + ?Sized> ProgressStore for Arc<T> {
    fn get_progress(&self, user_id: &UserId, word_id: &WordId) -> Result<Option<WordProgress>> {
        (**self).get_progress(user_id, word_id)
    }

    fn create_progress(&self, progress: &WordProgress) -> Result<()> {
        (**self).create_progress(progress)
    }

    fn save_progress(&self, progress: &WordProgress) -> Result<()> {
        (**self).save_progress(progress)
    }

    fn query_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<Vec<WordProgress>> {
        (**self).query_progress(user_id, query)
    }

    fn count_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<usize> {
        (**self).count_progress(user_id, query)
    }

    fn studied_word_ids(&self, user_id: &UserId) -> Result<HashSet<WordId>> {
        (**self).studied_word_ids(user_id)
    }
}

impl<T: ClockInStore + ?Sized> ClockInStore for Arc<T> {
    fn get_clock_in(&self, user_id: &UserId, day: NaiveDate) -> Result<Option<ClockInRecord>> {
        (**self).get_clock_in(user_id, day)
    }

    fn create_clock_in(&self, record: &ClockInRecord) -> Result<()> {
        (**self).create_clock_in(record)
    }

    fn save_clock_in(&self, record: &ClockInRecord) -> Result<()> {
        (**self).save_clock_in(record)
    }

    fn latest_clock_in_before(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> Result<Option<ClockInRecord>> {
        (**self).latest_clock_in_before(user_id, day)
    }

    fn clock_ins_between(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClockInRecord>> {
        (**self).clock_ins_between(user_id, from, to)
    }
}

impl<T: GoalStore + ?Sized> GoalStore for Arc<T> {
    fn get_goal(&self, user_id: &UserId) -> Result<Option<LearningGoal>> {
        (**self).get_goal(user_id)
    }

    fn save_goal(&self, goal: &LearningGoal) -> Result<()> {
        (**self).save_goal(goal)
    }
}

impl<T: ActivityStore + ?Sized> ActivityStore for Arc<T> {
    fn append_activity(&self, record: &ActivityRecord) -> Result<()> {
        (**self).append_activity(record)
    }

    fn activities_between(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>> {
        (**self).activities_between(user_id, start, end)
    }
}
