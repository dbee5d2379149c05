//! Learning activity log and summaries.
//!
//! Activity is recorded separately from word progress so that summaries can
//! cover sessions (how often and how much a user studied) independent of
//! which words were involved.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::{calendar_day, checked_day_bounds, ActivityKind, ActivityRecord, Clock, UserId};
use crate::error::{Result, WordtrailError};
use crate::storage::ActivityStore;

/// Activity over an inclusive range of calendar days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub user_id: UserId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Number of activity records.
    pub total_sessions: usize,
    pub total_words: u64,
    pub learned_words: u64,
    pub reviewed_words: u64,
    /// Days in the range with at least one record.
    pub active_days: usize,
    /// `total_words` spread over every day of the range.
    pub average_words_per_day: f64,
}

impl ActivitySummary {
    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// Records and summarizes learning activity.
pub struct ActivityLog<S, C> {
    store: S,
    clock: C,
}

impl<S: ActivityStore, C: Clock> ActivityLog<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Append an activity at the current instant.
    pub fn record_activity(
        &self,
        user_id: &UserId,
        kind: ActivityKind,
        count: i64,
    ) -> Result<ActivityRecord> {
        let record = ActivityRecord::new(user_id.clone(), kind, count, self.clock.now())?;
        self.store.append_activity(&record)?;
        tracing::debug!(user = %user_id, kind = %kind, count = record.count, "recorded activity");
        Ok(record)
    }

    /// Summary for calendar days `from..=to`.
    pub fn activity_summary(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ActivitySummary> {
        if from > to {
            return Err(WordtrailError::invalid_argument(format!(
                "activity range start {} is after end {}",
                from, to
            )));
        }

        let offset = self.clock.offset();
        let (start, end) = checked_day_bounds(from, offset)
            .zip(checked_day_bounds(to, offset))
            .map(|((start, _), (_, end))| (start, end))
            .ok_or_else(|| {
                WordtrailError::invalid_argument(format!(
                    "activity range {} to {} is out of range",
                    from, to
                ))
            })?;
        let records = self.store.activities_between(user_id, start, end)?;

        let mut learned = 0u64;
        let mut reviewed = 0u64;
        let mut active = BTreeSet::new();
        for record in &records {
            match record.kind {
                ActivityKind::Learn => learned += u64::from(record.count),
                ActivityKind::Review => reviewed += u64::from(record.count),
            }
            active.insert(calendar_day(record.at, offset));
        }

        let total = learned + reviewed;
        let days = (to - from).num_days() + 1;
        Ok(ActivitySummary {
            user_id: user_id.clone(),
            from,
            to,
            total_sessions: records.len(),
            total_words: total,
            learned_words: learned,
            reviewed_words: reviewed,
            active_days: active.len(),
            average_words_per_day: total as f64 / days as f64,
        })
    }

    /// Consecutive active days ending at the most recent active day.
    ///
    /// Zero when the user has no activity at all.
    pub fn consecutive_learning_days(&self, user_id: &UserId) -> Result<u32> {
        let offset = self.clock.offset();
        let days: BTreeSet<NaiveDate> = self
            .store
            .activities(user_id)?
            .iter()
            .map(|r| calendar_day(r.at, offset))
            .collect();

        let mut streak = 0;
        let mut expected = days.iter().next_back().copied();
        for day in days.iter().rev() {
            if Some(*day) != expected {
                break;
            }
            streak += 1;
            expected = day.pred_opt();
        }
        Ok(streak)
    }

    /// The `limit` most recent records, newest first.
    pub fn history(&self, user_id: &UserId, limit: usize) -> Result<Vec<ActivityRecord>> {
        let mut records = self.store.activities(user_id)?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
