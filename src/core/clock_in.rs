//! Daily clock-in records and their states.
//!
//! A user has at most one [`ClockInRecord`] per calendar day. A day without a
//! record is [`ClockInState::NotStarted`]; once created a record is
//! [`ClockInState::Pending`] until both daily targets are met, after which it
//! is [`ClockInState::Achieved`] for the rest of the day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::goal::LearningGoal;
use crate::core::ids::UserId;

/// Clock-in state of one (user, day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClockInState {
    /// No record exists for the day.
    #[default]
    NotStarted,
    /// Record exists, goals not yet met.
    Pending,
    /// Both daily goals met.
    Achieved,
}

impl ClockInState {
    /// Whether the day counts toward a streak.
    pub fn is_achieved(&self) -> bool {
        matches!(self, ClockInState::Achieved)
    }

    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ClockInState::NotStarted => "not started",
            ClockInState::Pending => "pending",
            ClockInState::Achieved => "achieved",
        }
    }
}

/// One user's clock-in for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInRecord {
    pub user_id: UserId,
    /// Calendar day in the clock's offset.
    pub day: NaiveDate,
    /// True once both targets were met. Never reverts within the day.
    pub status: bool,
    /// Consecutive achieved days immediately before this one.
    pub streak_days: u32,
    pub new_words_completed: u32,
    pub new_words_target: u32,
    pub review_words_completed: u32,
    pub review_words_target: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClockInRecord {
    /// A pending record with targets copied from `goal`.
    pub fn new(
        user_id: UserId,
        day: NaiveDate,
        goal: &LearningGoal,
        streak_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            day,
            status: false,
            streak_days,
            new_words_completed: 0,
            new_words_target: goal.daily_new_words_goal,
            review_words_completed: 0,
            review_words_target: goal.daily_review_words_goal,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current state of the record.
    pub fn state(&self) -> ClockInState {
        if self.status {
            ClockInState::Achieved
        } else {
            ClockInState::Pending
        }
    }

    /// Whether the completed counts meet both targets.
    pub fn goals_met(&self) -> bool {
        self.new_words_completed >= self.new_words_target
            && self.review_words_completed >= self.review_words_target
    }

    /// Storage key for this record.
    pub fn key(&self) -> String {
        clock_in_key(&self.user_id, self.day)
    }
}

/// Storage key for a (user, day) pair.
pub fn clock_in_key(user_id: &UserId, day: NaiveDate) -> String {
    format!("{}/{}", user_id, day.format("%Y-%m-%d"))
}

/// One row of a clock-in history, with a zero placeholder for missing days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInDay {
    pub day: NaiveDate,
    pub state: ClockInState,
    pub status: bool,
    pub streak_days: u32,
    pub new_words_completed: u32,
    pub review_words_completed: u32,
}

impl ClockInDay {
    /// Placeholder for a day with no record.
    pub fn missing(day: NaiveDate) -> Self {
        Self {
            day,
            state: ClockInState::NotStarted,
            status: false,
            streak_days: 0,
            new_words_completed: 0,
            review_words_completed: 0,
        }
    }
}

impl From<&ClockInRecord> for ClockInDay {
    fn from(record: &ClockInRecord) -> Self {
        Self {
            day: record.day,
            state: record.state(),
            status: record.status,
            streak_days: record.streak_days,
            new_words_completed: record.new_words_completed,
            review_words_completed: record.review_words_completed,
        }
    }
}
