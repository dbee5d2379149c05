//! Daily learning goals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::UserId;
use crate::error::{Result, WordtrailError};

/// Default number of new words per day.
pub const DEFAULT_DAILY_NEW_WORDS: u32 = 10;

/// Default number of review attempts per day.
pub const DEFAULT_DAILY_REVIEW_WORDS: u32 = 30;

/// A user's daily targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningGoal {
    pub user_id: UserId,
    pub daily_new_words_goal: u32,
    pub daily_review_words_goal: u32,
    /// When the user last changed the goal. `None` for an implicit default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LearningGoal {
    /// Build a goal from caller-supplied targets, rejecting negative values.
    pub fn new(
        user_id: UserId,
        daily_new_words_goal: i64,
        daily_review_words_goal: i64,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            user_id,
            daily_new_words_goal: validate_target("daily new words goal", daily_new_words_goal)?,
            daily_review_words_goal: validate_target(
                "daily review words goal",
                daily_review_words_goal,
            )?,
            updated_at: Some(now),
        })
    }

    /// The implicit goal for a user who never set one.
    pub fn implicit(user_id: UserId, daily_new_words: u32, daily_review_words: u32) -> Self {
        Self {
            user_id,
            daily_new_words_goal: daily_new_words,
            daily_review_words_goal: daily_review_words,
            updated_at: None,
        }
    }

    /// Whether this goal was set explicitly by the user.
    pub fn is_explicit(&self) -> bool {
        self.updated_at.is_some()
    }
}

fn validate_target(name: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(WordtrailError::invalid_argument(format!(
            "{} must not be negative (got {})",
            name, value
        )));
    }
    u32::try_from(value).map_err(|_| {
        WordtrailError::invalid_argument(format!("{} is too large (got {})", name, value))
    })
}
