//! Learning activity records.
//!
//! Each record notes that a user learned or reviewed some number of words at
//! a point in time. Records are append-only and feed activity summaries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::UserId;
use crate::error::{Result, WordtrailError};

/// What kind of study the activity was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Studying words for the first time.
    Learn,
    /// Reviewing words already in progress.
    Review,
}

impl ActivityKind {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Learn => "learn",
            ActivityKind::Review => "review",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = WordtrailError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "learn" => Ok(ActivityKind::Learn),
            "review" => Ok(ActivityKind::Review),
            other => Err(WordtrailError::invalid_argument(format!(
                "unknown activity kind '{}' (expected learn or review)",
                other
            ))),
        }
    }
}

/// A single learning activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: UserId,
    pub kind: ActivityKind,
    /// Number of words covered.
    pub count: u32,
    pub at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build a record, rejecting negative counts.
    pub fn new(user_id: UserId, kind: ActivityKind, count: i64, at: DateTime<Utc>) -> Result<Self> {
        if count < 0 {
            return Err(WordtrailError::invalid_argument(format!(
                "activity count must not be negative (got {})",
                count
            )));
        }
        let count = u32::try_from(count).map_err(|_| {
            WordtrailError::invalid_argument(format!("activity count is too large (got {})", count))
        })?;
        Ok(Self {
            user_id,
            kind,
            count,
            at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("learn".parse::<ActivityKind>().unwrap(), ActivityKind::Learn);
        assert_eq!("review".parse::<ActivityKind>().unwrap(), ActivityKind::Review);
        assert!("quiz".parse::<ActivityKind>().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ActivityKind::Review).unwrap();
        assert_eq!(json, "\"review\"");
    }

    #[test]
    fn test_negative_count_rejected() {
        let user = UserId::new("u1").unwrap();
        let err = ActivityRecord::new(user.clone(), ActivityKind::Learn, -3, Utc::now()).unwrap_err();
        assert!(err.is_invalid_argument());

        let ok = ActivityRecord::new(user, ActivityKind::Learn, 3, Utc::now()).unwrap();
        assert_eq!(ok.count, 3);
    }
}
