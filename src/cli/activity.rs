//! Activity command: `activity`.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::cli::study::format_instant;
use crate::core::{ActivityRecord, Clock, UserId};
use crate::error::{Result, WordtrailError};
use crate::stats::{ActivityLog, ActivitySummary};
use crate::storage::ActivityStore;

/// Days covered when no range is given.
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Number of recent records shown alongside the summary.
pub const RECENT_LIMIT: usize = 5;

/// Options for the activity command.
#[derive(Debug, Clone, Default)]
pub struct ActivityOptions {
    /// First day, inclusive. Defaults to six days before `to`.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive. Defaults to today.
    pub to: Option<NaiveDate>,
}

/// Output for the activity command.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub summary: ActivitySummary,
    /// Consecutive active days ending at the most recent one.
    pub consecutive_days: u32,
    /// Newest first.
    pub recent: Vec<ActivityRecord>,
}

impl ActivityOutput {
    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![format!("Activity for {} from {} to {}", s.user_id, s.from, s.to)];
        lines.push(format!("  Sessions:        {}", s.total_sessions));
        lines.push(format!(
            "  Words:           {} ({} learned, {} reviewed)",
            s.total_words, s.learned_words, s.reviewed_words
        ));
        lines.push(format!("  Active days:     {}/{}", s.active_days, s.days()));
        lines.push(format!("  Words per day:   {:.1}", s.average_words_per_day));
        lines.push(format!("  Consecutive:     {} day(s)", self.consecutive_days));

        if !self.recent.is_empty() {
            lines.push(String::new());
            lines.push("Recent:".to_string());
            for record in &self.recent {
                lines.push(format!(
                    "  {}  {:<6}  {}",
                    format_instant(record.at),
                    record.kind.as_str(),
                    record.count
                ));
            }
        }
        lines.join("\n")
    }
}

/// The activity command implementation.
pub struct ActivityCommand<S, C> {
    log: ActivityLog<S, C>,
    clock: C,
}

impl<S: ActivityStore, C: Clock + Clone> ActivityCommand<S, C> {
    /// Create a new activity command.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            log: ActivityLog::new(store, clock.clone()),
            clock,
        }
    }

    /// Run the activity command.
    pub fn run(&self, user_id: &UserId, options: &ActivityOptions) -> Result<ActivityOutput> {
        let to = options.to.unwrap_or_else(|| self.clock.today());
        let from = match options.from {
            Some(from) => from,
            None => to
                .checked_sub_signed(Duration::days(DEFAULT_RANGE_DAYS - 1))
                .ok_or_else(|| {
                    WordtrailError::invalid_argument(format!(
                        "no {}-day range ends at {}",
                        DEFAULT_RANGE_DAYS, to
                    ))
                })?,
        };

        Ok(ActivityOutput {
            success: true,
            summary: self.log.activity_summary(user_id, from, to)?,
            consecutive_days: self.log.consecutive_learning_days(user_id)?,
            recent: self.log.history(user_id, RECENT_LIMIT)?,
        })
    }
}
