//! CLI commands for wordtrail.
//!
//! Each command wraps one engine and produces a serializable output with a
//! `format_text` rendering. The binary picks JSON or text per `--json`.

pub mod activity;
pub mod clock_in;
pub mod stats;
pub mod study;

pub use activity::{ActivityCommand, ActivityOptions, ActivityOutput};
pub use clock_in::{ClockInCommand, GoalOutput, TodayOutput, WeekOutput};
pub use stats::{NewWordsOutput, ReviewListOutput, StatsCommand, StatsOutput};
pub use study::{ProgressOutput, StudyCommand};
