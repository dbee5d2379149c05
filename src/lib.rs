//! wordtrail - spaced-repetition vocabulary tracking
//!
//! wordtrail schedules word reviews on a fixed day ladder, tracks daily
//! learning goals with clock-in streaks, and aggregates progress across
//! wordbooks. State lives behind storage traits with in-memory and
//! file-backed implementations.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod stats;
pub mod storage;
pub mod util;
pub mod wordbook;

pub use config::Config;
pub use core::{
    ActivityKind, ActivityRecord, BookId, Clock, ClockInDay, ClockInEngine, ClockInRecord,
    ClockInState, ClockInSummary, FixedClock, LearningGoal, ReviewScheduler, SystemClock, UserId,
    WordId, WordProgress,
};
pub use error::{Result, WordtrailError};
pub use stats::{ActivityLog, ActivitySummary, BookSummary, ProgressSummary, StatsAggregator};
pub use storage::{
    ActivityStore, ClockInStore, FileStore, GoalStore, MemoryStore, ProgressQuery, ProgressStore,
};
pub use wordbook::{SystemWordbooks, UserWordbooks, Wordbook, WordbookCatalog, WordbookResolver};

// CLI commands
pub use cli::{ActivityCommand, ClockInCommand, StatsCommand, StudyCommand};
