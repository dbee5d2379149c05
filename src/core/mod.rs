//! Core types and logic for wordtrail.
//!
//! This module contains the data model (identifiers, word progress, clock-in
//! records, goals, activity), the injectable clock, and the two engines that
//! mutate state: the review scheduler and the clock-in engine.

pub mod activity;
pub mod clock;
pub mod clock_in;
pub mod engine;
pub mod goal;
pub mod ids;
pub mod progress;
pub mod scheduler;

pub use activity::{ActivityKind, ActivityRecord};
pub use clock::{
    calendar_day, checked_day_bounds, day_bounds, day_start, Clock, FixedClock, SystemClock,
};
pub use clock_in::{clock_in_key, ClockInDay, ClockInRecord, ClockInState};
pub use engine::{ClockInEngine, ClockInSummary, WEEKLY_HISTORY_DAYS};
pub use goal::{LearningGoal, DEFAULT_DAILY_NEW_WORDS, DEFAULT_DAILY_REVIEW_WORDS};
pub use ids::{BookId, UserId, WordId, MAX_ID_LEN};
pub use progress::{
    progress_key, review_interval, ReviewEntry, WordProgress, MAX_REVIEW_STAGE, PROFICIENCY_STEP,
    REVIEW_INTERVALS,
};
pub use scheduler::ReviewScheduler;
