//! Statistics for wordtrail.
//!
//! [`StatsAggregator`] answers questions about word progress: what is due,
//! what is mastered, what to learn next. [`ActivityLog`] records study
//! sessions and summarizes them over calendar ranges.

pub mod activity;
pub mod aggregator;

pub use activity::{ActivityLog, ActivitySummary};
pub use aggregator::{
    BookSummary, ProgressSummary, StatsAggregator, DEFAULT_MASTERED_THRESHOLD,
    DEFAULT_NEW_WORDS_BATCH, FAMILIAR_MIN, FUZZY_MIN,
};
