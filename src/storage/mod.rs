//! Persistence for wordtrail.
//!
//! This module defines the store traits the engines depend on, with
//! file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{ActivityStore, ClockInStore, GoalStore, ProgressQuery, ProgressStore};
