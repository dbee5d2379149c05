//! In-memory storage.
//!
//! Thread-safe implementation of every store trait using `RwLock<HashMap>`.
//! Create-if-absent checks and inserts under a single write lock, which gives
//! the same uniqueness guarantee a database index would within one process.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{
    progress_key, ActivityRecord, ClockInRecord, LearningGoal, UserId, WordId, WordProgress,
};
use crate::error::{Result, WordtrailError};
use crate::storage::{ActivityStore, ClockInStore, GoalStore, ProgressQuery, ProgressStore};

/// In-memory store for tests and embedding.
///
/// Records are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Keyed by `user/word`.
    progress: RwLock<HashMap<String, WordProgress>>,
    /// Per user, ordered by day.
    clock_ins: RwLock<HashMap<UserId, BTreeMap<NaiveDate, ClockInRecord>>>,
    goals: RwLock<HashMap<UserId, LearningGoal>>,
    activity: RwLock<HashMap<UserId, Vec<ActivityRecord>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of progress records across all users.
    pub fn progress_len(&self) -> usize {
        self.progress
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of clock-in records across all users.
    pub fn clock_in_len(&self) -> usize {
        self.clock_ins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    /// Check if the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.progress_len() == 0
            && self.clock_in_len() == 0
            && self
                .goals
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
            && self
                .activity
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
    }

    /// Remove every record.
    pub fn clear(&self) {
        self.progress
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.clock_ins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.goals
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.activity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ProgressStore for MemoryStore {
    fn get_progress(&self, user_id: &UserId, word_id: &WordId) -> Result<Option<WordProgress>> {
        let progress = self.progress.read().unwrap_or_else(PoisonError::into_inner);
        Ok(progress.get(&progress_key(user_id, word_id)).cloned())
    }

    fn create_progress(&self, record: &WordProgress) -> Result<()> {
        let mut progress = self.progress.write().unwrap_or_else(PoisonError::into_inner);
        let key = record.key();
        if progress.contains_key(&key) {
            return Err(WordtrailError::conflict("word progress", key));
        }
        progress.insert(key, record.clone());
        Ok(())
    }

    fn save_progress(&self, record: &WordProgress) -> Result<()> {
        let mut progress = self.progress.write().unwrap_or_else(PoisonError::into_inner);
        progress.insert(record.key(), record.clone());
        Ok(())
    }

    fn query_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<Vec<WordProgress>> {
        let progress = self.progress.read().unwrap_or_else(PoisonError::into_inner);
        Ok(progress
            .values()
            .filter(|p| &p.user_id == user_id && query.matches(p))
            .cloned()
            .collect())
    }

    fn count_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<usize> {
        let progress = self.progress.read().unwrap_or_else(PoisonError::into_inner);
        Ok(progress
            .values()
            .filter(|p| &p.user_id == user_id && query.matches(p))
            .count())
    }
}

impl ClockInStore for MemoryStore {
    fn get_clock_in(&self, user_id: &UserId, day: NaiveDate) -> Result<Option<ClockInRecord>> {
        let clock_ins = self.clock_ins.read().unwrap_or_else(PoisonError::into_inner);
        Ok(clock_ins
            .get(user_id)
            .and_then(|days| days.get(&day))
            .cloned())
    }

    fn create_clock_in(&self, record: &ClockInRecord) -> Result<()> {
        let mut clock_ins = self.clock_ins.write().unwrap_or_else(PoisonError::into_inner);
        let days = clock_ins.entry(record.user_id.clone()).or_default();
        if days.contains_key(&record.day) {
            return Err(WordtrailError::conflict("clock-in record", record.key()));
        }
        days.insert(record.day, record.clone());
        Ok(())
    }

    fn save_clock_in(&self, record: &ClockInRecord) -> Result<()> {
        let mut clock_ins = self.clock_ins.write().unwrap_or_else(PoisonError::into_inner);
        let days = clock_ins.entry(record.user_id.clone()).or_default();
        let mut record = record.clone();
        if let Some(existing) = days.get(&record.day) {
            record.status |= existing.status;
        }
        days.insert(record.day, record);
        Ok(())
    }

    fn latest_clock_in_before(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> Result<Option<ClockInRecord>> {
        let clock_ins = self.clock_ins.read().unwrap_or_else(PoisonError::into_inner);
        Ok(clock_ins
            .get(user_id)
            .and_then(|days| days.range(..day).next_back())
            .map(|(_, record)| record.clone()))
    }

    fn clock_ins_between(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClockInRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        let clock_ins = self.clock_ins.read().unwrap_or_else(PoisonError::into_inner);
        Ok(clock_ins
            .get(user_id)
            .map(|days| days.range(from..=to).map(|(_, r)| r.clone()).collect())
            .unwrap_or_default())
    }
}

impl GoalStore for MemoryStore {
    fn get_goal(&self, user_id: &UserId) -> Result<Option<LearningGoal>> {
        let goals = self.goals.read().unwrap_or_else(PoisonError::into_inner);
        Ok(goals.get(user_id).cloned())
    }

    fn save_goal(&self, goal: &LearningGoal) -> Result<()> {
        let mut goals = self.goals.write().unwrap_or_else(PoisonError::into_inner);
        goals.insert(goal.user_id.clone(), goal.clone());
        Ok(())
    }
}

impl ActivityStore for MemoryStore {
    fn append_activity(&self, record: &ActivityRecord) -> Result<()> {
        let mut activity = self.activity.write().unwrap_or_else(PoisonError::into_inner);
        activity
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn activities_between(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>> {
        let activity = self.activity.read().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<ActivityRecord> = activity
            .get(user_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.at >= start && r.at < end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{
        test_activity_store, test_clock_in_store, test_goal_store, test_progress_store,
    };
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_memory_progress_store() {
        test_progress_store(&MemoryStore::new());
    }

    #[test]
    fn test_memory_clock_in_store() {
        test_clock_in_store(&MemoryStore::new());
    }

    #[test]
    fn test_memory_goal_store() {
        test_goal_store(&MemoryStore::new());
    }

    #[test]
    fn test_memory_activity_store() {
        test_activity_store(&MemoryStore::new());
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.progress_len(), 0);
        assert_eq!(store.clock_in_len(), 0);
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        let user = UserId::new("u1").unwrap();
        store
            .save_progress(&WordProgress::new(
                user.clone(),
                WordId::new("w1").unwrap(),
                Utc::now(),
            ))
            .unwrap();
        assert!(!store.is_empty());

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_create_has_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1").unwrap();
        let now = Utc::now();
        let mut handles = vec![];

        for _ in 0..8 {
            let store = Arc::clone(&store);
            let record = WordProgress::new(user.clone(), WordId::new("w1").unwrap(), now);
            handles.push(thread::spawn(move || store.create_progress(&record).is_ok()));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.progress_len(), 1);
    }
}
