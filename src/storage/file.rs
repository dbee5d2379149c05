//! File-based storage for wordtrail.
//!
//! Records are JSON documents under a data directory:
//!
//! ```text
//! <data_dir>/progress/<user>/<word>.json
//! <data_dir>/clock_ins/<user>/<YYYY-MM-DD>.json
//! <data_dir>/goals/<user>.json
//! <data_dir>/activity/<user>.jsonl
//! ```
//!
//! Updates use temp file + rename. Create-if-absent hard-links a fully written
//! temp file into place, so the (user, word) and (user, day) uniqueness holds
//! across processes sharing the directory. An achieved day also gets an empty
//! `<YYYY-MM-DD>.achieved` marker created the same way, and reads OR it into
//! the record's status.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{
    ActivityRecord, ClockInRecord, LearningGoal, UserId, WordId, WordProgress,
};
use crate::error::{Result, WordtrailError};
use crate::storage::{ActivityStore, ClockInStore, GoalStore, ProgressQuery, ProgressStore};
use crate::util::{atomic_write, create_exclusive, json_files, read_json, read_to_string_limited};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// File-based store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn with_dir(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| WordtrailError::storage(&root, e))?;
        }
        Ok(Self { root })
    }

    /// The data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn progress_dir(&self, user_id: &UserId) -> PathBuf {
        self.root.join("progress").join(user_id.as_str())
    }

    fn progress_path(&self, user_id: &UserId, word_id: &WordId) -> PathBuf {
        self.progress_dir(user_id)
            .join(format!("{}.json", word_id.as_str()))
    }

    fn clock_in_dir(&self, user_id: &UserId) -> PathBuf {
        self.root.join("clock_ins").join(user_id.as_str())
    }

    fn clock_in_path(&self, user_id: &UserId, day: NaiveDate) -> PathBuf {
        self.clock_in_dir(user_id)
            .join(format!("{}.json", day.format(DAY_FORMAT)))
    }

    /// Marker published once a day is achieved. It is only ever created,
    /// never rewritten, so a racing save cannot take it back.
    fn achieved_marker_path(&self, user_id: &UserId, day: NaiveDate) -> PathBuf {
        self.clock_in_dir(user_id)
            .join(format!("{}.achieved", day.format(DAY_FORMAT)))
    }

    fn mark_achieved(&self, record: &ClockInRecord) -> Result<()> {
        let path = self.achieved_marker_path(&record.user_id, record.day);
        match create_exclusive(&path, b"", "achieved marker", &record.key()) {
            Err(e) if e.is_conflict() => Ok(()),
            other => other,
        }
    }

    fn goal_path(&self, user_id: &UserId) -> PathBuf {
        self.root
            .join("goals")
            .join(format!("{}.json", user_id.as_str()))
    }

    fn activity_path(&self, user_id: &UserId) -> PathBuf {
        self.root
            .join("activity")
            .join(format!("{}.jsonl", user_id.as_str()))
    }

    /// Days that have a clock-in file for `user_id`, unordered.
    fn clock_in_days(&self, user_id: &UserId) -> Result<Vec<NaiveDate>> {
        let mut days = Vec::new();
        for path in json_files(&self.clock_in_dir(user_id))? {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match NaiveDate::parse_from_str(&stem, DAY_FORMAT) {
                Ok(day) => days.push(day),
                Err(_) => {
                    tracing::warn!(path = %path.display(), "ignoring unexpected file in clock-in directory");
                }
            }
        }
        Ok(days)
    }
}

impl ProgressStore for FileStore {
    fn get_progress(&self, user_id: &UserId, word_id: &WordId) -> Result<Option<WordProgress>> {
        read_json(&self.progress_path(user_id, word_id))
    }

    fn create_progress(&self, progress: &WordProgress) -> Result<()> {
        let json = serde_json::to_string_pretty(progress)?;
        create_exclusive(
            &self.progress_path(&progress.user_id, &progress.word_id),
            json.as_bytes(),
            "word progress",
            &progress.key(),
        )
    }

    fn save_progress(&self, progress: &WordProgress) -> Result<()> {
        let json = serde_json::to_string_pretty(progress)?;
        atomic_write(
            &self.progress_path(&progress.user_id, &progress.word_id),
            json.as_bytes(),
        )
    }

    fn query_progress(&self, user_id: &UserId, query: &ProgressQuery) -> Result<Vec<WordProgress>> {
        let mut found = Vec::new();
        for path in json_files(&self.progress_dir(user_id))? {
            if let Some(progress) = read_json::<WordProgress>(&path)? {
                if query.matches(&progress) {
                    found.push(progress);
                }
            }
        }
        Ok(found)
    }
}

impl ClockInStore for FileStore {
    fn get_clock_in(&self, user_id: &UserId, day: NaiveDate) -> Result<Option<ClockInRecord>> {
        let record: Option<ClockInRecord> = read_json(&self.clock_in_path(user_id, day))?;
        Ok(record.map(|mut record| {
            record.status |= self.achieved_marker_path(user_id, day).exists();
            record
        }))
    }

    fn create_clock_in(&self, record: &ClockInRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        create_exclusive(
            &self.clock_in_path(&record.user_id, record.day),
            json.as_bytes(),
            "clock-in record",
            &record.key(),
        )?;
        if record.status {
            self.mark_achieved(record)?;
        }
        Ok(())
    }

    fn save_clock_in(&self, record: &ClockInRecord) -> Result<()> {
        // The marker lands before the record so readers never see an
        // achieved record file without it.
        if record.status {
            self.mark_achieved(record)?;
        }
        let mut record = record.clone();
        if let Some(existing) = self.get_clock_in(&record.user_id, record.day)? {
            record.status |= existing.status;
        }
        let json = serde_json::to_string_pretty(&record)?;
        atomic_write(
            &self.clock_in_path(&record.user_id, record.day),
            json.as_bytes(),
        )
    }

    fn latest_clock_in_before(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> Result<Option<ClockInRecord>> {
        let latest = self
            .clock_in_days(user_id)?
            .into_iter()
            .filter(|d| *d < day)
            .max();
        match latest {
            Some(d) => self.get_clock_in(user_id, d),
            None => Ok(None),
        }
    }

    fn clock_ins_between(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClockInRecord>> {
        let mut days: Vec<NaiveDate> = self
            .clock_in_days(user_id)?
            .into_iter()
            .filter(|d| *d >= from && *d <= to)
            .collect();
        days.sort();

        let mut records = Vec::with_capacity(days.len());
        for day in days {
            if let Some(record) = self.get_clock_in(user_id, day)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl GoalStore for FileStore {
    fn get_goal(&self, user_id: &UserId) -> Result<Option<LearningGoal>> {
        read_json(&self.goal_path(user_id))
    }

    fn save_goal(&self, goal: &LearningGoal) -> Result<()> {
        let json = serde_json::to_string_pretty(goal)?;
        atomic_write(&self.goal_path(&goal.user_id), json.as_bytes())
    }
}

impl ActivityStore for FileStore {
    fn append_activity(&self, record: &ActivityRecord) -> Result<()> {
        let path = self.activity_path(&record.user_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| WordtrailError::storage(parent, e))?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WordtrailError::storage(&path, e))?;
        writeln!(file, "{}", json).map_err(|e| WordtrailError::storage(&path, e))?;
        Ok(())
    }

    fn activities_between(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>> {
        let path = self.activity_path(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = read_to_string_limited(&path)?;
        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: ActivityRecord = serde_json::from_str(line).map_err(|e| {
                WordtrailError::serde(format!(
                    "{}:{}: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            if record.at >= start && record.at < end {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.at);
        Ok(records)
    }
}
