//! Study commands: `study`, `review` and `progress`.
//!
//! `study` and `review` also append an activity record so that session
//! summaries reflect what was done from the command line.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{ActivityKind, Clock, ReviewScheduler, UserId, WordId, WordProgress};
use crate::error::Result;
use crate::stats::ActivityLog;
use crate::storage::{ActivityStore, ProgressStore};

/// Output for commands that show a single word's progress.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub user_id: UserId,
    pub word_id: WordId,
    /// `None` when the user never studied the word.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<WordProgress>,
    /// Whether the word is due for review now.
    pub due: bool,
}

impl ProgressOutput {
    fn new(
        user_id: UserId,
        word_id: WordId,
        progress: Option<WordProgress>,
        now: DateTime<Utc>,
    ) -> Self {
        let due = progress.as_ref().map(|p| p.is_due(now)).unwrap_or(false);
        Self {
            success: true,
            user_id,
            word_id,
            progress,
            due,
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let Some(progress) = &self.progress else {
            return format!("{} has not started learning '{}'.", self.user_id, self.word_id);
        };

        let mut lines = vec![format!("{} / {}", self.user_id, self.word_id)];
        lines.push(format!("  Stage:        {}", progress.review_stage));
        lines.push(format!("  Proficiency:  {:.1}", progress.proficiency));
        lines.push(format!("  Reviews:      {}", progress.review_history.len()));
        lines.push(format!("  Learned:      {}", format_instant(progress.first_learn_time)));
        lines.push(format!("  Last review:  {}", format_instant(progress.last_review_time)));
        lines.push(format!(
            "  Next review:  {}{}",
            format_instant(progress.next_review_time),
            if self.due { " (due)" } else { "" }
        ));
        lines.join("\n")
    }
}

pub(crate) fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// The study command implementation.
pub struct StudyCommand<S, C> {
    scheduler: ReviewScheduler<S, C>,
    activity: ActivityLog<S, C>,
    clock: C,
}

impl<S, C> StudyCommand<S, C>
where
    S: ProgressStore + ActivityStore + Clone,
    C: Clock + Clone,
{
    /// Create a new study command.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            scheduler: ReviewScheduler::new(store.clone(), clock.clone()),
            activity: ActivityLog::new(store, clock.clone()),
            clock,
        }
    }

    /// Start learning a word. A word already in progress is returned as is
    /// and is not logged as new activity.
    pub fn study(&self, user_id: &UserId, word_id: &WordId) -> Result<ProgressOutput> {
        let (progress, created) = self.scheduler.start_learning_tracked(user_id, word_id)?;
        if created {
            self.activity.record_activity(user_id, ActivityKind::Learn, 1)?;
        }
        Ok(ProgressOutput::new(
            user_id.clone(),
            word_id.clone(),
            Some(progress),
            self.clock.now(),
        ))
    }

    /// Record one review outcome.
    pub fn review(
        &self,
        user_id: &UserId,
        word_id: &WordId,
        remembered: bool,
    ) -> Result<ProgressOutput> {
        let progress = self.scheduler.record_review_result(user_id, word_id, remembered)?;
        self.activity.record_activity(user_id, ActivityKind::Review, 1)?;
        Ok(ProgressOutput::new(
            user_id.clone(),
            word_id.clone(),
            Some(progress),
            self.clock.now(),
        ))
    }

    /// Show a word's progress without changing it.
    pub fn progress(&self, user_id: &UserId, word_id: &WordId) -> Result<ProgressOutput> {
        let progress = self.scheduler.word_progress(user_id, word_id)?;
        Ok(ProgressOutput::new(
            user_id.clone(),
            word_id.clone(),
            progress,
            self.clock.now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Barrier};
    use std::thread;

    type TestCommand = StudyCommand<Arc<MemoryStore>, Arc<FixedClock>>;

    fn create_test_command() -> (TestCommand, Arc<MemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let cmd = StudyCommand::new(Arc::clone(&store), Arc::clone(&clock));
        (cmd, store, clock)
    }

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn word() -> WordId {
        WordId::new("apple").unwrap()
    }

    #[test]
    fn test_study_logs_activity_once() {
        let (cmd, store, _) = create_test_command();
        let output = cmd.study(&user(), &word()).unwrap();
        assert!(output.success);
        assert_eq!(output.progress.as_ref().unwrap().review_stage, 0);

        cmd.study(&user(), &word()).unwrap();
        let activity = store.activities(&user()).unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].kind, ActivityKind::Learn);
    }

    #[test]
    fn test_racing_study_logs_one_learn() {
        let (cmd, store, _) = create_test_command();
        let cmd = Arc::new(cmd);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cmd = Arc::clone(&cmd);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cmd.study(&user(), &word()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.progress_len(), 1);
        assert_eq!(store.activities(&user()).unwrap().len(), 1);
    }

    #[test]
    fn test_review_logs_activity_and_updates() {
        let (cmd, store, clock) = create_test_command();
        cmd.study(&user(), &word()).unwrap();
        clock.advance_days(1);

        let output = cmd.review(&user(), &word(), true).unwrap();
        let progress = output.progress.unwrap();
        assert_eq!(progress.review_stage, 1);
        assert!(!output.due);

        let kinds: Vec<ActivityKind> = store
            .activities(&user())
            .unwrap()
            .iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(kinds, vec![ActivityKind::Learn, ActivityKind::Review]);
    }

    #[test]
    fn test_review_unstarted_word_fails() {
        let (cmd, store, _) = create_test_command();
        assert!(cmd.review(&user(), &word(), false).unwrap_err().is_not_found());
        assert!(store.activities(&user()).unwrap().is_empty());
    }

    #[test]
    fn test_progress_reports_due() {
        let (cmd, _, clock) = create_test_command();
        let output = cmd.progress(&user(), &word()).unwrap();
        assert!(output.progress.is_none());
        assert!(output.format_text().contains("has not started"));

        cmd.study(&user(), &word()).unwrap();
        clock.advance(Duration::days(1));
        let output = cmd.progress(&user(), &word()).unwrap();
        assert!(output.due);
        let text = output.format_text();
        assert!(text.contains("(due)"));
        assert!(text.contains("Proficiency:  0.0"));
    }
}
