//! Spaced-repetition scheduling of individual words.
//!
//! [`ReviewScheduler`] owns the lifecycle of a [`WordProgress`]: creation on
//! first study and the state transition applied by each review. The ladder
//! itself lives in [`crate::core::progress`].

use std::collections::HashSet;

use crate::core::clock::Clock;
use crate::core::ids::{UserId, WordId};
use crate::core::progress::{progress_key, WordProgress};
use crate::error::{Result, WordtrailError};
use crate::storage::{ProgressQuery, ProgressStore};

/// Starts learning and records review outcomes.
pub struct ReviewScheduler<S, C> {
    store: S,
    clock: C,
}

impl<S: ProgressStore, C: Clock> ReviewScheduler<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Begin learning `word_id`, or return the existing progress.
    ///
    /// Concurrent first calls for the same pair all return the one record
    /// that won the create.
    pub fn start_learning(&self, user_id: &UserId, word_id: &WordId) -> Result<WordProgress> {
        self.start_learning_tracked(user_id, word_id)
            .map(|(progress, _)| progress)
    }

    /// Like [`start_learning`](Self::start_learning), also reporting whether
    /// this call created the record. Exactly one of several racing callers
    /// sees `true`.
    pub fn start_learning_tracked(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<(WordProgress, bool)> {
        if let Some(existing) = self.store.get_progress(user_id, word_id)? {
            return Ok((existing, false));
        }

        let candidate = WordProgress::new(user_id.clone(), word_id.clone(), self.clock.now());
        match self.store.create_progress(&candidate) {
            Ok(()) => {
                tracing::debug!(user = %user_id, word = %word_id, "started learning");
                Ok((candidate, true))
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(user = %user_id, word = %word_id, "lost create race, re-reading");
                let winner = self.store.get_progress(user_id, word_id)?.ok_or_else(|| {
                    WordtrailError::invalid_state(format!(
                        "word progress {} vanished after conflict",
                        candidate.key()
                    ))
                })?;
                Ok((winner, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Apply one review outcome and persist it.
    ///
    /// Fails with `NotFound` if the user never started learning the word.
    /// Writes are last-writer-wins: two reviews racing on the same pair can
    /// drop one history entry.
    pub fn record_review_result(
        &self,
        user_id: &UserId,
        word_id: &WordId,
        remembered: bool,
    ) -> Result<WordProgress> {
        let mut progress = self
            .store
            .get_progress(user_id, word_id)?
            .ok_or_else(|| {
                WordtrailError::not_found("word progress", progress_key(user_id, word_id))
            })?;

        progress.apply_review(remembered, self.clock.now());
        self.store.save_progress(&progress)?;

        tracing::debug!(
            user = %user_id,
            word = %word_id,
            remembered,
            stage = progress.review_stage,
            proficiency = progress.proficiency,
            "recorded review"
        );
        Ok(progress)
    }

    /// Current progress for one word, if any.
    pub fn word_progress(&self, user_id: &UserId, word_id: &WordId) -> Result<Option<WordProgress>> {
        self.store.get_progress(user_id, word_id)
    }

    /// Progress for each of `word_ids` that has any, in the order given.
    pub fn progress_for_words(
        &self,
        user_id: &UserId,
        word_ids: &[WordId],
    ) -> Result<Vec<WordProgress>> {
        let wanted: HashSet<WordId> = word_ids.iter().cloned().collect();
        let mut found = self
            .store
            .query_progress(user_id, &ProgressQuery::all().in_words(wanted))?;

        let position = |id: &WordId| word_ids.iter().position(|w| w == id);
        found.sort_by_key(|p| position(&p.word_id));
        Ok(found)
    }
}
