//! Read-only views over a user's word progress.
//!
//! Every query reads fresh from the store. Optional book scoping resolves the
//! book's word set first and restricts the progress query to it.

use std::collections::HashSet;

use serde::Serialize;

use crate::core::{day_bounds, BookId, Clock, UserId, WordId, WordProgress};
use crate::error::{Result, WordtrailError};
use crate::storage::{ProgressQuery, ProgressStore};
use crate::wordbook::WordbookResolver;

/// Default proficiency at which a word counts as mastered.
pub const DEFAULT_MASTERED_THRESHOLD: f64 = 0.9;

/// Default number of words returned by [`StatsAggregator::new_words_from_book`].
pub const DEFAULT_NEW_WORDS_BATCH: usize = 20;

/// Lower bound of the fuzzy band, inclusive.
pub const FUZZY_MIN: f64 = 0.5;

/// Boundary between fuzzy and familiar.
pub const FAMILIAR_MIN: f64 = 0.8;

/// Overall progress of one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub user_id: UserId,
    /// Words with any progress.
    pub total_words: usize,
    pub mastered_words: usize,
    /// Proficiency above zero and below the mastered threshold.
    pub learning_words: usize,
    pub average_proficiency: f64,
}

/// Progress of one user through one book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub user_id: UserId,
    pub book_id: BookId,
    pub book_size: usize,
    /// Book words the user has started.
    pub learned_words: usize,
    pub mastered_words: usize,
    pub learning_words: usize,
    pub average_proficiency: f64,
}

impl BookSummary {
    /// Book words the user has not started.
    pub fn remaining_words(&self) -> usize {
        self.book_size.saturating_sub(self.learned_words)
    }

    /// Share of the book started, in `[0, 1]`.
    pub fn completion(&self) -> f64 {
        if self.book_size == 0 {
            0.0
        } else {
            self.learned_words as f64 / self.book_size as f64
        }
    }
}

/// Stats over progress records, optionally scoped to a wordbook.
pub struct StatsAggregator<S, R, C> {
    store: S,
    resolver: R,
    clock: C,
    mastered_threshold: f64,
}

impl<S, R, C> StatsAggregator<S, R, C>
where
    S: ProgressStore,
    R: WordbookResolver,
    C: Clock,
{
    pub fn new(store: S, resolver: R, clock: C) -> Self {
        Self {
            store,
            resolver,
            clock,
            mastered_threshold: DEFAULT_MASTERED_THRESHOLD,
        }
    }

    /// Use `threshold` as the default for mastered-word queries.
    pub fn with_mastered_threshold(mut self, threshold: f64) -> Result<Self> {
        self.mastered_threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    pub fn mastered_threshold(&self) -> f64 {
        self.mastered_threshold
    }

    /// Word set of `book_id`, or `None` for an unscoped query.
    fn scope(&self, book_id: Option<&BookId>) -> Result<Option<HashSet<WordId>>> {
        book_id.map(|id| self.resolver.resolve_set(id)).transpose()
    }

    fn query(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
        query: ProgressQuery,
    ) -> Result<Vec<WordProgress>> {
        let query = query.in_words_opt(self.scope(book_id)?);
        self.store.query_progress(user_id, &query)
    }

    /// Words whose next review falls on today's calendar day, earliest first.
    pub fn today_review(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
    ) -> Result<Vec<WordProgress>> {
        let (start, end) = day_bounds(self.clock.today(), self.clock.offset());
        let mut due = self.query(
            user_id,
            book_id,
            ProgressQuery::all().next_review_between(start, end),
        )?;
        sort_by_next_review(&mut due);
        Ok(due)
    }

    /// Words due at or before now, most overdue first.
    pub fn overdue_review(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
    ) -> Result<Vec<WordProgress>> {
        let mut due = self.query(user_id, book_id, ProgressQuery::all().due_by(self.clock.now()))?;
        sort_by_next_review(&mut due);
        Ok(due)
    }

    /// Number of words due at or before now.
    pub fn overdue_count(&self, user_id: &UserId, book_id: Option<&BookId>) -> Result<usize> {
        let query = ProgressQuery::all()
            .due_by(self.clock.now())
            .in_words_opt(self.scope(book_id)?);
        self.store.count_progress(user_id, &query)
    }

    /// Words at or above the configured mastered threshold.
    pub fn mastered_words(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
    ) -> Result<Vec<WordProgress>> {
        self.mastered_words_with_threshold(user_id, book_id, self.mastered_threshold)
    }

    /// Words with proficiency at or above `threshold`, which must lie in `[0, 1]`.
    pub fn mastered_words_with_threshold(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
        threshold: f64,
    ) -> Result<Vec<WordProgress>> {
        let threshold = validate_threshold(threshold)?;
        let mut words = self.query(
            user_id,
            book_id,
            ProgressQuery::all().proficiency_at_least(threshold),
        )?;
        sort_by_word(&mut words);
        Ok(words)
    }

    /// Proficiency in `[0.5, 0.8)`.
    pub fn fuzzy_words(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
    ) -> Result<Vec<WordProgress>> {
        let mut words = self.query(
            user_id,
            book_id,
            ProgressQuery::all().proficiency_range(FUZZY_MIN, FAMILIAR_MIN),
        )?;
        sort_by_word(&mut words);
        Ok(words)
    }

    /// Proficiency in `[0.8, 1.0]`.
    pub fn familiar_words(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
    ) -> Result<Vec<WordProgress>> {
        let mut words = self.query(
            user_id,
            book_id,
            ProgressQuery::all().proficiency_range_inclusive(FAMILIAR_MIN, 1.0),
        )?;
        sort_by_word(&mut words);
        Ok(words)
    }

    /// Started but never remembered, proficiency exactly zero.
    pub fn unlearned_words(
        &self,
        user_id: &UserId,
        book_id: Option<&BookId>,
    ) -> Result<Vec<WordProgress>> {
        let mut words = self.query(
            user_id,
            book_id,
            ProgressQuery::all().proficiency_range_inclusive(0.0, 0.0),
        )?;
        sort_by_word(&mut words);
        Ok(words)
    }

    /// Up to `batch_size` book words the user has not started, in book order.
    pub fn new_words_from_book(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        batch_size: usize,
    ) -> Result<Vec<WordId>> {
        let words = self.resolver.resolve(book_id)?;
        let started: HashSet<WordId> = self
            .store
            .query_progress(
                user_id,
                &ProgressQuery::all().in_words(words.iter().cloned().collect()),
            )?
            .into_iter()
            .map(|p| p.word_id)
            .collect();

        Ok(words
            .into_iter()
            .filter(|w| !started.contains(w))
            .take(batch_size)
            .collect())
    }

    /// Mean proficiency, `0.0` when there are no records.
    pub fn average_proficiency(&self, user_id: &UserId, book_id: Option<&BookId>) -> Result<f64> {
        let records = self.query(user_id, book_id, ProgressQuery::all())?;
        Ok(mean_proficiency(&records))
    }

    /// Progress records for the words of `book_id`, in book order.
    pub fn progress_for_book(&self, user_id: &UserId, book_id: &BookId) -> Result<Vec<WordProgress>> {
        let words = self.resolver.resolve(book_id)?;
        let mut records = self.store.query_progress(
            user_id,
            &ProgressQuery::all().in_words(words.iter().cloned().collect()),
        )?;
        records.sort_by_key(|p| words.iter().position(|w| *w == p.word_id));
        Ok(records)
    }

    /// Totals across everything the user has studied.
    pub fn user_summary(&self, user_id: &UserId) -> Result<ProgressSummary> {
        let records = self.store.query_progress(user_id, &ProgressQuery::all())?;
        let (mastered, learning) = self.split_by_threshold(&records);
        Ok(ProgressSummary {
            user_id: user_id.clone(),
            total_words: records.len(),
            mastered_words: mastered,
            learning_words: learning,
            average_proficiency: mean_proficiency(&records),
        })
    }

    /// Totals for one book.
    pub fn book_summary(&self, user_id: &UserId, book_id: &BookId) -> Result<BookSummary> {
        let words = self.resolver.resolve_set(book_id)?;
        let book_size = words.len();
        let records = self
            .store
            .query_progress(user_id, &ProgressQuery::all().in_words(words))?;
        let (mastered, learning) = self.split_by_threshold(&records);
        Ok(BookSummary {
            user_id: user_id.clone(),
            book_id: book_id.clone(),
            book_size,
            learned_words: records.len(),
            mastered_words: mastered,
            learning_words: learning,
            average_proficiency: mean_proficiency(&records),
        })
    }

    /// Counts of (mastered, learning) records.
    fn split_by_threshold(&self, records: &[WordProgress]) -> (usize, usize) {
        let mastered = records
            .iter()
            .filter(|p| p.proficiency >= self.mastered_threshold)
            .count();
        let learning = records
            .iter()
            .filter(|p| p.proficiency > 0.0 && p.proficiency < self.mastered_threshold)
            .count();
        (mastered, learning)
    }
}

fn validate_threshold(threshold: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(WordtrailError::invalid_argument(format!(
            "mastered threshold must be between 0 and 1 (got {})",
            threshold
        )));
    }
    Ok(threshold)
}

fn mean_proficiency(records: &[WordProgress]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|p| p.proficiency).sum::<f64>() / records.len() as f64
}

fn sort_by_next_review(records: &mut [WordProgress]) {
    records.sort_by(|a, b| {
        a.next_review_time
            .cmp(&b.next_review_time)
            .then_with(|| a.word_id.cmp(&b.word_id))
    });
}

fn sort_by_word(records: &mut [WordProgress]) {
    records.sort_by(|a, b| a.word_id.cmp(&b.word_id));
}
