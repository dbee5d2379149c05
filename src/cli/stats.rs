//! Stats commands: `due`, `overdue`, `stats` and `new-words`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::study::format_instant;
use crate::config::Config;
use crate::core::{BookId, Clock, UserId, WordId, WordProgress};
use crate::error::Result;
use crate::stats::{BookSummary, ProgressSummary, StatsAggregator};
use crate::storage::ProgressStore;
use crate::wordbook::WordbookResolver;

/// A word in a review list.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub word_id: WordId,
    pub review_stage: u8,
    pub proficiency: f64,
    pub next_review_time: DateTime<Utc>,
}

impl From<&WordProgress> for ReviewItem {
    fn from(progress: &WordProgress) -> Self {
        Self {
            word_id: progress.word_id.clone(),
            review_stage: progress.review_stage,
            proficiency: progress.proficiency,
            next_review_time: progress.next_review_time,
        }
    }
}

/// Output for `due` and `overdue`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewListOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<BookId>,
    /// Which list this is, "due today" or "overdue".
    pub list: &'static str,
    pub words: Vec<ReviewItem>,
    pub count: usize,
}

impl ReviewListOutput {
    fn new(
        user_id: &UserId,
        book_id: Option<&BookId>,
        list: &'static str,
        records: &[WordProgress],
    ) -> Self {
        let words: Vec<ReviewItem> = records.iter().map(ReviewItem::from).collect();
        Self {
            success: true,
            user_id: user_id.clone(),
            book_id: book_id.cloned(),
            list,
            count: words.len(),
            words,
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if self.words.is_empty() {
            return format!("No words {}.", self.list);
        }

        let mut lines = vec![format!("Words {} ({}):", self.list, self.count)];
        lines.push(String::new());
        lines.push(format!(
            "{:<24}  {:>5}  {:>11}  {}",
            "WORD", "STAGE", "PROFICIENCY", "NEXT REVIEW"
        ));
        lines.push("-".repeat(70));
        for item in &self.words {
            lines.push(format!(
                "{:<24}  {:>5}  {:>11.1}  {}",
                item.word_id.as_str(),
                item.review_stage,
                item.proficiency,
                format_instant(item.next_review_time)
            ));
        }
        lines.join("\n")
    }
}

/// Output for `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub summary: ProgressSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<BookSummary>,
    pub mastered_threshold: f64,
    pub due_today: usize,
    pub overdue: usize,
    pub fuzzy_words: usize,
    pub familiar_words: usize,
    pub unlearned_words: usize,
}

impl StatsOutput {
    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![format!("Progress for {}", s.user_id)];
        lines.push(format!("  Words studied:     {}", s.total_words));
        lines.push(format!(
            "  Mastered (>= {:.1}): {}",
            self.mastered_threshold, s.mastered_words
        ));
        lines.push(format!("  Learning:          {}", s.learning_words));
        lines.push(format!("  Familiar:          {}", self.familiar_words));
        lines.push(format!("  Fuzzy:             {}", self.fuzzy_words));
        lines.push(format!("  Unlearned:         {}", self.unlearned_words));
        lines.push(format!("  Avg proficiency:   {:.2}", s.average_proficiency));
        lines.push(format!("  Due today:         {}", self.due_today));
        lines.push(format!("  Overdue:           {}", self.overdue));

        if let Some(book) = &self.book {
            lines.push(String::new());
            lines.push(format!("Book {}", book.book_id));
            lines.push(format!(
                "  Started:           {}/{} ({:.0}%)",
                book.learned_words,
                book.book_size,
                book.completion() * 100.0
            ));
            lines.push(format!("  Mastered:          {}", book.mastered_words));
            lines.push(format!("  Learning:          {}", book.learning_words));
            lines.push(format!("  Avg proficiency:   {:.2}", book.average_proficiency));
        }
        lines.join("\n")
    }
}

/// Output for `new-words`.
#[derive(Debug, Clone, Serialize)]
pub struct NewWordsOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub user_id: UserId,
    pub book_id: BookId,
    pub words: Vec<WordId>,
    pub count: usize,
}

impl NewWordsOutput {
    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if self.words.is_empty() {
            return format!("No new words left in {}.", self.book_id);
        }
        let mut lines = vec![format!("Next {} new words from {}:", self.count, self.book_id)];
        for word in &self.words {
            lines.push(format!("  {}", word));
        }
        lines.join("\n")
    }
}

/// The stats command implementation.
pub struct StatsCommand<S, R, C> {
    stats: StatsAggregator<S, R, C>,
    new_words_batch: usize,
}

impl<S, R, C> StatsCommand<S, R, C>
where
    S: ProgressStore,
    R: WordbookResolver,
    C: Clock,
{
    /// Create a new stats command using thresholds from `config`.
    pub fn new(store: S, resolver: R, clock: C, config: &Config) -> Result<Self> {
        let stats = StatsAggregator::new(store, resolver, clock)
            .with_mastered_threshold(config.stats.mastered_threshold)?;
        Ok(Self {
            stats,
            new_words_batch: config.stats.new_words_batch,
        })
    }

    /// Words due today.
    pub fn due(&self, user_id: &UserId, book_id: Option<&BookId>) -> Result<ReviewListOutput> {
        let records = self.stats.today_review(user_id, book_id)?;
        Ok(ReviewListOutput::new(user_id, book_id, "due today", &records))
    }

    /// Words due at or before now.
    pub fn overdue(&self, user_id: &UserId, book_id: Option<&BookId>) -> Result<ReviewListOutput> {
        let records = self.stats.overdue_review(user_id, book_id)?;
        Ok(ReviewListOutput::new(user_id, book_id, "overdue", &records))
    }

    /// Overall stats, narrowed to a book when one is given.
    pub fn stats(&self, user_id: &UserId, book_id: Option<&BookId>) -> Result<StatsOutput> {
        let book = book_id
            .map(|id| self.stats.book_summary(user_id, id))
            .transpose()?;
        Ok(StatsOutput {
            success: true,
            summary: self.stats.user_summary(user_id)?,
            book,
            mastered_threshold: self.stats.mastered_threshold(),
            due_today: self.stats.today_review(user_id, book_id)?.len(),
            overdue: self.stats.overdue_count(user_id, book_id)?,
            fuzzy_words: self.stats.fuzzy_words(user_id, book_id)?.len(),
            familiar_words: self.stats.familiar_words(user_id, book_id)?.len(),
            unlearned_words: self.stats.unlearned_words(user_id, book_id)?.len(),
        })
    }

    /// Next unstarted words of a book. Uses the configured batch size when
    /// `batch` is `None`.
    pub fn new_words(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        batch: Option<usize>,
    ) -> Result<NewWordsOutput> {
        let batch = batch.unwrap_or(self.new_words_batch);
        let words = self.stats.new_words_from_book(user_id, book_id, batch)?;
        Ok(NewWordsOutput {
            success: true,
            user_id: user_id.clone(),
            book_id: book_id.clone(),
            count: words.len(),
            words,
        })
    }
}
