//! End-to-end study flows through the public API.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use wordtrail::{
    BookId, ClockInEngine, FileStore, FixedClock, MemoryStore, ReviewScheduler, StatsAggregator,
    SystemWordbooks, UserId, WordId, Wordbook,
};

fn user() -> UserId {
    UserId::new("learner").unwrap()
}

fn word(id: &str) -> WordId {
    WordId::new(id).unwrap()
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap()
}

#[test]
fn four_remembered_reviews_reach_stage_four() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(start()));
    let scheduler = ReviewScheduler::new(Arc::clone(&store), Arc::clone(&clock));

    let progress = scheduler.start_learning(&user(), &word("harbor")).unwrap();
    assert_eq!(progress.review_stage, 0);
    assert_eq!(progress.proficiency, 0.0);

    let mut last = progress;
    for _ in 0..4 {
        clock.set(last.next_review_time);
        last = scheduler
            .record_review_result(&user(), &word("harbor"), true)
            .unwrap();
    }

    assert_eq!(last.review_stage, 4);
    assert!((last.proficiency - 0.4).abs() < 1e-9);
    assert_eq!(last.next_review_time, last.last_review_time + Duration::days(15));
    assert_eq!(last.review_history.len(), 4);
}

#[test]
fn forgetting_steps_back_one_stage() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(start()));
    let scheduler = ReviewScheduler::new(Arc::clone(&store), Arc::clone(&clock));

    scheduler.start_learning(&user(), &word("lantern")).unwrap();
    for _ in 0..3 {
        clock.advance_days(1);
        scheduler
            .record_review_result(&user(), &word("lantern"), true)
            .unwrap();
    }

    clock.advance_days(1);
    let progress = scheduler
        .record_review_result(&user(), &word("lantern"), false)
        .unwrap();
    assert_eq!(progress.review_stage, 2);
    assert!((progress.proficiency - 0.2).abs() < 1e-9);
    assert_eq!(
        progress.next_review_time,
        progress.last_review_time + Duration::days(4)
    );
}

#[test]
fn clock_in_needs_both_targets() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(start()));
    let scheduler = ReviewScheduler::new(Arc::clone(&store), Arc::clone(&clock));
    let engine = ClockInEngine::new(Arc::clone(&store), Arc::clone(&clock));
    engine.set_learning_goal(&user(), 10, 30).unwrap();

    let words: Vec<WordId> = (0..10).map(|i| word(&format!("w{}", i))).collect();
    for w in &words {
        scheduler.start_learning(&user(), w).unwrap();
    }
    for i in 0..29 {
        scheduler
            .record_review_result(&user(), &words[i % words.len()], true)
            .unwrap();
    }

    let record = engine.try_clock_in(&user()).unwrap();
    assert_eq!(record.new_words_completed, 10);
    assert_eq!(record.review_words_completed, 29);
    assert!(!record.status);

    scheduler
        .record_review_result(&user(), &words[0], false)
        .unwrap();
    let record = engine.try_clock_in(&user()).unwrap();
    assert_eq!(record.review_words_completed, 30);
    assert!(record.status);
    assert_eq!(record.streak_days, 0);
}

#[test]
fn streak_survives_restart_and_breaks_on_gap() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::at(start()));

    let study_day = |n: usize| {
        let store = Arc::new(FileStore::with_dir(dir.path()).unwrap());
        let scheduler = ReviewScheduler::new(Arc::clone(&store), Arc::clone(&clock));
        let engine = ClockInEngine::new(Arc::clone(&store), Arc::clone(&clock));
        engine.set_learning_goal(&user(), 1, 1).unwrap();

        let fresh = word(&format!("day{}", n));
        scheduler.start_learning(&user(), &fresh).unwrap();
        scheduler.record_review_result(&user(), &fresh, true).unwrap();
        engine.try_clock_in(&user()).unwrap()
    };

    let day1 = study_day(1);
    assert!(day1.status);
    assert_eq!(day1.streak_days, 0);

    clock.advance_days(1);
    let day2 = study_day(2);
    assert!(day2.status);
    assert_eq!(day2.streak_days, 1);

    // Day 3 is skipped entirely.
    clock.advance_days(2);
    let day4 = study_day(4);
    assert!(day4.status);
    assert_eq!(day4.streak_days, 0);

    let store = Arc::new(FileStore::with_dir(dir.path()).unwrap());
    let engine = ClockInEngine::new(store, Arc::clone(&clock));
    let week = engine.weekly_history(&user()).unwrap();
    let achieved: Vec<bool> = week.iter().map(|d| d.status).collect();
    assert_eq!(
        achieved,
        vec![true, false, true, true, false, false, false]
    );
}

#[test]
fn book_progress_tracks_studied_words() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(start()));
    let scheduler = ReviewScheduler::new(Arc::clone(&store), Arc::clone(&clock));

    let book_id = BookId::new("travel").unwrap();
    let mut books = SystemWordbooks::new();
    books.insert(Wordbook::new(
        book_id.clone(),
        "Travel",
        vec![word("ticket"), word("station"), word("luggage")],
    ));
    let stats = StatsAggregator::new(Arc::clone(&store), books, Arc::clone(&clock));

    scheduler.start_learning(&user(), &word("ticket")).unwrap();
    scheduler.start_learning(&user(), &word("unrelated")).unwrap();

    let next = stats.new_words_from_book(&user(), &book_id, 5).unwrap();
    assert_eq!(next, vec![word("station"), word("luggage")]);

    clock.advance_days(1);
    let due = stats.today_review(&user(), Some(&book_id)).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].word_id, word("ticket"));

    let summary = stats.book_summary(&user(), &book_id).unwrap();
    assert_eq!(summary.book_size, 3);
    assert_eq!(summary.learned_words, 1);
    assert_eq!(summary.remaining_words(), 2);
}
