//! Wordbooks and the resolver that maps a book to its words.
//!
//! Books come in two flavours, system-provided and user-curated. Each has its
//! own catalog type implementing [`WordbookResolver`]; [`WordbookCatalog`]
//! consults the system catalog first and falls back to user books.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{BookId, UserId, WordId};
use crate::error::{Result, WordtrailError};
use crate::util::{json_files, read_json};

/// Maps a book identifier to its ordered, duplicate-free word ids.
pub trait WordbookResolver: Send + Sync {
    /// Resolve `book_id`. Fails with `NotFound` for unknown books.
    fn resolve(&self, book_id: &BookId) -> Result<Vec<WordId>>;

    /// Resolve `book_id` into a set for intersecting with progress records.
    fn resolve_set(&self, book_id: &BookId) -> Result<HashSet<WordId>> {
        Ok(self.resolve(book_id)?.into_iter().collect())
    }
}

impl<T: WordbookResolver + ?Sized> WordbookResolver for Arc<T> {
    fn resolve(&self, book_id: &BookId) -> Result<Vec<WordId>> {
        (**self).resolve(book_id)
    }
}

/// A named, ordered collection of words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wordbook {
    pub id: BookId,
    pub name: String,
    /// Curator of a user book. System books have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    pub words: Vec<WordId>,
}

impl Wordbook {
    /// Create a book, keeping the first occurrence of each word.
    pub fn new(id: BookId, name: impl Into<String>, words: Vec<WordId>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            words: dedup_ordered(words),
        }
    }

    /// Mark the book as curated by `owner`.
    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Words in book order with duplicates removed.
    pub fn word_ids(&self) -> Vec<WordId> {
        dedup_ordered(self.words.clone())
    }
}

fn dedup_ordered(words: Vec<WordId>) -> Vec<WordId> {
    let mut seen = HashSet::with_capacity(words.len());
    words.into_iter().filter(|w| seen.insert(w.clone())).collect()
}

fn load_books(dir: &Path) -> Result<HashMap<BookId, Wordbook>> {
    let mut books = HashMap::new();
    for path in json_files(dir)? {
        if let Some(book) = read_json::<Wordbook>(&path)? {
            books.insert(book.id.clone(), book);
        }
    }
    Ok(books)
}

/// System-provided wordbooks.
#[derive(Debug, Clone, Default)]
pub struct SystemWordbooks {
    books: HashMap<BookId, Wordbook>,
}

impl SystemWordbooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` book in `dir`. A missing directory is empty.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            books: load_books(dir)?,
        })
    }

    /// Add or replace a book.
    pub fn insert(&mut self, book: Wordbook) {
        self.books.insert(book.id.clone(), book);
    }

    pub fn get(&self, book_id: &BookId) -> Option<&Wordbook> {
        self.books.get(book_id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl WordbookResolver for SystemWordbooks {
    fn resolve(&self, book_id: &BookId) -> Result<Vec<WordId>> {
        self.get(book_id)
            .map(Wordbook::word_ids)
            .ok_or_else(|| WordtrailError::not_found("wordbook", book_id.as_str()))
    }
}

/// User-curated wordbooks.
#[derive(Debug, Clone, Default)]
pub struct UserWordbooks {
    books: HashMap<BookId, Wordbook>,
}

impl UserWordbooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` book in `dir`. A missing directory is empty.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            books: load_books(dir)?,
        })
    }

    /// Add or replace a book.
    pub fn insert(&mut self, book: Wordbook) {
        self.books.insert(book.id.clone(), book);
    }

    pub fn get(&self, book_id: &BookId) -> Option<&Wordbook> {
        self.books.get(book_id)
    }

    /// Books curated by `owner`, sorted by id.
    pub fn owned_by(&self, owner: &UserId) -> Vec<&Wordbook> {
        let mut books: Vec<&Wordbook> = self
            .books
            .values()
            .filter(|b| b.owner.as_ref() == Some(owner))
            .collect();
        books.sort_by(|a, b| a.id.cmp(&b.id));
        books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl WordbookResolver for UserWordbooks {
    fn resolve(&self, book_id: &BookId) -> Result<Vec<WordId>> {
        self.get(book_id)
            .map(Wordbook::word_ids)
            .ok_or_else(|| WordtrailError::not_found("wordbook", book_id.as_str()))
    }
}

/// System books first, then user books.
#[derive(Debug, Clone, Default)]
pub struct WordbookCatalog {
    pub system: SystemWordbooks,
    pub user: UserWordbooks,
}

impl WordbookCatalog {
    pub fn new(system: SystemWordbooks, user: UserWordbooks) -> Self {
        Self { system, user }
    }

    /// Load `<dir>/system/*.json` and `<dir>/user/*.json`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let catalog = Self {
            system: SystemWordbooks::from_dir(&dir.join("system"))?,
            user: UserWordbooks::from_dir(&dir.join("user"))?,
        };
        tracing::debug!(
            system = catalog.system.len(),
            user = catalog.user.len(),
            dir = %dir.display(),
            "loaded wordbooks"
        );
        Ok(catalog)
    }
}

impl WordbookResolver for WordbookCatalog {
    fn resolve(&self, book_id: &BookId) -> Result<Vec<WordId>> {
        match self.system.resolve(book_id) {
            Err(e) if e.is_not_found() => self.user.resolve(book_id),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn words(ids: &[&str]) -> Vec<WordId> {
        ids.iter().map(|id| WordId::new(*id).unwrap()).collect()
    }

    fn book(id: &str, ids: &[&str]) -> Wordbook {
        Wordbook::new(BookId::new(id).unwrap(), id, words(ids))
    }

    #[test]
    fn test_wordbook_dedups_in_order() {
        let b = book("b1", &["c", "a", "c", "b", "a"]);
        assert_eq!(b.words, words(&["c", "a", "b"]));
    }

    #[test]
    fn test_system_resolve() {
        let mut system = SystemWordbooks::new();
        system.insert(book("cet4", &["apple", "pear"]));

        let ids = system.resolve(&BookId::new("cet4").unwrap()).unwrap();
        assert_eq!(ids, words(&["apple", "pear"]));

        let err = system.resolve(&BookId::new("gre").unwrap()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_catalog_prefers_system_then_user() {
        let mut system = SystemWordbooks::new();
        system.insert(book("shared", &["sys"]));
        let mut user = UserWordbooks::new();
        user.insert(book("shared", &["usr"]));
        user.insert(book("mine", &["x", "y"]).owned_by(UserId::new("u1").unwrap()));

        let catalog = WordbookCatalog::new(system, user);
        assert_eq!(
            catalog.resolve(&BookId::new("shared").unwrap()).unwrap(),
            words(&["sys"])
        );
        assert_eq!(
            catalog.resolve(&BookId::new("mine").unwrap()).unwrap(),
            words(&["x", "y"])
        );
        assert!(catalog
            .resolve(&BookId::new("nope").unwrap())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_user_books_owned_by() {
        let u1 = UserId::new("u1").unwrap();
        let mut user = UserWordbooks::new();
        user.insert(book("b2", &["a"]).owned_by(u1.clone()));
        user.insert(book("b1", &["a"]).owned_by(u1.clone()));
        user.insert(book("b3", &["a"]).owned_by(UserId::new("u2").unwrap()));

        let ids: Vec<&str> = user.owned_by(&u1).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }

    #[test]
    fn test_catalog_from_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("system")).unwrap();
        fs::create_dir_all(dir.path().join("user")).unwrap();
        fs::write(
            dir.path().join("system").join("cet4.json"),
            r#"{"id": "cet4", "name": "CET-4", "words": ["apple", "pear", "apple"]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("user").join("fav.json"),
            r#"{"id": "fav", "name": "Favourites", "owner": "u1", "words": ["plum"]}"#,
        )
        .unwrap();

        let catalog = WordbookCatalog::from_dir(dir.path()).unwrap();
        assert_eq!(
            catalog.resolve(&BookId::new("cet4").unwrap()).unwrap(),
            words(&["apple", "pear"])
        );
        assert_eq!(catalog.user.len(), 1);
        assert!(catalog.resolve_set(&BookId::new("fav").unwrap()).unwrap().len() == 1);
    }

    #[test]
    fn test_catalog_from_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = WordbookCatalog::from_dir(&dir.path().join("none")).unwrap();
        assert!(catalog.system.is_empty());
        assert!(catalog.user.is_empty());
    }

    #[test]
    fn test_invalid_word_id_in_file_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("bad.json"),
            r#"{"id": "bad", "name": "Bad", "words": ["has space"]}"#,
        )
        .unwrap();
        assert!(SystemWordbooks::from_dir(dir.path()).is_err());
    }
}
