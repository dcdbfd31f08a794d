//! Hash-partitioned catalog index.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookRecord, BookUpdate, NewBook},
        id_after,
    },
};

/// In-memory book store keyed by ISBN.
///
/// Records live in a fixed number of buckets chosen by hashing the ISBN.
/// Keys that land in the same bucket are chained and scanned linearly, in
/// insertion order. Which bucket a key lands in is not part of any contract.
///
/// Legacy catalogs hashed by summing character codes, so anagram ISBNs
/// always collided. SipHash with fixed keys spreads them out while keeping
/// placement deterministic between runs.
///
/// A secondary id -> ISBN map serves numeric lookups and gives a stable
/// enumeration order (ascending id, which is insertion order).
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    buckets: Vec<Vec<BookRecord>>,
    ids: BTreeMap<i32, String>,
    next_id: i32,
}

impl CatalogIndex {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); bucket_count.max(1)],
            ids: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn bucket_of(&self, isbn: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        isbn.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    /// Validate a new book and build the record `insert` would store, without storing it.
    pub fn prepare_insert(&self, book: &NewBook) -> AppResult<BookRecord> {
        book.validate()?;
        if self.lookup(&book.isbn).is_some() {
            return Err(AppError::DuplicateKey(format!(
                "Book with ISBN {} already exists",
                book.isbn
            )));
        }

        Ok(BookRecord {
            id: self.next_id,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year,
            copies: book.copies,
        })
    }

    /// Insert a new book, assigning it the next synthetic id
    pub fn insert(&mut self, book: &NewBook) -> AppResult<BookRecord> {
        let record = self.prepare_insert(book)?;
        self.restore(record.clone())?;
        Ok(record)
    }

    /// Store a record that already carries its id, as loaded from a snapshot
    /// or produced by [`prepare_insert`](Self::prepare_insert).
    pub fn restore(&mut self, record: BookRecord) -> AppResult<()> {
        if record.copies < 0 {
            return Err(AppError::Validation(format!(
                "Book {} has a negative copy count",
                record.isbn
            )));
        }
        let next_id = id_after(record.id)?;
        if self.ids.contains_key(&record.id) {
            return Err(AppError::DuplicateKey(format!("Book id {} already exists", record.id)));
        }

        let bucket = self.bucket_of(&record.isbn);
        let chain = &mut self.buckets[bucket];
        if chain.iter().any(|b| b.isbn == record.isbn) {
            return Err(AppError::DuplicateKey(format!(
                "Book with ISBN {} already exists",
                record.isbn
            )));
        }

        self.next_id = self.next_id.max(next_id);
        self.ids.insert(record.id, record.isbn.clone());
        chain.push(record);
        Ok(())
    }

    /// Id the next inserted book will get
    pub fn next_id(&self) -> i32 {
        self.next_id
    }

    /// Keep every id below `next_id` out of circulation, e.g. ids of deleted
    /// books that closed loans still point at.
    pub fn reserve_ids(&mut self, next_id: i32) {
        self.next_id = self.next_id.max(next_id);
    }

    pub fn lookup(&self, isbn: &str) -> Option<&BookRecord> {
        self.buckets[self.bucket_of(isbn)]
            .iter()
            .find(|b| b.isbn == isbn)
    }

    fn lookup_mut(&mut self, isbn: &str) -> Option<&mut BookRecord> {
        let bucket = self.bucket_of(isbn);
        self.buckets[bucket].iter_mut().find(|b| b.isbn == isbn)
    }

    pub fn lookup_by_id(&self, id: i32) -> Option<&BookRecord> {
        self.ids.get(&id).and_then(|isbn| self.lookup(isbn))
    }

    /// Overwrite title, author and year. The copy count is left alone.
    pub fn update(&mut self, isbn: &str, fields: &BookUpdate) -> AppResult<BookRecord> {
        fields.validate()?;
        let book = self
            .lookup_mut(isbn)
            .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;

        book.title = fields.title.clone();
        book.author = fields.author.clone();
        book.year = fields.year;
        Ok(book.clone())
    }

    pub fn delete(&mut self, isbn: &str) -> AppResult<BookRecord> {
        let bucket = self.bucket_of(isbn);
        let chain = &mut self.buckets[bucket];
        let position = chain
            .iter()
            .position(|b| b.isbn == isbn)
            .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;

        let removed = chain.remove(position);
        self.ids.remove(&removed.id);
        Ok(removed)
    }

    /// Every record in bucket order. Use [`order_for_display`](super::order_for_display) for display.
    pub fn all(&self) -> Vec<BookRecord> {
        self.buckets.iter().flatten().cloned().collect()
    }

    /// Records in ascending id order
    pub fn iter_by_id(&self) -> impl Iterator<Item = &BookRecord> + '_ {
        self.ids.values().filter_map(|isbn| self.lookup(isbn))
    }

    /// Case-insensitive substring search over title, author and ISBN.
    /// An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<BookRecord> {
        let needle = term.trim().to_lowercase();
        self.iter_by_id()
            .filter(|b| {
                needle.is_empty()
                    || b.title.to_lowercase().contains(&needle)
                    || b.isbn.to_lowercase().contains(&needle)
                    || b
                        .author
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Shift the available copy count. Only circulation calls this.
    pub(crate) fn adjust_copies(&mut self, book_id: i32, delta: i32) -> AppResult<i32> {
        let isbn = self
            .ids
            .get(&book_id)
            .cloned()
            .ok_or_else(|| AppError::BookNotFound(book_id.to_string()))?;
        let book = self
            .lookup_mut(&isbn)
            .ok_or_else(|| AppError::BookNotFound(isbn.clone()))?;

        let copies = book.copies + delta;
        if copies < 0 {
            return Err(AppError::Unavailable(isbn));
        }
        book.copies = copies;
        Ok(copies)
    }
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new(20)
    }
}
