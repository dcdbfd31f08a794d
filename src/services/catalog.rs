//! Catalog management service

use validator::Validate;

use crate::{
    catalog::order_for_display,
    error::{AppError, AppResult},
    models::book::{BookRecord, BookUpdate, NewBook},
    repository::Change,
    resolver::IdentifierResolver,
};

use super::Context;

#[derive(Clone)]
pub struct CatalogService {
    context: Context,
    resolver: IdentifierResolver,
}

impl CatalogService {
    pub(crate) fn new(context: Context) -> Self {
        Self {
            context,
            resolver: IdentifierResolver::default(),
        }
    }

    /// Add a book; fails if the ISBN is already catalogued
    pub async fn add_book(&self, book: NewBook) -> AppResult<BookRecord> {
        let mut state = self.context.lock().await;
        let record = state.catalog.prepare_insert(&book)?;

        self.context.commit(vec![Change::PutBook(record.clone())]).await?;
        state.catalog.restore(record.clone())?;

        tracing::info!(id = record.id, isbn = %record.isbn, "Book added");
        Ok(record)
    }

    /// Overwrite bibliographic fields of an existing book
    pub async fn update_book(&self, isbn: &str, fields: BookUpdate) -> AppResult<BookRecord> {
        fields.validate()?;

        let mut state = self.context.lock().await;
        let mut updated = state
            .catalog
            .lookup(isbn)
            .cloned()
            .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;
        updated.title = fields.title.clone();
        updated.author = fields.author.clone();
        updated.year = fields.year;

        self.context.commit(vec![Change::PutBook(updated)]).await?;
        let record = state.catalog.update(isbn, &fields)?;

        tracing::info!(id = record.id, isbn = %record.isbn, "Book updated");
        Ok(record)
    }

    /// Remove a book. Refused while any copy of it is on loan.
    pub async fn delete_book(&self, isbn: &str) -> AppResult<BookRecord> {
        let mut state = self.context.lock().await;
        let book = state
            .catalog
            .lookup(isbn)
            .cloned()
            .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;

        if state.ledger.has_open_loans(book.id) {
            tracing::warn!(isbn, "Delete refused, book has open loans");
            return Err(AppError::HasOpenLoans(format!("book {isbn}")));
        }

        self.context.commit(vec![Change::DeleteBook(isbn.to_string())]).await?;
        let removed = state.catalog.delete(isbn)?;

        tracing::info!(id = removed.id, isbn, "Book deleted");
        Ok(removed)
    }

    pub async fn get_book(&self, isbn: &str) -> Option<BookRecord> {
        self.context.lock().await.catalog.lookup(isbn).cloned()
    }

    pub async fn get_book_by_id(&self, id: i32) -> Option<BookRecord> {
        self.context.lock().await.catalog.lookup_by_id(id).cloned()
    }

    /// Resolve a loosely typed token (id, ISBN or part of a title)
    pub async fn find_book(&self, token: &str) -> AppResult<BookRecord> {
        let state = self.context.lock().await;
        self.resolver.resolve_book(&state.catalog, token).cloned()
    }

    pub async fn has_open_loans(&self, isbn: &str) -> AppResult<bool> {
        let state = self.context.lock().await;
        let book = state
            .catalog
            .lookup(isbn)
            .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;
        Ok(state.ledger.has_open_loans(book.id))
    }

    /// All books sorted by title for display
    pub async fn list_books(&self) -> Vec<BookRecord> {
        let state = self.context.lock().await;
        order_for_display(&state.catalog.all())
    }

    /// Books whose title, author or ISBN contains the term
    pub async fn search_books(&self, term: &str) -> Vec<BookRecord> {
        self.context.lock().await.catalog.search(term)
    }

    pub async fn count(&self) -> usize {
        self.context.lock().await.catalog.len()
    }
}
