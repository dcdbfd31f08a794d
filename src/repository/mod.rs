//! Record store collaborator.
//!
//! The core never persists anything itself. Every accepted mutation is handed
//! to a [`RecordStore`] as one batch of [`Change`]s before it is applied in
//! memory, and the indexes are rebuilt from a [`Snapshot`] on startup.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{book::BookRecord, loan::LoanRecord, member::MemberRecord};

pub use memory::InMemoryStore;

/// Failure reported by a store implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("{0}")]
    Other(String),
}

/// One row-level write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "record", rename_all = "snake_case")]
pub enum Change {
    PutBook(BookRecord),
    DeleteBook(String),
    PutMember(MemberRecord),
    DeleteMember(i32),
    PutLoan(LoanRecord),
}

/// Full contents of a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub books: Vec<BookRecord>,
    pub members: Vec<MemberRecord>,
    pub loans: Vec<LoanRecord>,
    /// Lowest book id never handed out, including ids of deleted books
    #[serde(default)]
    pub next_book_id: i32,
    /// Lowest member id never handed out, including ids of deleted members
    #[serde(default)]
    pub next_member_id: i32,
}

/// Durable storage for books, members and loans
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read everything, used to hydrate the in-memory indexes
    async fn load(&self) -> Result<Snapshot, StoreError>;

    /// Apply a batch atomically: either every change lands or none does
    async fn commit(&self, changes: Vec<Change>) -> Result<(), StoreError>;
}
