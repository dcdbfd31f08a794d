//! In-memory record store

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{Change, RecordStore, Snapshot, StoreError};
use crate::models::{book::BookRecord, loan::LoanRecord, member::MemberRecord};

#[derive(Debug, Default, Clone)]
struct Tables {
    books: IndexMap<String, BookRecord>,
    members: IndexMap<i32, MemberRecord>,
    loans: IndexMap<i32, LoanRecord>,
    // high-water marks, never lowered by deletes
    next_book_id: i32,
    next_member_id: i32,
}

fn id_after(id: i32) -> Result<i32, StoreError> {
    id.checked_add(1)
        .ok_or_else(|| StoreError::Constraint(format!("id {id} is out of range")))
}

impl Tables {
    fn apply(&mut self, change: Change) -> Result<(), StoreError> {
        match change {
            Change::PutBook(book) => {
                self.next_book_id = self.next_book_id.max(id_after(book.id)?);
                self.books.insert(book.isbn.clone(), book);
            }
            Change::DeleteBook(isbn) => {
                self.books
                    .shift_remove(&isbn)
                    .ok_or_else(|| StoreError::Constraint(format!("no book with ISBN {isbn}")))?;
            }
            Change::PutMember(member) => {
                self.next_member_id = self.next_member_id.max(id_after(member.id)?);
                self.members.insert(member.id, member);
            }
            Change::DeleteMember(id) => {
                self.members
                    .shift_remove(&id)
                    .ok_or_else(|| StoreError::Constraint(format!("no member with id {id}")))?;
            }
            Change::PutLoan(loan) => {
                if !self.books.values().any(|b| b.id == loan.book_id) {
                    return Err(StoreError::Constraint(format!("loan {} references a missing book", loan.id)));
                }
                if !self.members.contains_key(&loan.member_id) {
                    return Err(StoreError::Constraint(format!("loan {} references a missing member", loan.id)));
                }
                self.loans.insert(loan.id, loan);
            }
        }
        Ok(())
    }
}

/// Store backed by process memory. Useful for tests and ephemeral libraries.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let next_book_id = snapshot
            .books
            .iter()
            .map(|b| b.id.saturating_add(1))
            .fold(snapshot.next_book_id, i32::max);
        let next_member_id = snapshot
            .members
            .iter()
            .map(|m| m.id.saturating_add(1))
            .fold(snapshot.next_member_id, i32::max);
        let tables = Tables {
            books: snapshot.books.into_iter().map(|b| (b.isbn.clone(), b)).collect(),
            members: snapshot.members.into_iter().map(|m| (m.id, m)).collect(),
            loans: snapshot.loans.into_iter().map(|l| (l.id, l)).collect(),
            next_book_id,
            next_member_id,
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let tables = self.tables.read().await;
        Ok(Snapshot {
            books: tables.books.values().cloned().collect(),
            members: tables.members.values().cloned().collect(),
            loans: tables.loans.values().cloned().collect(),
            next_book_id: tables.next_book_id,
            next_member_id: tables.next_member_id,
        })
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        // Work on a copy so a failing change leaves the tables untouched
        let mut staged = tables.clone();
        for change in changes {
            staged.apply(change)?;
        }
        *tables = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn book(id: i32, isbn: &str) -> BookRecord {
        BookRecord {
            id,
            isbn: isbn.to_string(),
            title: format!("Book {id}"),
            author: None,
            year: None,
            copies: 1,
        }
    }

    fn member(id: i32) -> MemberRecord {
        MemberRecord {
            id,
            name: format!("Member {id}"),
            roll: None,
            email: None,
            phone: None,
        }
    }

    fn loan(id: i32, book_id: i32, member_id: i32) -> LoanRecord {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        LoanRecord {
            id,
            book_id,
            member_id,
            issue_date: day,
            due_date: day,
            return_date: None,
        }
    }

    #[test]
    fn test_commit_and_load() {
        let store = InMemoryStore::new();
        tokio_test::block_on(async {
            store
                .commit(vec![
                    Change::PutBook(book(1, "111")),
                    Change::PutMember(member(1)),
                    Change::PutLoan(loan(1, 1, 1)),
                ])
                .await
                .unwrap();

            let snapshot = store.load().await.unwrap();
            assert_eq!(snapshot.books.len(), 1);
            assert_eq!(snapshot.members.len(), 1);
            assert_eq!(snapshot.loans, vec![loan(1, 1, 1)]);
        });
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let store = InMemoryStore::with_snapshot(Snapshot {
            books: vec![book(1, "111")],
            ..Default::default()
        });

        let err = store
            .commit(vec![
                Change::PutBook(book(2, "222")),
                Change::PutLoan(loan(1, 1, 99)),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert_eq!(store.load().await.unwrap().books.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_constraint_error() {
        let store = InMemoryStore::new();
        assert!(store.commit(vec![Change::DeleteBook("nope".into())]).await.is_err());
        assert!(store.commit(vec![Change::DeleteMember(3)]).await.is_err());
    }

    #[tokio::test]
    async fn test_deletes_keep_id_counters() {
        let store = InMemoryStore::new();
        store
            .commit(vec![
                Change::PutBook(book(1, "111")),
                Change::PutBook(book(2, "222")),
                Change::PutMember(member(1)),
                Change::PutMember(member(2)),
            ])
            .await
            .unwrap();
        store
            .commit(vec![Change::DeleteBook("222".into()), Change::DeleteMember(2)])
            .await
            .unwrap();

        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.books.len(), 1);
        assert_eq!((snapshot.next_book_id, snapshot.next_member_id), (3, 3));

        let reopened = InMemoryStore::with_snapshot(snapshot);
        assert_eq!(reopened.load().await.unwrap().next_book_id, 3);
    }

    #[tokio::test]
    async fn test_last_id_is_refused() {
        let store = InMemoryStore::new();
        let err = store
            .commit(vec![Change::PutBook(book(i32::MAX, "999"))])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert!(store.load().await.unwrap().books.is_empty());
    }
}
