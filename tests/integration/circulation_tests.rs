//! End-to-end circulation tests over the in-memory store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use elidune_circulation::{
    models::{BookUpdate, NewBook, NewMember},
    repository::{Change, Snapshot, StoreError},
    AppConfig, AppError, Clock, InMemoryStore, RecordStore, Services,
};

/// Clock the test can move forward
struct TestClock(Mutex<NaiveDate>);

impl TestClock {
    fn at(y: i32, m: u32, d: u32) -> Arc<Self> {
        Arc::new(Self(Mutex::new(date(y, m, d))))
    }

    fn set(&self, day: NaiveDate) {
        *self.0.lock().unwrap() = day;
    }
}

impl Clock for TestClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn library(clock: Arc<TestClock>) -> Services {
    let services = Services::new(&AppConfig::default(), Arc::new(InMemoryStore::new()), clock);
    services
        .catalog
        .add_book(NewBook::new("9780441013593", "Dune").author("Frank Herbert").year(1965))
        .await
        .unwrap();
    services
        .catalog
        .add_book(NewBook::new("9780141439587", "Emma").author("Jane Austen").copies(2))
        .await
        .unwrap();
    services
        .members
        .save_member(NewMember::new("Asha Rao").roll("CS-01"))
        .await
        .unwrap();
    services
        .members
        .save_member(NewMember::new("Ben Okafor").roll("CS-02"))
        .await
        .unwrap();
    services
}

#[tokio::test]
async fn test_issue_then_late_return() {
    let clock = TestClock::at(2024, 1, 1);
    let services = library(clock.clone()).await;

    let loan = services.loans.issue("dune", "CS-01", Some("9")).await.unwrap();
    assert_eq!(loan.due_date, date(2024, 1, 10));
    assert_eq!(services.catalog.get_book("9780441013593").await.unwrap().copies, 0);

    clock.set(date(2024, 1, 15));
    let overdue = services.loans.overdue_loans(clock.today()).await;
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].days_late, 5);
    assert_eq!(overdue[0].book_title.as_deref(), Some("Dune"));
    assert_eq!(overdue[0].member_name.as_deref(), Some("Asha Rao"));

    let receipt = services.loans.return_loan(loan.id).await.unwrap();
    assert_eq!(receipt.days_late, 5);
    assert_eq!(receipt.fine, 25);
    assert_eq!(services.catalog.get_book("9780441013593").await.unwrap().copies, 1);

    let err = services.loans.return_loan(loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyReturned(_)));
    assert_eq!(services.catalog.get_book("9780441013593").await.unwrap().copies, 1);
}

#[tokio::test]
async fn test_non_numeric_offset_uses_default() {
    let clock = TestClock::at(2024, 3, 1);
    let services = library(clock).await;

    let loan = services.loans.issue("2", "Ben", Some("soon")).await.unwrap();
    assert_eq!(loan.due_date, date(2024, 3, 1).checked_add_days(Days::new(14)).unwrap());
}

#[tokio::test]
async fn test_last_copy_unavailable() {
    let services = library(TestClock::at(2024, 1, 1)).await;

    services.loans.issue("Dune", "1", None).await.unwrap();
    let err = services.loans.issue("Dune", "2", None).await.unwrap_err();

    assert!(matches!(err, AppError::Unavailable(_)));
    assert_eq!(services.loans.count_active().await, 1);
    assert_eq!(services.catalog.get_book("9780441013593").await.unwrap().copies, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_of_last_copy() {
    for _ in 0..20 {
        let services = library(TestClock::at(2024, 1, 1)).await;

        let first = {
            let services = services.clone();
            tokio::spawn(async move { services.loans.issue("Dune", "CS-01", None).await })
        };
        let second = {
            let services = services.clone();
            tokio::spawn(async move { services.loans.issue("Dune", "CS-02", None).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        let issued = results.iter().filter(|r| r.is_ok()).count();
        let refused = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Unavailable(_))))
            .count();
        assert_eq!((issued, refused), (1, 1));
        assert_eq!(services.catalog.get_book("9780441013593").await.unwrap().copies, 0);
        assert_eq!(services.loans.count_active().await, 1);
    }
}

#[tokio::test]
async fn test_delete_rejected_while_on_loan() {
    let services = library(TestClock::at(2024, 1, 1)).await;
    let loan = services.loans.issue("Emma", "CS-02", None).await.unwrap();

    assert!(services.catalog.has_open_loans("9780141439587").await.unwrap());
    assert!(matches!(
        services.catalog.delete_book("9780141439587").await,
        Err(AppError::HasOpenLoans(_))
    ));
    assert!(matches!(
        services.members.delete_member(2).await,
        Err(AppError::HasOpenLoans(_))
    ));

    services.loans.return_loan(loan.id).await.unwrap();
    services.catalog.delete_book("9780141439587").await.unwrap();
    services.members.delete_member(2).await.unwrap();

    // closed loans stay in the history
    let history = services.loans.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].book_title, None);
}

#[tokio::test]
async fn test_catalog_listing_and_update() {
    let services = library(TestClock::at(2024, 1, 1)).await;
    services
        .catalog
        .add_book(NewBook::parse("111", "anna karenina", "Tolstoy", "1878", "").unwrap())
        .await
        .unwrap();

    let titles: Vec<_> = services.catalog.list_books().await.into_iter().map(|b| b.title).collect();
    assert_eq!(titles, ["anna karenina", "Dune", "Emma"]);

    let err = services.catalog.add_book(NewBook::new("111", "Duplicate")).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)));

    services.loans.issue("111", "CS-01", None).await.unwrap();
    let updated = services
        .catalog
        .update_book("111", BookUpdate::parse("Anna Karenina", "Leo Tolstoy", "1878").unwrap())
        .await
        .unwrap();
    assert_eq!(updated.title, "Anna Karenina");
    assert_eq!(updated.copies, 0);

    assert_eq!(services.catalog.search_books("tolstoy").await.len(), 1);
    assert_eq!(services.catalog.find_book("3").await.unwrap().isbn, "111");
}

#[tokio::test]
async fn test_member_reports() {
    let services = library(TestClock::at(2024, 1, 1)).await;
    services.loans.issue("Dune", "CS-02", None).await.unwrap();
    services.loans.issue("Emma", "CS-02", None).await.unwrap();

    let holders = services.members.members_with_loans().await;
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].member.roll.as_deref(), Some("CS-02"));
    assert_eq!(holders[0].open_loans, 2);

    assert_eq!(services.loans.loans_for_member(2).await.unwrap().len(), 2);
    assert!(services.loans.loans_for_member(1).await.unwrap().is_empty());
    assert!(matches!(
        services.loans.loans_for_member(9).await,
        Err(AppError::MemberNotFound(_))
    ));

    // same roll updates the existing member
    let renamed = services
        .members
        .save_member(NewMember::new("Ben O.").roll("CS-02"))
        .await
        .unwrap();
    assert_eq!(renamed.id, 2);
    assert_eq!(services.members.list_members().await.len(), 2);
}

#[tokio::test]
async fn test_return_by_token_validates() {
    let services = library(TestClock::at(2024, 1, 1)).await;
    assert!(matches!(
        services.loans.return_loan_by_token("abc").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        services.loans.return_loan_by_token("7").await,
        Err(AppError::LoanNotFound(7))
    ));
}

/// Store that accepts reads and refuses every write
struct ReadOnlyStore;

#[async_trait]
impl RecordStore for ReadOnlyStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot::default())
    }

    async fn commit(&self, _changes: Vec<Change>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only replica".to_string()))
    }
}

#[tokio::test]
async fn test_storage_errors_propagate() {
    let services = Services::load(&AppConfig::default(), Arc::new(ReadOnlyStore), TestClock::at(2024, 1, 1))
        .await
        .unwrap();

    let err = services.members.save_member(NewMember::new("Asha")).await.unwrap_err();
    assert!(matches!(err, AppError::Storage(StoreError::Unavailable(_))));
    assert!(services.members.list_members().await.is_empty());
}
