//! Loan (issue) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column headers used by the loan export collaborator
pub const LOAN_CSV_HEADER: [&str; 6] = ["IssueID", "Book", "Student", "IssueDate", "DueDate", "ReturnDate"];

/// Lifecycle of a loan. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Open,
    Returned,
}

/// Ledger entry linking a book to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl LoanRecord {
    pub fn status(&self) -> LoanStatus {
        match self.return_date {
            Some(_) => LoanStatus::Returned,
            None => LoanStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Whole days past the due date on `as_of`, zero when on time or early
    pub fn days_late(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.due_date).num_days().max(0)
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.is_open() && self.due_date < as_of
    }
}

/// Outcome of returning a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub loan_id: i32,
    pub fine: i64,
    pub days_late: i64,
}

/// Loan with book and member names resolved for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDetails {
    pub loan: LoanRecord,
    /// `None` once the book has left the catalog
    pub book_title: Option<String>,
    pub member_name: Option<String>,
    pub days_late: i64,
}

impl LoanDetails {
    /// Values matching [`LOAN_CSV_HEADER`]
    pub fn csv_row(&self) -> [String; 6] {
        [
            self.loan.id.to_string(),
            self.book_title.clone().unwrap_or_default(),
            self.member_name.clone().unwrap_or_default(),
            self.loan.issue_date.to_string(),
            self.loan.due_date.to_string(),
            self.loan.return_date.map(|d| d.to_string()).unwrap_or_default(),
        ]
    }
}
