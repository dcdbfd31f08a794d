//! Data models for the catalog and circulation core

pub mod book;
pub mod loan;
pub mod member;

// Re-export commonly used types
pub use book::{BookRecord, BookUpdate, NewBook, BOOK_CSV_HEADER};
pub use loan::{LoanDetails, LoanRecord, LoanStatus, ReturnReceipt, LOAN_CSV_HEADER};
pub use member::{MemberLoanCount, MemberRecord, NewMember};

use crate::error::{AppError, AppResult};

/// Id the counter moves to once `id` is taken
pub(crate) fn id_after(id: i32) -> AppResult<i32> {
    id.checked_add(1)
        .ok_or_else(|| AppError::Validation(format!("Id {id} leaves no room for another record")))
}
