//! Error types for the catalog and circulation core

use thiserror::Error;

use crate::repository::StoreError;

/// Stable error codes reported alongside messages to display collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    BadValue = 18,
    NoSuchData = 20,
    UserHasBorrowedSpecimens = 21,
    AlreadyReturned = 22,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Loan not found: {0}")]
    LoanNotFound(i32),

    #[error("No copies available for book {0}")]
    Unavailable(String),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(i32),

    #[error("Open loans still reference {0}")]
    HasOpenLoans(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::DuplicateKey(_) => ErrorCode::Duplicate,
            AppError::BookNotFound(_) => ErrorCode::NoSuchItem,
            AppError::MemberNotFound(_) => ErrorCode::NoSuchUser,
            AppError::LoanNotFound(_) => ErrorCode::NoSuchData,
            AppError::Unavailable(_) => ErrorCode::ItemNotAvailable,
            AppError::AlreadyReturned(_) => ErrorCode::AlreadyReturned,
            AppError::HasOpenLoans(_) => ErrorCode::UserHasBorrowedSpecimens,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Storage(_) => ErrorCode::DbFailure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
