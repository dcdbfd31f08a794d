//! Member (borrower) model

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::book::non_empty;

/// Borrower known to the member directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: i32,
    pub name: String,
    /// Roll number or member code, unique when present
    pub roll: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Create or update member request. Contact fields are stored as given.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMember {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub roll: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            roll: None,
            email: None,
            phone: None,
        }
    }

    pub fn roll(mut self, roll: impl Into<String>) -> Self {
        self.roll = non_empty(&roll.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(&email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = non_empty(&phone.into());
        self
    }
}

/// Member with the number of loans still open, for the borrowers report
#[derive(Debug, Clone, Serialize)]
pub struct MemberLoanCount {
    pub member: MemberRecord,
    pub open_loans: usize,
}
