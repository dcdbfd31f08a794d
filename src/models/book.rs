//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Column headers used by the catalog export collaborator
pub const BOOK_CSV_HEADER: [&str; 5] = ["ISBN", "Title", "Author", "Year", "Copies"];

/// Book stored in the catalog index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
    /// Copies currently available to issue
    pub copies: i32,
}

impl BookRecord {
    /// Case-folded title used for display ordering
    pub fn title_key(&self) -> String {
        self.title.to_lowercase()
    }

    pub fn is_available(&self) -> bool {
        self.copies > 0
    }

    /// Values matching [`BOOK_CSV_HEADER`]
    pub fn csv_row(&self) -> [String; 5] {
        [
            self.isbn.clone(),
            self.title.clone(),
            self.author.clone().unwrap_or_default(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.copies.to_string(),
        ]
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub copies: i32,
}

impl NewBook {
    pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into().trim().to_string(),
            title: title.into().trim().to_string(),
            author: None,
            year: None,
            copies: 1,
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = non_empty(&author.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn copies(mut self, copies: i32) -> Self {
        self.copies = copies;
        self
    }

    /// Build a request from raw form text.
    ///
    /// An empty year means unknown and empty copies means one copy; anything
    /// else that is not a number is rejected before touching the catalog.
    pub fn parse(isbn: &str, title: &str, author: &str, year: &str, copies: &str) -> AppResult<Self> {
        let book = Self {
            isbn: isbn.trim().to_string(),
            title: title.trim().to_string(),
            author: non_empty(author),
            year: parse_year(year)?,
            copies: match copies.trim() {
                "" => 1,
                raw => raw
                    .parse()
                    .map_err(|_| AppError::Validation("Copies must be a number".to_string()))?,
            },
        };
        book.validate()?;
        Ok(book)
    }
}

/// Bibliographic fields that may be overwritten; copies are owned by circulation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookUpdate {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl BookUpdate {
    pub fn parse(title: &str, author: &str, year: &str) -> AppResult<Self> {
        let update = Self {
            title: title.trim().to_string(),
            author: non_empty(author),
            year: parse_year(year)?,
        };
        update.validate()?;
        Ok(update)
    }
}

fn parse_year(raw: &str) -> AppResult<Option<i32>> {
    match raw.trim() {
        "" => Ok(None),
        raw => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation("Year must be a number".to_string())),
    }
}

pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
