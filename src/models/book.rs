//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::text_enum;
use crate::error::{AppError, AppResult};

/// Book availability status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
    Maintenance,
}

text_enum!(BookStatus {
    Available => "available",
    Borrowed => "borrowed",
    Maintenance => "maintenance",
});

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    pub description: Option<String>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Short book representation embedded in checkout listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
}

impl From<&Book> for BookShort {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
        }
    }
}

/// Book query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Substring of title, author or ISBN
    pub search: Option<String>,
    pub status: Option<BookStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Repository-level book filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub search: Option<String>,
    pub status: Option<BookStatus>,
}

impl BookQuery {
    pub fn filter(&self) -> BookFilter {
        BookFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            status: self.status,
        }
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: String,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(max = 255, message = "Publisher must be at most 255 characters"))]
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 9999, message = "Published year must be 1000-9999"))]
    pub published_year: Option<i32>,
    pub description: Option<String>,
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: Option<String>,
    /// Empty string clears the ISBN
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(max = 255, message = "Publisher must be at most 255 characters"))]
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 9999, message = "Published year must be 1000-9999"))]
    pub published_year: Option<i32>,
    pub description: Option<String>,
}

/// Direct status change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookStatus {
    pub status: BookStatus,
}

/// Strip whitespace and hyphens, drop empty values
pub fn normalize_isbn(isbn: Option<String>) -> Option<String> {
    isbn.map(|s| s.chars().filter(|c| !c.is_whitespace() && *c != '-').collect::<String>())
        .filter(|s| !s.is_empty())
}

impl Book {
    pub fn ensure_borrowable(&self) -> AppResult<()> {
        if self.status != BookStatus::Available {
            return Err(AppError::InvalidState(format!(
                "Book {} is not available for checkout (status: {})",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Deletion is blocked, not cascaded, while the book is out
    pub fn ensure_deletable(&self, active_checkouts: i64) -> AppResult<()> {
        if self.status == BookStatus::Borrowed || active_checkouts > 0 {
            return Err(AppError::InvalidState(format!(
                "Book {} is currently borrowed and cannot be deleted",
                self.id
            )));
        }
        Ok(())
    }

    /// Manual status changes may not touch the `borrowed` state, which only
    /// the checkout ledger sets and clears.
    pub fn ensure_manual_status_change(&self, target: BookStatus) -> AppResult<()> {
        if target == BookStatus::Borrowed {
            return Err(AppError::InvalidState(
                "Books are marked borrowed by checking them out".to_string(),
            ));
        }
        if self.status == BookStatus::Borrowed {
            return Err(AppError::InvalidState(format!(
                "Book {} has an active checkout; return it first",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(status: BookStatus) -> Book {
        let now = Utc::now();
        Book {
            id: 11,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Some("9780441013593".to_string()),
            publisher: None,
            published_year: Some(1965),
            description: None,
            status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_only_available_books_are_borrowable() {
        assert!(book(BookStatus::Available).ensure_borrowable().is_ok());
        assert!(matches!(
            book(BookStatus::Borrowed).ensure_borrowable(),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            book(BookStatus::Maintenance).ensure_borrowable(),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_delete_rules() {
        assert!(book(BookStatus::Available).ensure_deletable(0).is_ok());
        assert!(book(BookStatus::Maintenance).ensure_deletable(0).is_ok());
        assert!(book(BookStatus::Borrowed).ensure_deletable(0).is_err());
        assert!(book(BookStatus::Available).ensure_deletable(1).is_err());
    }

    #[test]
    fn test_manual_status_changes() {
        let available = book(BookStatus::Available);
        assert!(available.ensure_manual_status_change(BookStatus::Maintenance).is_ok());
        assert!(available.ensure_manual_status_change(BookStatus::Borrowed).is_err());

        let maintenance = book(BookStatus::Maintenance);
        assert!(maintenance.ensure_manual_status_change(BookStatus::Available).is_ok());

        let borrowed = book(BookStatus::Borrowed);
        assert!(borrowed.ensure_manual_status_change(BookStatus::Available).is_err());
        assert!(borrowed.ensure_manual_status_change(BookStatus::Maintenance).is_err());
    }

    #[test]
    fn test_isbn_normalization() {
        assert_eq!(
            normalize_isbn(Some("978-0-441-01359-3".into())),
            Some("9780441013593".into())
        );
        assert_eq!(normalize_isbn(Some(" ".into())), None);
        assert_eq!(normalize_isbn(None), None);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(BookStatus::Maintenance).unwrap(), "maintenance");
        assert_eq!("Borrowed".parse::<BookStatus>(), Ok(BookStatus::Borrowed));
    }
}
