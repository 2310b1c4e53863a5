//! Checkout (borrow) model and the ledger rules

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{book::BookShort, text_enum, user::UserShort};
use crate::error::{AppError, AppResult};

/// Maximum simultaneous active checkouts per user
pub const MAX_ACTIVE_CHECKOUTS: i64 = 5;

/// Loan period applied when no due date is supplied
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Persisted checkout status. Overdue is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus {
    Borrowed,
    Returned,
}

text_enum!(CheckoutStatus {
    Borrowed => "borrowed",
    Returned => "returned",
});

/// Status filter accepted by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatusFilter {
    Borrowed,
    Returned,
    /// Borrowed and past due
    Overdue,
}

/// Checkout model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Checkout {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkout {
    pub fn is_active(&self) -> bool {
        self.status == CheckoutStatus::Borrowed
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self.status, self.due_date, now)
    }

    /// Check the return transition and resolve the effective return date
    pub fn resolve_return_date(
        &self,
        requested: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<DateTime<Utc>> {
        if !self.is_active() {
            return Err(AppError::InvalidState(format!(
                "Checkout {} is not active",
                self.id
            )));
        }

        let return_date = requested.unwrap_or(now);
        if return_date < self.borrowed_date {
            return Err(AppError::Validation(
                "Return date cannot precede the borrowed date".to_string(),
            ));
        }
        Ok(return_date)
    }
}

fn is_overdue(status: CheckoutStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == CheckoutStatus::Borrowed && due_date < now
}

/// Reject a new checkout once the user holds the maximum
pub fn ensure_quota(active_checkouts: i64) -> AppResult<()> {
    if active_checkouts >= MAX_ACTIVE_CHECKOUTS {
        return Err(AppError::InvalidState(format!(
            "User has reached the maximum of {} active checkouts",
            MAX_ACTIVE_CHECKOUTS
        )));
    }
    Ok(())
}

/// Due date for a checkout starting at `borrowed_date`
pub fn resolve_due_date(
    requested: Option<DateTime<Utc>>,
    borrowed_date: DateTime<Utc>,
) -> AppResult<DateTime<Utc>> {
    match requested {
        Some(due) if due <= borrowed_date => Err(AppError::Validation(
            "Due date must be in the future".to_string(),
        )),
        Some(due) => Ok(due),
        None => Ok(borrowed_date + Duration::days(DEFAULT_LOAN_DAYS)),
    }
}

/// Checkout with the book and user it references
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutDetails {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: CheckoutStatus,
    /// Borrowed and past due at the time of the query
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub book: BookShort,
    pub user: UserShort,
}

/// Internal row structure for the checkout/book/user join
#[derive(Debug, Clone, FromRow)]
pub struct CheckoutDetailsRow {
    id: i32,
    book_id: i32,
    user_id: i32,
    borrowed_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    status: CheckoutStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    book_title: String,
    book_author: String,
    book_isbn: Option<String>,
    user_name: String,
    user_email: String,
}

impl CheckoutDetailsRow {
    pub fn into_details(self, now: DateTime<Utc>) -> CheckoutDetails {
        CheckoutDetails {
            id: self.id,
            book_id: self.book_id,
            user_id: self.user_id,
            borrowed_date: self.borrowed_date,
            due_date: self.due_date,
            return_date: self.return_date,
            status: self.status,
            is_overdue: is_overdue(self.status, self.due_date, now),
            created_at: self.created_at,
            updated_at: self.updated_at,
            book: BookShort {
                id: self.book_id,
                title: self.book_title,
                author: self.book_author,
                isbn: self.book_isbn,
            },
            user: UserShort {
                id: self.user_id,
                name: self.user_name,
                email: self.user_email,
            },
        }
    }
}

/// Create checkout request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCheckout {
    pub book_id: i32,
    pub user_id: i32,
    /// Defaults to 14 days from now
    pub due_date: Option<DateTime<Utc>>,
}

/// Return request; the body is optional
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnCheckout {
    /// Defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

/// Values for a checkout insert, dates already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckout {
    pub book_id: i32,
    pub user_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Checkout query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CheckoutQuery {
    pub status: Option<CheckoutStatusFilter>,
    pub user_id: Option<i32>,
    pub book_id: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Repository-level checkout filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutFilter {
    pub status: Option<CheckoutStatusFilter>,
    pub user_id: Option<i32>,
    pub book_id: Option<i32>,
}

impl CheckoutFilter {
    /// Split the status filter into a stored status and the derived overdue flag
    pub fn status_condition(&self) -> (Option<CheckoutStatus>, bool) {
        match self.status {
            None => (None, false),
            Some(CheckoutStatusFilter::Borrowed) => (Some(CheckoutStatus::Borrowed), false),
            Some(CheckoutStatusFilter::Returned) => (Some(CheckoutStatus::Returned), false),
            Some(CheckoutStatusFilter::Overdue) => (Some(CheckoutStatus::Borrowed), true),
        }
    }
}

impl CheckoutQuery {
    pub fn filter(&self) -> CheckoutFilter {
        CheckoutFilter {
            status: self.status,
            user_id: self.user_id,
            book_id: self.book_id,
        }
    }
}
