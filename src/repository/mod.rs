//! Repository layer for database operations
//!
//! Each concern is an async trait with one PostgreSQL adapter. Services only
//! see the traits, which lets their unit tests run against mocks.

pub mod books;
pub mod checkouts;
pub mod stats;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookFilter, BookStatus, CreateBook},
        checkout::{Checkout, CheckoutDetails, CheckoutFilter, NewCheckout},
        pagination::PageRequest,
        stats::{BookCounts, PopularBook, UserCheckoutStats},
        user::{NewUser, Role, User, UserFilter},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Live (not soft-deleted) user by id
    async fn get_by_id(&self, id: i32) -> AppResult<User>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool>;
    async fn student_id_exists(&self, student_id: &str, exclude_id: Option<i32>) -> AppResult<bool>;
    async fn create(&self, user: &NewUser) -> AppResult<User>;
    /// Persist profile fields of an already loaded and modified user
    async fn update(&self, user: &User) -> AppResult<User>;
    async fn update_role(&self, id: i32, role: Role) -> AppResult<User>;
    async fn update_password(&self, id: i32, password_hash: &str) -> AppResult<()>;
    /// Soft delete, refused while the user holds active checkouts
    async fn soft_delete(&self, id: i32) -> AppResult<()>;
    async fn search(&self, filter: &UserFilter, page: PageRequest) -> AppResult<(Vec<User>, i64)>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;
    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool>;
    async fn create(&self, book: &CreateBook) -> AppResult<Book>;
    async fn update(&self, book: &Book) -> AppResult<Book>;
    /// Manual status change, refused for `borrowed` in either direction
    async fn update_status(&self, id: i32, status: BookStatus) -> AppResult<Book>;
    /// Soft delete, refused while the book is out
    async fn soft_delete(&self, id: i32) -> AppResult<()>;
    async fn search(&self, filter: &BookFilter, page: PageRequest) -> AppResult<(Vec<Book>, i64)>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutsRepository: Send + Sync {
    /// Borrow a book in one transaction (locks book and user rows)
    async fn create(&self, checkout: &NewCheckout) -> AppResult<Checkout>;
    /// Return a book in one transaction (locks the checkout row)
    async fn return_checkout(
        &self,
        id: i32,
        return_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<Checkout>;
    async fn get_details(&self, id: i32, now: DateTime<Utc>) -> AppResult<CheckoutDetails>;
    /// Page of checkouts, newest first, with the total matching count
    async fn list(
        &self,
        filter: &CheckoutFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> AppResult<(Vec<CheckoutDetails>, i64)>;
    /// Every borrowed checkout past its due date, due date ascending
    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<CheckoutDetails>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
    async fn book_counts(&self) -> AppResult<BookCounts>;
    async fn count_checkouts_since(&self, since: DateTime<Utc>) -> AppResult<i64>;
    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64>;
    async fn count_users(&self) -> AppResult<i64>;
    /// Checkouts per UTC day in `[start, end)`
    async fn daily_checkouts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(NaiveDate, i64)>>;
    /// Returns per UTC day in `[start, end)`
    async fn daily_returns(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(NaiveDate, i64)>>;
    async fn popular_books(&self, limit: i64) -> AppResult<Vec<PopularBook>>;
    async fn user_stats(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<UserCheckoutStats>;
}

/// Main repository struct holding one handle per concern
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub checkouts: Arc<dyn CheckoutsRepository>,
    pub stats: Arc<dyn StatsRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::PgUsersRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            checkouts: Arc::new(checkouts::PgCheckoutsRepository::new(pool.clone())),
            stats: Arc::new(stats::PgStatsRepository::new(pool)),
        }
    }

    /// Assemble from individual handles (used with mocks)
    pub fn from_parts(
        users: Arc<dyn UsersRepository>,
        books: Arc<dyn BooksRepository>,
        checkouts: Arc<dyn CheckoutsRepository>,
        stats: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            users,
            books,
            checkouts,
            stats,
        }
    }
}

/// `%term%` for ILIKE, with LIKE wildcards in the term escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dune"), "%dune%");
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
