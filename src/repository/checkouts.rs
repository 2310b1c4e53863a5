//! Checkouts repository: the transactional ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::CheckoutsRepository;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookStatus},
        checkout::{
            ensure_quota, Checkout, CheckoutDetails, CheckoutDetailsRow, CheckoutFilter,
            CheckoutStatus, NewCheckout,
        },
        pagination::PageRequest,
    },
};

/// Checkout joined with the book and user it references
const DETAILS_SELECT: &str = r#"
    SELECT c.id, c.book_id, c.user_id, c.borrowed_date, c.due_date, c.return_date,
           c.status, c.created_at, c.updated_at,
           b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn,
           u.name AS user_name, u.email AS user_email
    FROM checkouts c
    JOIN books b ON b.id = c.book_id
    JOIN users u ON u.id = c.user_id
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::text IS NULL OR c.status = $1)
      AND ($2::boolean = FALSE OR c.due_date < $3)
      AND ($4::int IS NULL OR c.user_id = $4)
      AND ($5::int IS NULL OR c.book_id = $5)
"#;

#[derive(Clone)]
pub struct PgCheckoutsRepository {
    pool: Pool<Postgres>,
}

impl PgCheckoutsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutsRepository for PgCheckoutsRepository {
    async fn create(&self, checkout: &NewCheckout) -> AppResult<Checkout> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(checkout.book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Book with id {} not found", checkout.book_id))
        })?;

        book.ensure_borrowable()?;

        sqlx::query_scalar::<_, i32>(
            "SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(checkout.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("User with id {} not found", checkout.user_id))
        })?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkouts WHERE user_id = $1 AND status = 'borrowed'",
        )
        .bind(checkout.user_id)
        .fetch_one(&mut *tx)
        .await?;

        ensure_quota(active)?;

        let created = sqlx::query_as::<_, Checkout>(
            r#"
            INSERT INTO checkouts (book_id, user_id, borrowed_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(checkout.book_id)
        .bind(checkout.user_id)
        .bind(checkout.borrowed_date)
        .bind(checkout.due_date)
        .bind(CheckoutStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Book is already checked out"))?;

        sqlx::query("UPDATE books SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(checkout.book_id)
            .bind(BookStatus::Borrowed)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn return_checkout(
        &self,
        id: i32,
        return_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<Checkout> {
        let mut tx = self.pool.begin().await?;

        let checkout = sqlx::query_as::<_, Checkout>(
            "SELECT * FROM checkouts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Checkout with id {} not found", id)))?;

        let return_date = checkout.resolve_return_date(return_date, now)?;

        let returned = sqlx::query_as::<_, Checkout>(
            r#"
            UPDATE checkouts
            SET status = $2, return_date = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(CheckoutStatus::Returned)
        .bind(return_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(checkout.book_id)
            .bind(BookStatus::Available)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(returned)
    }

    async fn get_details(&self, id: i32, now: DateTime<Utc>) -> AppResult<CheckoutDetails> {
        let query = format!("{} WHERE c.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, CheckoutDetailsRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.into_details(now))
            .ok_or_else(|| AppError::NotFound(format!("Checkout with id {} not found", id)))
    }

    async fn list(
        &self,
        filter: &CheckoutFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> AppResult<(Vec<CheckoutDetails>, i64)> {
        let (status, overdue_only) = filter.status_condition();

        let count_query = format!("SELECT COUNT(*) FROM checkouts c {}", FILTER_CLAUSE);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(status)
            .bind(overdue_only)
            .bind(now)
            .bind(filter.user_id)
            .bind(filter.book_id)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "{} {} ORDER BY c.created_at DESC, c.id DESC LIMIT $6 OFFSET $7",
            DETAILS_SELECT, FILTER_CLAUSE
        );
        let rows = sqlx::query_as::<_, CheckoutDetailsRow>(&select_query)
            .bind(status)
            .bind(overdue_only)
            .bind(now)
            .bind(filter.user_id)
            .bind(filter.book_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let checkouts = rows.into_iter().map(|row| row.into_details(now)).collect();
        Ok((checkouts, total))
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<CheckoutDetails>> {
        let query = format!(
            "{} WHERE c.status = 'borrowed' AND c.due_date < $1 ORDER BY c.due_date ASC, c.id ASC",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, CheckoutDetailsRow>(&query)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_details(now)).collect())
    }
}
