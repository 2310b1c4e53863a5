//! Aggregate queries for statistics

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use super::StatsRepository;
use crate::{
    error::AppResult,
    models::stats::{BookCounts, PopularBook, UserCheckoutStats},
};

#[derive(Clone)]
pub struct PgStatsRepository {
    pool: Pool<Postgres>,
}

impl PgStatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn book_counts(&self) -> AppResult<BookCounts> {
        let counts = sqlx::query_as::<_, BookCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'available') AS available,
                   COUNT(*) FILTER (WHERE status = 'borrowed') AS borrowed
            FROM books
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn count_checkouts_since(&self, since: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM checkouts WHERE borrowed_date >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkouts WHERE status = 'borrowed' AND due_date < $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_users(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn daily_checkouts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(NaiveDate, i64)>> {
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT (borrowed_date AT TIME ZONE 'UTC')::date AS day, COUNT(*)
            FROM checkouts
            WHERE borrowed_date >= $1 AND borrowed_date < $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn daily_returns(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(NaiveDate, i64)>> {
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT (return_date AT TIME ZONE 'UTC')::date AS day, COUNT(*)
            FROM checkouts
            WHERE return_date >= $1 AND return_date < $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn popular_books(&self, limit: i64) -> AppResult<Vec<PopularBook>> {
        let books = sqlx::query_as::<_, PopularBook>(
            r#"
            SELECT b.id, b.title, b.author, COUNT(c.id) AS checkout_count
            FROM books b
            JOIN checkouts c ON c.book_id = b.id
            WHERE b.deleted_at IS NULL
            GROUP BY b.id, b.title, b.author
            ORDER BY checkout_count DESC, b.id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn user_stats(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<UserCheckoutStats> {
        let stats = sqlx::query_as::<_, UserCheckoutStats>(
            r#"
            SELECT COUNT(*) AS total_checkouts,
                   COUNT(*) FILTER (WHERE status = 'borrowed') AS active_checkouts,
                   COUNT(*) FILTER (WHERE status = 'borrowed' AND due_date < $2) AS overdue_checkouts,
                   COUNT(*) FILTER (WHERE status = 'returned') AS returned_books
            FROM checkouts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
