//! Statistics service

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::stats::{
        fill_month, month_bounds, start_of_month, MonthlyStats, PopularBook, StatsOverview,
        UserCheckoutStats,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Database connectivity check for readiness probes
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.stats.ping().await
    }

    /// Catalog and ledger totals
    pub async fn overview(&self) -> AppResult<StatsOverview> {
        self.overview_at(Utc::now()).await
    }

    async fn overview_at(&self, now: DateTime<Utc>) -> AppResult<StatsOverview> {
        let stats = &self.repository.stats;
        let books = stats.book_counts().await?;

        Ok(StatsOverview {
            total_books: books.total,
            available_books: books.available,
            borrowed_books: books.borrowed,
            monthly_checkouts: stats.count_checkouts_since(start_of_month(now)).await?,
            overdue_books: stats.count_overdue(now).await?,
            total_users: stats.count_users().await?,
        })
    }

    /// Per-day checkouts and returns for one month, every day listed
    pub async fn monthly(&self, year: i32, month: u32) -> AppResult<MonthlyStats> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;

        let checkouts = self.repository.stats.daily_checkouts(start, end).await?;
        let returns = self.repository.stats.daily_returns(start, end).await?;

        Ok(MonthlyStats {
            year,
            month,
            stats: fill_month(year, month, &checkouts, &returns),
        })
    }

    /// Most borrowed books
    pub async fn popular_books(&self, limit: i64) -> AppResult<Vec<PopularBook>> {
        self.repository.stats.popular_books(limit).await
    }

    /// Checkout counts for one user
    pub async fn user_stats(&self, user_id: i32) -> AppResult<UserCheckoutStats> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.stats.user_stats(user_id, Utc::now()).await
    }
}
