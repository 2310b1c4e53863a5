//! Statistics views over the catalog and the checkout ledger

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_POPULAR_LIMIT: i64 = 10;
pub const MAX_POPULAR_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatsOverview {
    pub total_books: i64,
    pub available_books: i64,
    pub borrowed_books: i64,
    /// Checkouts since the first day of the current month
    pub monthly_checkouts: i64,
    pub overdue_books: i64,
    pub total_users: i64,
}

/// Book counts by status, soft-deleted books excluded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct BookCounts {
    pub total: i64,
    pub available: i64,
    pub borrowed: i64,
}

/// Checkouts and returns on one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub checkouts: i64,
    pub returns: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub stats: Vec<DailyStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PopularBook {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub checkout_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserCheckoutStats {
    pub total_checkouts: i64,
    pub active_checkouts: i64,
    pub overdue_checkouts: i64,
    pub returned_books: i64,
}

/// Query parameters for the monthly breakdown
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MonthlyStatsQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
}

impl MonthlyStatsQuery {
    /// Resolve against `now`; an out-of-range month falls back to the current one
    pub fn resolve(&self, now: DateTime<Utc>) -> (i32, u32) {
        let year = self.year.unwrap_or_else(|| now.year());
        let month = self
            .month
            .filter(|m| (1..=12).contains(m))
            .unwrap_or_else(|| now.month());
        (year, month)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PopularBooksQuery {
    /// 1-50, defaults to 10
    pub limit: Option<i64>,
}

impl PopularBooksQuery {
    pub fn resolve(&self) -> i64 {
        self.limit
            .filter(|l| (1..=MAX_POPULAR_LIMIT).contains(l))
            .unwrap_or(DEFAULT_POPULAR_LIMIT)
    }
}

/// `[first day of month, first day of next month)` in UTC
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?),
    ))
}

/// Start of the month containing `now`
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    month_bounds(now.year(), now.month())
        .map(|(start, _)| start)
        .unwrap_or(now)
}

/// One entry per day of the month, in date order, zero-filled
pub fn fill_month(
    year: i32,
    month: u32,
    checkouts: &[(NaiveDate, i64)],
    returns: &[(NaiveDate, i64)],
) -> Vec<DailyStats> {
    let Some((start, end)) = month_bounds(year, month) else {
        return Vec::new();
    };

    let count_on = |rows: &[(NaiveDate, i64)], day: NaiveDate| {
        rows.iter()
            .filter(|(d, _)| *d == day)
            .map(|(_, c)| *c)
            .sum::<i64>()
    };

    let mut days = Vec::new();
    let mut day = start.date_naive();
    let last = end.date_naive();
    while day < last {
        days.push(DailyStats {
            date: day,
            checkouts: count_on(checkouts, day),
            returns: count_on(returns, day),
        });
        day += Duration::days(1);
    }
    days
}
