//! Statistics endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::stats::{
        MonthlyStats, MonthlyStatsQuery, PopularBook, PopularBooksQuery, StatsOverview,
        UserCheckoutStats,
    },
};

use super::AuthenticatedUser;

/// Library overview
#[utoipa::path(
    get,
    path = "/api/stats/overview",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Catalog and checkout totals", body = StatsOverview)
    )
)]
pub async fn overview(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<StatsOverview>> {
    let overview = state.services.stats.overview().await?;
    Ok(Json(overview))
}

/// Daily checkouts and returns for a month
#[utoipa::path(
    get,
    path = "/api/stats/monthly",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(MonthlyStatsQuery),
    responses(
        (status = 200, description = "One entry per day of the month", body = MonthlyStats)
    )
)]
pub async fn monthly(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<MonthlyStatsQuery>,
) -> AppResult<Json<MonthlyStats>> {
    let (year, month) = query.resolve(Utc::now());
    let stats = state.services.stats.monthly(year, month).await?;
    Ok(Json(stats))
}

/// Most borrowed books
#[utoipa::path(
    get,
    path = "/api/stats/popular",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(PopularBooksQuery),
    responses(
        (status = 200, description = "Books by checkout count", body = Vec<PopularBook>)
    )
)]
pub async fn popular_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PopularBooksQuery>,
) -> AppResult<Json<Vec<PopularBook>>> {
    let books = state.services.stats.popular_books(query.resolve()).await?;
    Ok(Json(books))
}

/// Checkout counts for one user (self or admin)
#[utoipa::path(
    get,
    path = "/api/stats/user/{user_id}",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User checkout counts", body = UserCheckoutStats),
        (status = 403, description = "Not this user and not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<UserCheckoutStats>> {
    claims.require_self_or_admin(user_id)?;

    let stats = state.services.stats.user_stats(user_id).await?;
    Ok(Json(stats))
}
