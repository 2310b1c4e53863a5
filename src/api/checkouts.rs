//! Checkout (borrow/return) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        checkout::{CheckoutDetails, CheckoutQuery, CreateCheckout, ReturnCheckout},
        pagination::{PageRequest, Pagination},
    },
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct CheckoutListResponse {
    pub checkouts: Vec<CheckoutDetails>,
    pub pagination: Pagination,
}

/// List checkouts with filters and pagination
#[utoipa::path(
    get,
    path = "/api/checkouts",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(CheckoutQuery),
    responses(
        (status = 200, description = "Page of checkouts, newest first", body = CheckoutListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_checkouts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<CheckoutQuery>,
) -> AppResult<Json<CheckoutListResponse>> {
    let page = PageRequest::new(query.page, query.limit);
    let (checkouts, total) = state
        .services
        .checkouts
        .list_checkouts(&query.filter(), page)
        .await?;

    Ok(Json(CheckoutListResponse {
        checkouts,
        pagination: Pagination::new(page, total),
    }))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/api/checkouts",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    request_body = CreateCheckout,
    responses(
        (status = 201, description = "Book checked out", body = CheckoutDetails),
        (status = 400, description = "Book unavailable, quota reached or bad due date", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or user not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_checkout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<CreateCheckout>,
) -> AppResult<(StatusCode, Json<CheckoutDetails>)> {
    let checkout = state.services.checkouts.create_checkout(request).await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/api/checkouts/{id}/return",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Checkout ID")),
    request_body(content = ReturnCheckout, description = "Optional; the return date defaults to now"),
    responses(
        (status = 200, description = "Book returned", body = CheckoutDetails),
        (status = 400, description = "Already returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Checkout not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_checkout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    request: Option<Json<ReturnCheckout>>,
) -> AppResult<Json<CheckoutDetails>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let checkout = state.services.checkouts.return_checkout(id, request).await?;
    Ok(Json(checkout))
}

/// Overdue checkouts, earliest due date first
#[utoipa::path(
    get,
    path = "/api/checkouts/overdue",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Page of overdue checkouts", body = CheckoutListResponse)
    )
)]
pub async fn overdue_checkouts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<CheckoutQuery>,
) -> AppResult<Json<CheckoutListResponse>> {
    let page = PageRequest::new(query.page, query.limit);
    let overdue = state.services.checkouts.overdue_checkouts().await?;

    Ok(Json(CheckoutListResponse {
        checkouts: Pagination::slice(page, &overdue),
        pagination: Pagination::new(page, overdue.len() as i64),
    }))
}

/// One user's checkouts (self or admin)
#[utoipa::path(
    get,
    path = "/api/checkouts/user/{user_id}",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
        CheckoutQuery
    ),
    responses(
        (status = 200, description = "Page of the user's checkouts", body = CheckoutListResponse),
        (status = 403, description = "Not this user and not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_checkouts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Query(query): Query<CheckoutQuery>,
) -> AppResult<Json<CheckoutListResponse>> {
    claims.require_self_or_admin(user_id)?;

    let page = PageRequest::new(query.page, query.limit);
    let (checkouts, total) = state
        .services
        .checkouts
        .user_checkouts(user_id, query.filter(), page)
        .await?;

    Ok(Json(CheckoutListResponse {
        checkouts,
        pagination: Pagination::new(page, total),
    }))
}
