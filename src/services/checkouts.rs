//! Checkout ledger service

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        checkout::{
            resolve_due_date, CheckoutDetails, CheckoutFilter, CreateCheckout, NewCheckout,
            ReturnCheckout,
        },
        pagination::PageRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CheckoutsService {
    repository: Repository,
}

impl CheckoutsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for a user
    pub async fn create_checkout(&self, request: CreateCheckout) -> AppResult<CheckoutDetails> {
        let now = Utc::now();
        let new_checkout = NewCheckout {
            book_id: request.book_id,
            user_id: request.user_id,
            borrowed_date: now,
            due_date: resolve_due_date(request.due_date, now)?,
        };

        let checkout = self
            .repository
            .checkouts
            .create(&new_checkout)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    book_id = request.book_id,
                    user_id = request.user_id,
                    "Checkout refused: {}",
                    e
                )
            })?;

        tracing::info!(
            checkout_id = checkout.id,
            book_id = checkout.book_id,
            user_id = checkout.user_id,
            due_date = %checkout.due_date,
            "Book checked out"
        );

        self.repository.checkouts.get_details(checkout.id, now).await
    }

    /// Return a borrowed book
    pub async fn return_checkout(
        &self,
        id: i32,
        request: ReturnCheckout,
    ) -> AppResult<CheckoutDetails> {
        let now = Utc::now();
        let checkout = self
            .repository
            .checkouts
            .return_checkout(id, request.return_date, now)
            .await
            .inspect_err(|e| tracing::warn!(checkout_id = id, "Return refused: {}", e))?;

        tracing::info!(
            checkout_id = checkout.id,
            book_id = checkout.book_id,
            "Book returned"
        );

        self.repository.checkouts.get_details(checkout.id, now).await
    }

    /// List checkouts, newest first
    pub async fn list_checkouts(
        &self,
        filter: &CheckoutFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<CheckoutDetails>, i64)> {
        self.repository.checkouts.list(filter, page, Utc::now()).await
    }

    /// All overdue checkouts, earliest due date first
    pub async fn overdue_checkouts(&self) -> AppResult<Vec<CheckoutDetails>> {
        self.repository.checkouts.list_overdue(Utc::now()).await
    }

    /// List one user's checkouts
    pub async fn user_checkouts(
        &self,
        user_id: i32,
        filter: CheckoutFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<CheckoutDetails>, i64)> {
        self.repository.users.get_by_id(user_id).await?;

        let filter = CheckoutFilter {
            user_id: Some(user_id),
            ..filter
        };
        self.repository.checkouts.list(&filter, page, Utc::now()).await
    }
}
