//! Checkout ledger tests against a live PostgreSQL database
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test ledger_tests -- --ignored

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use librarium_server::{
    error::AppError,
    models::{
        book::{Book, BookFilter, BookStatus, CreateBook},
        checkout::{CheckoutFilter, CheckoutStatus, CheckoutStatusFilter, NewCheckout},
        pagination::{PageRequest, Pagination},
        user::{NewUser, Role, User},
    },
    repository::Repository,
};

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn unique(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

async fn setup() -> (PgPool, Repository) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    let repository = Repository::new(pool.clone());
    (pool, repository)
}

async fn new_user(repository: &Repository) -> User {
    repository
        .users
        .create(&NewUser {
            name: "Ledger Reader".to_string(),
            email: format!("{}@example.org", unique("reader")),
            password_hash: "not-a-real-hash".to_string(),
            student_id: None,
            role: Role::User,
        })
        .await
        .expect("create user")
}

async fn new_book(repository: &Repository, title: &str) -> Book {
    repository
        .books
        .create(&CreateBook {
            title: title.to_string(),
            author: "Ledger Author".to_string(),
            isbn: None,
            publisher: None,
            published_year: None,
            description: None,
        })
        .await
        .expect("create book")
}

fn borrow(book: &Book, user: &User) -> NewCheckout {
    let now = Utc::now();
    NewCheckout {
        book_id: book.id,
        user_id: user.id,
        borrowed_date: now,
        due_date: now + Duration::days(14),
    }
}

async fn active_count(repository: &Repository, user: &User) -> i64 {
    let filter = CheckoutFilter {
        status: Some(CheckoutStatusFilter::Borrowed),
        user_id: Some(user.id),
        book_id: None,
    };
    let (_, total) = repository
        .checkouts
        .list(&filter, PageRequest::default(), Utc::now())
        .await
        .expect("list");
    total
}

#[tokio::test]
#[ignore]
async fn test_sixth_checkout_is_refused_and_store_unchanged() {
    let (_pool, repository) = setup().await;
    let user = new_user(&repository).await;

    for i in 0..5 {
        let book = new_book(&repository, &unique(&format!("quota-{}", i))).await;
        repository.checkouts.create(&borrow(&book, &user)).await.expect("checkout");
    }

    let sixth = new_book(&repository, &unique("quota-6")).await;
    let result = repository.checkouts.create(&borrow(&sixth, &user)).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    assert_eq!(active_count(&repository, &user).await, 5);
    let book = repository.books.get_by_id(sixth.id).await.unwrap();
    assert_eq!(book.status, BookStatus::Available);
}

#[tokio::test]
#[ignore]
async fn test_unavailable_book_cannot_be_borrowed() {
    let (_pool, repository) = setup().await;
    let user = new_user(&repository).await;
    let book = new_book(&repository, &unique("maintenance")).await;
    repository
        .books
        .update_status(book.id, BookStatus::Maintenance)
        .await
        .unwrap();

    let result = repository.checkouts.create(&borrow(&book, &user)).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));
    assert_eq!(active_count(&repository, &user).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_round_trip_and_double_return() {
    let (_pool, repository) = setup().await;
    let user = new_user(&repository).await;
    let book = new_book(&repository, &unique("round-trip")).await;

    let checkout = repository.checkouts.create(&borrow(&book, &user)).await.unwrap();
    assert_eq!(checkout.status, CheckoutStatus::Borrowed);
    assert_eq!(
        repository.books.get_by_id(book.id).await.unwrap().status,
        BookStatus::Borrowed
    );

    let returned = repository
        .checkouts
        .return_checkout(checkout.id, None, Utc::now())
        .await
        .unwrap();
    assert_eq!(returned.status, CheckoutStatus::Returned);
    assert!(returned.return_date.is_some());
    assert_eq!(
        repository.books.get_by_id(book.id).await.unwrap().status,
        BookStatus::Available
    );

    let again = repository
        .checkouts
        .return_checkout(checkout.id, None, Utc::now())
        .await;
    assert!(matches!(again, Err(AppError::InvalidState(_))));

    let details = repository.checkouts.get_details(checkout.id, Utc::now()).await.unwrap();
    assert_eq!(details.return_date, returned.return_date);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_checkouts_of_one_book_serialize() {
    let (_pool, repository) = setup().await;
    let first = new_user(&repository).await;
    let second = new_user(&repository).await;
    let book = new_book(&repository, &unique("contended")).await;

    let a = borrow(&book, &first);
    let b = borrow(&book, &second);
    let (ra, rb) = tokio::join!(repository.checkouts.create(&a), repository.checkouts.create(&b));

    assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
    let filter = CheckoutFilter {
        status: Some(CheckoutStatusFilter::Borrowed),
        user_id: None,
        book_id: Some(book.id),
    };
    let (_, total) = repository
        .checkouts
        .list(&filter, PageRequest::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_blocked_while_borrowed() {
    let (_pool, repository) = setup().await;
    let user = new_user(&repository).await;
    let book = new_book(&repository, &unique("delete-blocked")).await;
    let checkout = repository.checkouts.create(&borrow(&book, &user)).await.unwrap();

    assert!(matches!(
        repository.users.soft_delete(user.id).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        repository.books.soft_delete(book.id).await,
        Err(AppError::InvalidState(_))
    ));

    repository
        .checkouts
        .return_checkout(checkout.id, None, Utc::now())
        .await
        .unwrap();
    repository.books.soft_delete(book.id).await.unwrap();
    repository.users.soft_delete(user.id).await.unwrap();

    assert!(matches!(
        repository.books.get_by_id(book.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repository.users.get_by_id(user.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_conflict() {
    let (_pool, repository) = setup().await;
    let user = new_user(&repository).await;

    let result = repository
        .users
        .create(&NewUser {
            name: "Copycat".to_string(),
            email: user.email.to_uppercase(),
            password_hash: "not-a-real-hash".to_string(),
            student_id: None,
            role: Role::User,
        })
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
#[ignore]
async fn test_overdue_lists_past_due_only_in_due_order() {
    let (_pool, repository) = setup().await;
    let user = new_user(&repository).await;
    let now = Utc::now();

    let mut ids = Vec::new();
    for days_late in [2, 9, 5] {
        let book = new_book(&repository, &unique("overdue")).await;
        let checkout = repository
            .checkouts
            .create(&NewCheckout {
                book_id: book.id,
                user_id: user.id,
                borrowed_date: now - Duration::days(30),
                due_date: now - Duration::days(days_late),
            })
            .await
            .unwrap();
        ids.push((days_late, checkout.id));
    }
    let on_time = new_book(&repository, &unique("on-time")).await;
    let on_time = repository.checkouts.create(&borrow(&on_time, &user)).await.unwrap();

    let overdue = repository.checkouts.list_overdue(Utc::now()).await.unwrap();
    let ours: Vec<i32> = overdue
        .iter()
        .filter(|c| c.user_id == user.id)
        .map(|c| c.id)
        .collect();

    ids.sort_by(|a, b| b.0.cmp(&a.0));
    let expected: Vec<i32> = ids.into_iter().map(|(_, id)| id).collect();
    assert_eq!(ours, expected);
    assert!(!ours.contains(&on_time.id));
    assert!(overdue.iter().all(|c| c.is_overdue));
}

#[tokio::test]
#[ignore]
async fn test_pagination_second_page_of_twenty_five() {
    let (_pool, repository) = setup().await;
    let tag = unique("paged");
    for i in 0..25 {
        new_book(&repository, &format!("{} volume {}", tag, i)).await;
    }

    let filter = BookFilter {
        search: Some(tag.clone()),
        status: None,
    };
    let page = PageRequest::new(Some(2), Some(10));
    let (books, total) = repository.books.search(&filter, page).await.unwrap();

    assert_eq!(books.len(), 10);
    assert_eq!(total, 25);
    assert_eq!(Pagination::new(page, total).total_pages, 3);
    // newest first: page 2 holds volumes 14 down to 5
    assert_eq!(books[0].title, format!("{} volume 14", tag));
    assert_eq!(books[9].title, format!("{} volume 5", tag));
}
