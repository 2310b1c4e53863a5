//! Book catalog service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{normalize_isbn, Book, BookFilter, BookStatus, CreateBook, UpdateBook},
        pagination::PageRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with pagination
    pub async fn search_books(
        &self,
        filter: &BookFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(filter, page).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book; new books start `available`
    pub async fn create_book(&self, mut book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        book.isbn = normalize_isbn(book.isbn);
        if let Some(ref isbn) = book.isbn {
            if self.repository.books.isbn_exists(isbn, None).await? {
                return Err(AppError::Conflict(format!(
                    "A book with ISBN {} already exists",
                    isbn
                )));
            }
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, "Book created");
        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i32, update: UpdateBook) -> AppResult<Book> {
        update.validate()?;

        let mut book = self.repository.books.get_by_id(id).await?;

        if update.isbn.is_some() {
            let isbn = normalize_isbn(update.isbn);
            if let Some(ref value) = isbn {
                if book.isbn.as_ref() != Some(value)
                    && self.repository.books.isbn_exists(value, Some(id)).await?
                {
                    return Err(AppError::Conflict(format!(
                        "A book with ISBN {} already exists",
                        value
                    )));
                }
            }
            book.isbn = isbn;
        }

        if let Some(title) = update.title {
            book.title = title;
        }
        if let Some(author) = update.author {
            book.author = author;
        }
        if let Some(publisher) = update.publisher {
            book.publisher = Some(publisher).filter(|p| !p.is_empty());
        }
        if let Some(year) = update.published_year {
            book.published_year = Some(year);
        }
        if let Some(description) = update.description {
            book.description = Some(description).filter(|d| !d.is_empty());
        }

        self.repository.books.update(&book).await
    }

    /// Set a book's status directly (maintenance and back)
    pub async fn update_status(&self, id: i32, status: BookStatus) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .update_status(id, status)
            .await
            .inspect_err(|e| tracing::warn!(book_id = id, "Status change refused: {}", e))?;
        tracing::info!(book_id = id, status = %status, "Book status changed");
        Ok(book)
    }

    /// Soft delete a book that is not out
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository
            .books
            .soft_delete(id)
            .await
            .inspect_err(|e| tracing::warn!(book_id = id, "Book deletion refused: {}", e))?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
