//! Book and genre operations on top of the record store.
//!
//! Validation happens here so every entry point (HTTP, seeding, CLI) sees the
//! same rules. Genres are resolved by name, case-insensitively, and created on
//! first use. Removing a genre never touches the books that reference it.

use std::sync::Arc;

use serde_json::json;
use shelf_db::{MemoryTable, StoreError, Table};
use shelf_http::error::{AppError, FieldError};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{Book, BookPatch, Genre, GenreField, NewBook, ReadingStatus};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("book '{0}' not found")]
    BookNotFound(String),

    #[error("genre '{0}' not found")]
    GenreNotFound(String),

    /// Carries the name already on record.
    #[error("genre '{0}' already exists")]
    GenreExists(String),

    #[error("invalid {subject}")]
    Invalid {
        subject: &'static str,
        fields: Vec<FieldError>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::BookNotFound(_) | CatalogError::GenreNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            CatalogError::GenreExists(ref existing) => {
                AppError::conflict(vec![json!({ "name": existing })], err.to_string())
            }
            CatalogError::Invalid {
                subject,
                ref fields,
            } => AppError::invalid_fields(fields, format!("{subject} is invalid")),
            CatalogError::Store(store) => AppError::Internal(store.into()),
        }
    }
}

/// Books and genres held by the record store.
pub struct Catalog {
    books: Arc<dyn Table<Book>>,
    genres: Arc<dyn Table<Genre>>,
    // Serializes resolve-or-create so one name never yields two genres.
    genre_guard: Mutex<()>,
}

impl Catalog {
    pub fn new(books: Arc<dyn Table<Book>>, genres: Arc<dyn Table<Genre>>) -> Self {
        Self {
            books,
            genres,
            genre_guard: Mutex::new(()),
        }
    }

    /// Catalog over fresh in-memory tables.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryTable::new("books")),
            Arc::new(MemoryTable::new("genres")),
        )
    }

    /// All books in insertion order.
    pub async fn list(&self) -> Vec<Book> {
        self.books.list().await
    }

    pub async fn len(&self) -> usize {
        self.books.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.books.is_empty().await
    }

    pub async fn get(&self, id: &str) -> CatalogResult<Book> {
        self.books.get(id).await.map_err(not_found_as_book)
    }

    /// Create a book from user input; the id is assigned here.
    pub async fn create(&self, input: NewBook) -> CatalogResult<Book> {
        let mut errors = Vec::new();
        let now = OffsetDateTime::now_utc();

        let mut book = Book::new(Uuid::now_v7().to_string(), input.title, input.author);
        book.cover_url = input.cover_url.unwrap_or_default();
        book.year = convert_year(input.year, &mut errors);
        book.pages = convert_pages(input.pages, &mut errors);
        book.current_page = convert_current_page(input.current_page, &mut errors).or(Some(0));
        book.rating = convert_rating(input.rating, &mut errors);
        book.synopsis = input.synopsis;
        book.isbn = input.isbn;
        book.notes = input.notes;
        book.status = convert_status(input.status.as_deref(), &mut errors)
            .or(Some(ReadingStatus::default()));
        book.created_at = now;
        book.updated_at = now;

        errors.extend(validate_book(&book));
        if !errors.is_empty() {
            return Err(CatalogError::Invalid {
                subject: "book",
                fields: errors,
            });
        }

        book.genre = self.resolve_genre(input.genre.as_ref()).await?;
        let created = self.books.insert(book).await?;
        tracing::info!(book_id = %created.id, title = %created.title, "book created");
        Ok(created)
    }

    /// Insert a fully-formed book keeping its id, e.g. from a seed file.
    pub async fn import(&self, mut book: Book) -> CatalogResult<Book> {
        let errors = validate_book(&book);
        if !errors.is_empty() {
            return Err(CatalogError::Invalid {
                subject: "book",
                fields: errors,
            });
        }

        book.genre = self.resolve_genre(book.genre.as_ref()).await?;
        Ok(self.books.insert(book).await?)
    }

    /// Apply a partial update; the merged record must still be valid.
    pub async fn update(&self, id: &str, patch: BookPatch) -> CatalogResult<Book> {
        let mut book = self.get(id).await?;
        let mut errors = Vec::new();

        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(cover_url) = patch.cover_url {
            book.cover_url = cover_url;
        }
        if let Some(year) = patch.year {
            book.year = convert_year(year, &mut errors);
        }
        if let Some(pages) = patch.pages {
            book.pages = convert_pages(pages, &mut errors);
        }
        if let Some(current_page) = patch.current_page {
            book.current_page = convert_current_page(current_page, &mut errors);
        }
        if let Some(rating) = patch.rating {
            book.rating = convert_rating(rating, &mut errors);
        }
        if let Some(synopsis) = patch.synopsis {
            book.synopsis = synopsis;
        }
        if let Some(isbn) = patch.isbn {
            book.isbn = isbn;
        }
        if let Some(notes) = patch.notes {
            book.notes = notes;
        }
        if let Some(status) = patch.status {
            book.status = convert_status(status.as_deref(), &mut errors);
        }

        errors.extend(validate_book(&book));
        if !errors.is_empty() {
            return Err(CatalogError::Invalid {
                subject: "book",
                fields: errors,
            });
        }

        if let Some(genre) = patch.genre {
            book.genre = self.resolve_genre(genre.as_ref()).await?;
        }
        book.updated_at = OffsetDateTime::now_utc();

        let updated = self
            .books
            .replace(id, book)
            .await
            .map_err(not_found_as_book)?;
        tracing::info!(book_id = %updated.id, "book updated");
        Ok(updated)
    }

    /// Remove a book for good and return it.
    pub async fn delete(&self, id: &str) -> CatalogResult<Book> {
        let removed = self.books.remove(id).await.map_err(not_found_as_book)?;
        tracing::info!(book_id = %removed.id, title = %removed.title, "book deleted");
        Ok(removed)
    }

    /// Genre names, alphabetically.
    pub async fn list_genres(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .genres
            .list()
            .await
            .into_iter()
            .map(|genre| genre.name)
            .collect();
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        names
    }

    pub async fn create_genre(&self, name: &str) -> CatalogResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::Invalid {
                subject: "genre",
                fields: vec![FieldError::new("name", "required")],
            });
        }

        let _guard = self.genre_guard.lock().await;
        if let Some(existing) = self.find_genre(name).await {
            return Err(CatalogError::GenreExists(existing.name));
        }

        let genre = self.genres.insert(new_genre(name)).await?;
        tracing::info!(genre_id = %genre.id, name = %genre.name, "genre created");
        Ok(genre.name)
    }

    /// Remove a genre by name (case-insensitive). Books keep their embedded reference.
    pub async fn delete_genre(&self, name: &str) -> CatalogResult<String> {
        let _guard = self.genre_guard.lock().await;
        let genre = self
            .find_genre(name.trim())
            .await
            .ok_or_else(|| CatalogError::GenreNotFound(name.to_string()))?;

        let removed = self.genres.remove(&genre.id).await?;
        tracing::info!(genre_id = %removed.id, name = %removed.name, "genre deleted");
        Ok(removed.name)
    }

    async fn find_genre(&self, name: &str) -> Option<Genre> {
        let wanted = name.to_lowercase();
        self.genres
            .find(&move |genre: &Genre| genre.name.to_lowercase() == wanted)
            .await
    }

    /// Turn whatever genre the caller sent into a stored reference.
    async fn resolve_genre(&self, genre: Option<&GenreField>) -> CatalogResult<Option<GenreField>> {
        let Some(name) = genre.map(|g| g.display_name().trim()) else {
            return Ok(None);
        };
        if name.is_empty() {
            return Ok(None);
        }

        let _guard = self.genre_guard.lock().await;
        let genre = match self.find_genre(name).await {
            Some(existing) => existing,
            None => {
                let created = self.genres.insert(new_genre(name)).await?;
                tracing::info!(genre_id = %created.id, name = %created.name, "genre created on first use");
                created
            }
        };

        Ok(Some(GenreField::Record(genre.reference())))
    }
}

fn new_genre(name: &str) -> Genre {
    Genre {
        id: Uuid::now_v7().to_string(),
        name: name.to_string(),
    }
}

fn not_found_as_book(err: StoreError) -> CatalogError {
    match err {
        StoreError::NotFound { id, .. } => CatalogError::BookNotFound(id),
        other => CatalogError::Store(other),
    }
}

/// Invariants every stored book satisfies.
pub fn validate_book(book: &Book) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if book.title.trim().is_empty() {
        errors.push(FieldError::new("title", "required"));
    }
    if book.author.trim().is_empty() {
        errors.push(FieldError::new("author", "required"));
    }
    if let Some(rating) = book.rating {
        if !(1..=5).contains(&rating) {
            errors.push(FieldError::new("rating", "must be between 1 and 5"));
        }
    }
    if book.pages == Some(0) {
        errors.push(FieldError::new("pages", "must be positive"));
    }
    if let (Some(current), Some(pages)) = (book.current_page, book.pages) {
        if current > pages {
            errors.push(FieldError::new(
                "currentPage",
                format!("must not exceed pages ({pages})"),
            ));
        }
    }

    errors
}

fn convert_year(year: Option<i64>, errors: &mut Vec<FieldError>) -> Option<i32> {
    let year = year?;
    match i32::try_from(year) {
        Ok(year) => Some(year),
        Err(_) => {
            errors.push(FieldError::new("year", "out of range"));
            None
        }
    }
}

fn convert_pages(pages: Option<i64>, errors: &mut Vec<FieldError>) -> Option<u32> {
    let pages = pages?;
    match u32::try_from(pages) {
        Ok(pages) if pages > 0 => Some(pages),
        _ => {
            errors.push(FieldError::new("pages", "must be positive"));
            None
        }
    }
}

fn convert_current_page(current: Option<i64>, errors: &mut Vec<FieldError>) -> Option<u32> {
    let current = current?;
    match u32::try_from(current) {
        Ok(current) => Some(current),
        Err(_) => {
            errors.push(FieldError::new("currentPage", "must not be negative"));
            None
        }
    }
}

fn convert_rating(rating: Option<i64>, errors: &mut Vec<FieldError>) -> Option<u8> {
    let rating = rating?;
    if (1..=5).contains(&rating) {
        Some(rating as u8)
    } else {
        errors.push(FieldError::new("rating", "must be between 1 and 5"));
        None
    }
}

fn convert_status(status: Option<&str>, errors: &mut Vec<FieldError>) -> Option<ReadingStatus> {
    let status = status?;
    if status.trim().is_empty() {
        return None;
    }
    match status.parse() {
        Ok(status) => Some(status),
        Err(err) => {
            errors.push(FieldError::new("status", err.to_string()));
            None
        }
    }
}
