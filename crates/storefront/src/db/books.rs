//! Book repository for catalog database operations.

use sqlx::SqlitePool;

use bookstore_core::{BookId, Price};

use super::RepositoryError;
use crate::models::book::{Book, NewBook};

/// Maximum number of rows returned by [`BookRepository::search_titles`].
pub const SEARCH_SUGGESTION_LIMIT: i64 = 5;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for book queries.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    price: String,
    image_url: Option<String>,
    description: Option<String>,
    author_bio: Option<String>,
    category: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for book {}: {e}", row.id))
        })?;

        Ok(Self {
            id: BookId::new(row.id),
            title: row.title,
            author: row.author,
            price,
            image_url: row
                .image_url
                .unwrap_or_else(|| crate::models::book::DEFAULT_IMAGE_URL.to_owned()),
            description: row.description,
            author_bio: row.author_bio,
            category: row.category,
        })
    }
}

const SELECT_BOOK: &str =
    "SELECT id, title, author, price, image_url, description, author_bio, category FROM books";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct BookRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List every book, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOK} ORDER BY id"))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List books whose category equals `category` exactly (case-sensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Book>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOK} WHERE category = ? ORDER BY id"))
                .bind(category)
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOK} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Books whose title contains `query`, ignoring case, at most
    /// [`SEARCH_SUGGESTION_LIMIT`] rows ordered by id.
    ///
    /// `instr` is used instead of `LIKE` so `%` and `_` in the query match
    /// literally.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn search_titles(&self, query: &str) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "{SELECT_BOOK} WHERE instr(lower(title), lower(?)) > 0 ORDER BY id LIMIT ?"
        ))
        .bind(query)
        .bind(SEARCH_SUGGESTION_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a validated book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, book: &NewBook) -> Result<Book, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(
            r"
            INSERT INTO books (title, author, price, image_url, description, author_bio, category)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, author, price, image_url, description, author_bio, category
            ",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price.to_storage_string())
        .bind(&book.image_url)
        .bind(book.description.as_deref())
        .bind(book.author_bio.as_deref())
        .bind(book.category.as_deref())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Delete a book and every cart line referencing it in one transaction.
    ///
    /// Returns the deleted book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no book has this id; nothing is
    /// changed in that case.
    /// Returns `RepositoryError::Database` if any statement fails, after
    /// rolling back.
    pub async fn delete_cascade(&self, id: BookId) -> Result<Book, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed_lines = sqlx::query("DELETE FROM cart_items WHERE book_id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let row = sqlx::query_as::<_, BookRow>(
            r"
            DELETE FROM books WHERE id = ?
            RETURNING id, title, author, price, image_url, description, author_bio, category
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` without commit rolls back the cart deletion.
        let row = row.ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        tracing::debug!(book_id = %id, removed_lines, "Deleted book and its cart lines");

        row.try_into()
    }

    /// Number of books in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
