//! Catalog service.
//!
//! Read operations are open to everyone. `create` and `delete` ask the
//! authorization policy first, so a denied call never reaches storage.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use bookstore_core::{Action, BookId, Identity, PermissionDenied};

use crate::db::{BookRepository, RepositoryError};
use crate::models::book::{Book, BookInput, BookValidationError, NewBook};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Submitted book fields are invalid.
    #[error(transparent)]
    Validation(#[from] BookValidationError),

    /// No book has this id.
    #[error("book {0} not found")]
    NotFound(BookId),

    /// The caller may not manage books.
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog operations over a borrowed pool.
pub struct CatalogService<'a> {
    books: BookRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            books: BookRepository::new(pool),
        }
    }

    /// Every book, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database errors.
    pub async fn list_all(&self) -> Result<Vec<Book>, CatalogError> {
        Ok(self.books.list_all().await?)
    }

    /// Books in exactly this category (case-sensitive).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database errors.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Book>, CatalogError> {
        Ok(self.books.list_by_category(category).await?)
    }

    /// Look up one book.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no book has this id.
    pub async fn find(&self, id: BookId) -> Result<Book, CatalogError> {
        self.books
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Case-insensitive title substring search, at most five results.
    ///
    /// A blank query returns nothing rather than the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database errors.
    pub async fn search_titles(&self, query: &str) -> Result<Vec<Book>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.books.search_titles(query).await?)
    }

    /// Add a book to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::PermissionDenied` unless `actor` may manage books.
    /// Returns `CatalogError::Validation` if the input is invalid.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, actor: &Identity, input: BookInput) -> Result<Book, CatalogError> {
        actor.authorize(Action::ManageBooks)?;

        let new_book = NewBook::parse(input)?;
        let book = self.books.create(&new_book).await?;

        tracing::info!(book_id = %book.id, "Added book to catalog");
        Ok(book)
    }

    /// Remove a book and every cart line that references it.
    ///
    /// Returns the removed book.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::PermissionDenied` unless `actor` may manage books.
    /// Returns `CatalogError::NotFound` if no book has this id.
    #[instrument(skip(self))]
    pub async fn delete(&self, actor: &Identity, id: BookId) -> Result<Book, CatalogError> {
        actor.authorize(Action::ManageBooks)?;

        let book = self.books.delete_cascade(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::NotFound(id),
            other => CatalogError::Repository(other),
        })?;

        tracing::info!(book_id = %id, title = %book.title, "Deleted book from catalog");
        Ok(book)
    }

    /// Number of books in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database errors.
    pub async fn count(&self) -> Result<i64, CatalogError> {
        Ok(self.books.count().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::{Price, Role, UserId};

    use super::*;
    use crate::db::{create_in_memory_pool, migrate};

    const ADMIN: Identity = Identity::User {
        id: UserId::new(1),
        role: Role::Admin,
    };

    async fn pool() -> SqlitePool {
        let pool = create_in_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn input(title: &str, price: &str) -> BookInput {
        BookInput {
            title: title.to_owned(),
            author: "Herbert".to_owned(),
            price: price.to_owned(),
            ..BookInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let pool = pool().await;
        let catalog = CatalogService::new(&pool);

        let created = catalog.create(&ADMIN, input("Dune", "15.0")).await.unwrap();
        let found = catalog.find(created.id).await.unwrap();

        assert_eq!(found.title, "Dune");
        assert_eq!(found.author, "Herbert");
        assert_eq!(found.price, Price::parse("15").unwrap());
    }

    #[tokio::test]
    async fn test_user_cannot_create() {
        let pool = pool().await;
        let catalog = CatalogService::new(&pool);
        let user = Identity::user(UserId::new(2), Role::User);

        let err = catalog.create(&user, input("Dune", "15")).await.unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_denial_checked_before_validation() {
        let pool = pool().await;
        let catalog = CatalogService::new(&pool);

        let err = catalog
            .create(&Identity::Anonymous, input("", "-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_price() {
        let pool = pool().await;
        let catalog = CatalogService::new(&pool);

        let err = catalog.create(&ADMIN, input("Dune", "-1")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let pool = pool().await;
        let catalog = CatalogService::new(&pool);

        let err = catalog.delete(&ADMIN, BookId::new(7)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id == BookId::new(7)));
    }

    #[tokio::test]
    async fn test_search_limits_and_blank_query() {
        let pool = pool().await;
        let catalog = CatalogService::new(&pool);

        for i in 0..7 {
            catalog
                .create(&ADMIN, input(&format!("The Abc Chronicles {i}"), "1"))
                .await
                .unwrap();
        }

        assert_eq!(catalog.search_titles("abc").await.unwrap().len(), 5);
        assert!(catalog.search_titles("").await.unwrap().is_empty());
        assert!(catalog.search_titles("   ").await.unwrap().is_empty());
        assert!(catalog.search_titles("zz").await.unwrap().is_empty());
    }
}
