//! Cart repository for database operations.
//!
//! Each (user, book) pair has at most one row; repeated adds bump its
//! quantity inside a single upsert statement, so concurrent adds neither
//! duplicate rows nor lose increments.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use bookstore_core::{BookId, CartItemId, Price, UserId};

use super::RepositoryError;
use crate::models::book::DEFAULT_IMAGE_URL;
use crate::models::cart::{CartItem, CartLine};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `cart_items` queries.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    user_id: i64,
    book_id: i64,
    quantity: i64,
    date_added: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CartItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            book_id: BookId::new(row.book_id),
            quantity: quantity_from_db(row.id, row.quantity)?,
            date_added: row.date_added,
        })
    }
}

/// Internal row type for the cart/book join.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i64,
    book_id: i64,
    title: String,
    author: String,
    image_url: Option<String>,
    price: String,
    quantity: i64,
    date_added: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let unit_price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for book {}: {e}", row.book_id))
        })?;

        Ok(Self {
            id: CartItemId::new(row.id),
            book_id: BookId::new(row.book_id),
            title: row.title,
            author: row.author,
            image_url: row.image_url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_owned()),
            unit_price,
            quantity: quantity_from_db(row.id, row.quantity)?,
            date_added: row.date_added,
        })
    }
}

fn quantity_from_db(id: i64, quantity: i64) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("invalid quantity {quantity} for cart item {id}"))
        })
}

/// Result of a scoped delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The row existed, belonged to the requester and is gone.
    Removed,
    /// No row has this id.
    NotFound,
    /// The row belongs to another user and was left untouched.
    NotOwner,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// A user's cart joined with live book data, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.id, c.book_id, b.title, b.author, b.image_url, b.price,
                   c.quantity, c.date_added
            FROM cart_items c
            JOIN books b ON b.id = c.book_id
            WHERE c.user_id = ?
            ORDER BY c.date_added, c.id
            ",
        )
        .bind(user_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Add one copy of a book to a user's cart.
    ///
    /// Inserts a row with quantity 1, or increments the existing row for the
    /// same (user, book). The book lookup, insert and increment happen in one
    /// statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book (or user) does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(&self, user_id: UserId, book_id: BookId) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (user_id, book_id, quantity, date_added)
            SELECT ?, id, 1, ? FROM books WHERE id = ?
            ON CONFLICT (user_id, book_id) DO UPDATE SET quantity = quantity + 1
            RETURNING id, user_id, book_id, quantity, date_added
            ",
        )
        .bind(user_id.as_i64())
        .bind(Utc::now())
        .bind(book_id.as_i64())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Get a single cart row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, user_id, book_id, quantity, date_added FROM cart_items WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a cart row only if it belongs to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove_owned(
        &self,
        id: CartItemId,
        owner: UserId,
    ) -> Result<RemoveOutcome, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM cart_items WHERE id = ? AND user_id = ?")
            .bind(id.as_i64())
            .bind(owner.as_i64())
            .execute(self.pool)
            .await?
            .rows_affected();

        if deleted > 0 {
            return Ok(RemoveOutcome::Removed);
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM cart_items WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?
            .is_some();

        Ok(if exists {
            RemoveOutcome::NotOwner
        } else {
            RemoveOutcome::NotFound
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::{Role, Username};

    use super::*;
    use crate::db::{BookRepository, UserRepository, create_in_memory_pool, migrate};
    use crate::models::book::{BookInput, NewBook};

    async fn setup() -> (SqlitePool, UserId, BookId) {
        let pool = create_in_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();

        let user = UserRepository::new(&pool)
            .create(&Username::parse("alice").unwrap(), "h", Role::User)
            .await
            .unwrap();
        let book = BookRepository::new(&pool)
            .create(
                &NewBook::parse(BookInput {
                    title: "Dune".to_owned(),
                    author: "Herbert".to_owned(),
                    price: "15.0".to_owned(),
                    ..BookInput::default()
                })
                .unwrap(),
            )
            .await
            .unwrap();

        (pool, user.id, book.id)
    }

    #[tokio::test]
    async fn test_add_twice_increments() {
        let (pool, user, book) = setup().await;
        let repo = CartRepository::new(&pool);

        let first = repo.add(user, book).await.unwrap();
        let second = repo.add(user, book).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.quantity, 1);
        assert_eq!(second.quantity, 2);
        assert_eq!(repo.list_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_missing_book() {
        let (pool, user, _) = setup().await;
        let repo = CartRepository::new(&pool);

        let err = repo.add(user, BookId::new(404)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_remove_owned_outcomes() {
        let (pool, user, book) = setup().await;
        let repo = CartRepository::new(&pool);
        let item = repo.add(user, book).await.unwrap();

        assert_eq!(
            repo.remove_owned(item.id, UserId::new(user.as_i64() + 1)).await.unwrap(),
            RemoveOutcome::NotOwner
        );
        assert!(repo.get(item.id).await.unwrap().is_some());

        assert_eq!(repo.remove_owned(item.id, user).await.unwrap(), RemoveOutcome::Removed);
        assert_eq!(repo.remove_owned(item.id, user).await.unwrap(), RemoveOutcome::NotFound);
    }
}
