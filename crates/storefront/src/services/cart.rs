//! Cart service.
//!
//! Every operation is scoped to the calling user's own cart. Totals are
//! computed from live catalog prices at read time.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use bookstore_core::{BookId, CartItemId, UserId};

use crate::db::cart::RemoveOutcome;
use crate::db::{CartRepository, RepositoryError};
use crate::models::cart::{CartItem, CartLine, cart_total};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The book or cart item does not exist.
    #[error("not found")]
    NotFound,

    /// The cart item belongs to another user.
    #[error("cart item belongs to another user")]
    PermissionDenied,

    /// The cart total does not fit in a `Decimal`.
    #[error("cart total overflows")]
    TotalOverflow,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A user's cart as rendered on the cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    /// Sum of quantities.
    pub item_count: u32,
}

impl CartView {
    fn from_lines(lines: Vec<CartLine>) -> Result<Self, CartError> {
        let total = cart_total(&lines).ok_or(CartError::TotalOverflow)?;
        let item_count = lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity));
        Ok(Self {
            lines,
            total,
            item_count,
        })
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart operations over a borrowed pool.
pub struct CartService<'a> {
    cart: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            cart: CartRepository::new(pool),
        }
    }

    /// The user's cart lines, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database errors.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
        Ok(self.cart.list_for_user(user_id).await?)
    }

    /// Sum of `price * quantity` over the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database errors.
    /// Returns `CartError::TotalOverflow` if the sum does not fit in a `Decimal`.
    pub async fn total_for_user(&self, user_id: UserId) -> Result<Decimal, CartError> {
        let lines = self.cart.list_for_user(user_id).await?;
        cart_total(&lines).ok_or(CartError::TotalOverflow)
    }

    /// Lines, total and item count from a single read.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database errors.
    /// Returns `CartError::TotalOverflow` if the sum does not fit in a `Decimal`.
    pub async fn view_for_user(&self, user_id: UserId) -> Result<CartView, CartError> {
        let lines = self.cart.list_for_user(user_id).await?;
        CartView::from_lines(lines)
    }

    /// Add one copy of a book, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the book does not exist.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: UserId, book_id: BookId) -> Result<CartItem, CartError> {
        let item = self.cart.add(user_id, book_id).await.map_err(|e| match e {
            RepositoryError::NotFound => CartError::NotFound,
            other => CartError::Repository(other),
        })?;

        tracing::debug!(cart_item_id = %item.id, quantity = item.quantity, "Added to cart");
        Ok(item)
    }

    /// Remove a line from the requesting user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the item does not exist.
    /// Returns `CartError::PermissionDenied` if it belongs to someone else;
    /// nothing is changed in that case.
    #[instrument(skip(self))]
    pub async fn remove(&self, item_id: CartItemId, requester: UserId) -> Result<(), CartError> {
        match self.cart.remove_owned(item_id, requester).await? {
            RemoveOutcome::Removed => Ok(()),
            RemoveOutcome::NotFound => Err(CartError::NotFound),
            RemoveOutcome::NotOwner => {
                tracing::warn!("Refused to remove another user's cart item");
                Err(CartError::PermissionDenied)
            }
        }
    }
}
