//! Cart route handlers.
//!
//! The cart always belongs to the logged-in user; item ids in the URL are
//! checked against that user by the cart service.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use bookstore_core::{BookId, CartItemId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{FlashLevel, RequireAuth, push_flash};
use crate::routes::PageContext;
use crate::services::cart::{CartError, CartService, CartView};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Display the cart with its live total.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<CartTemplate, AppError> {
    let cart = CartService::new(state.pool()).view_for_user(user.id).await?;

    Ok(CartTemplate {
        page: PageContext::load(&session, Some(user)).await,
        cart,
    })
}

/// Add one copy of a book to the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(book_id): Path<i64>,
) -> Result<Redirect, AppError> {
    match CartService::new(state.pool())
        .add(user.id, BookId::new(book_id))
        .await
    {
        Ok(_) => {
            push_flash(&session, FlashLevel::Success, "Book added to cart").await;
            Ok(Redirect::to("/cart"))
        }
        Err(CartError::NotFound) => {
            push_flash(&session, FlashLevel::Error, "Book not found").await;
            Ok(Redirect::to("/"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove an item from the caller's cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let (level, message) = match CartService::new(state.pool())
        .remove(CartItemId::new(item_id), user.id)
        .await
    {
        Ok(()) => (FlashLevel::Success, "Book removed from cart"),
        Err(CartError::NotFound) => (FlashLevel::Error, "Cart item not found"),
        Err(CartError::PermissionDenied) => (
            FlashLevel::Error,
            "You do not have permission to delete this item",
        ),
        Err(e) => return Err(e.into()),
    };

    push_flash(&session, level, message).await;
    Ok(Redirect::to("/cart"))
}
