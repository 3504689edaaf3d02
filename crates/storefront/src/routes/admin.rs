//! Catalog management and admin account pages.
//!
//! Pages check the policy up front so forbidden users are bounced with a
//! flash message; the services check it again on every mutation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bookstore_core::{Action, BookId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{FlashLevel, RequireAuth, push_flash};
use crate::models::{BookInput, CurrentUser};
use crate::routes::PageContext;
use crate::routes::auth::CredentialsForm;
use crate::services::auth::{AuthError, AuthService};
use crate::services::catalog::{CatalogError, CatalogService};
use crate::state::AppState;

const PERMISSION_DENIED: &str = "Permission denied";

// =============================================================================
// Form Types
// =============================================================================

/// Add-book form data.
#[derive(Debug, Deserialize)]
pub struct AddBookForm {
    pub title: String,
    pub author: String,
    pub price: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub author_bio: Option<String>,
    pub category: Option<String>,
}

impl From<AddBookForm> for BookInput {
    fn from(form: AddBookForm) -> Self {
        Self {
            title: form.title,
            author: form.author,
            price: form.price,
            image_url: form.image_url,
            description: form.description,
            author_bio: form.author_bio,
            category: form.category,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Add-book page template.
#[derive(Template, WebTemplate)]
#[template(path = "add_book.html")]
pub struct AddBookTemplate {
    pub page: PageContext,
}

/// Add-admin page template.
#[derive(Template, WebTemplate)]
#[template(path = "add_admin.html")]
pub struct AddAdminTemplate {
    pub page: PageContext,
}

async fn deny(session: &Session) -> Response {
    push_flash(session, FlashLevel::Error, PERMISSION_DENIED).await;
    Redirect::to("/").into_response()
}

async fn page_for(session: &Session, user: CurrentUser, action: Action) -> Result<PageContext, Response> {
    if user.can(action) {
        Ok(PageContext::load(session, Some(user)).await)
    } else {
        Err(deny(session).await)
    }
}

// =============================================================================
// Books
// =============================================================================

/// Display the add-book form.
pub async fn add_book_page(session: Session, RequireAuth(user): RequireAuth) -> Response {
    match page_for(&session, user, Action::ManageBooks).await {
        Ok(page) => AddBookTemplate { page }.into_response(),
        Err(response) => response,
    }
}

/// Handle add-book form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_book(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddBookForm>,
) -> Result<Response, AppError> {
    let result = CatalogService::new(state.pool())
        .create(&user.identity(), form.into())
        .await;

    match result {
        Ok(book) => {
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Book '{}' added successfully", book.title),
            )
            .await;
            Ok(Redirect::to("/").into_response())
        }
        Err(CatalogError::Validation(e)) => {
            push_flash(&session, FlashLevel::Error, e.to_string()).await;
            Ok(Redirect::to("/add_book").into_response())
        }
        Err(CatalogError::PermissionDenied(_)) => Ok(deny(&session).await),
        Err(e) => Err(e.into()),
    }
}

/// Delete a book and every cart line referencing it.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn delete_book(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let result = CatalogService::new(state.pool())
        .delete(&user.identity(), BookId::new(id))
        .await;

    match result {
        Ok(book) => {
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Book '{}' has been deleted", book.title),
            )
            .await;
            Ok(Redirect::to("/").into_response())
        }
        Err(CatalogError::NotFound(_)) => {
            push_flash(&session, FlashLevel::Error, "Book not found").await;
            Ok(Redirect::to("/").into_response())
        }
        Err(CatalogError::PermissionDenied(_)) => Ok(deny(&session).await),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Admin accounts
// =============================================================================

/// Display the add-admin form.
pub async fn add_admin_page(session: Session, RequireAuth(user): RequireAuth) -> Response {
    match page_for(&session, user, Action::CreateAdmin).await {
        Ok(page) => AddAdminTemplate { page }.into_response(),
        Err(response) => response,
    }
}

/// Handle add-admin form submission.
#[instrument(skip_all, fields(user_id = %user.id, username = %form.username))]
pub async fn add_admin(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let result = AuthService::new(state.pool())
        .create_admin(&user.identity(), &form.username, &form.password)
        .await;

    match result {
        Ok(admin) => {
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Admin account '{}' created", admin.username),
            )
            .await;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::UserAlreadyExists) => {
            push_flash(&session, FlashLevel::Error, "Username already exists").await;
            Ok(Redirect::to("/add_admin").into_response())
        }
        Err(AuthError::PermissionDenied(_)) => Ok(deny(&session).await),
        Err(e) if e.is_validation() => {
            push_flash(&session, FlashLevel::Error, e.to_string()).await;
            Ok(Redirect::to("/add_admin").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
