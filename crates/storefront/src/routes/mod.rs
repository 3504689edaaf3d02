//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog (public)
//! GET  /                        - All books
//! GET  /category/{category}     - Books in one category
//! GET  /book/{id}               - Book detail
//! GET  /search_suggestions      - Title suggestions (JSON)
//!
//! # Auth
//! GET  /register, POST /register
//! GET  /login,    POST /login
//! GET  /logout,   POST /logout
//!
//! # Catalog management (admin/owner)
//! GET  /add_book, POST /add_book
//! POST /delete_book/{id}
//!
//! # Accounts (owner)
//! GET  /add_admin, POST /add_admin
//!
//! # Cart (logged in)
//! GET  /cart
//! POST /add_to_cart/{id}
//! POST /remove_from_cart/{id}
//!
//! # Files
//! POST /upload                  - Multipart upload (admin/owner, JSON)
//! GET  /download/{filename}     - Attachment download
//!
//! # JSON API
//! GET  /books                   - Book list
//! GET  /books/{id}              - Book detail
//! POST /books/add               - Create book (admin/owner)
//!
//! # Health
//! GET  /health, GET /health/ready
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod files;
pub mod health;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Session, SessionStore};

use bookstore_core::Action;

use crate::middleware::{
    Flash, create_session_layer, request_id_middleware, security_headers_middleware, take_flashes,
};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Data every full page needs: who is logged in, what they may do, and
/// pending flash messages.
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    pub can_manage_books: bool,
    pub can_create_admin: bool,
}

impl PageContext {
    /// Build the context, consuming queued flash messages.
    pub async fn load(session: &Session, user: Option<CurrentUser>) -> Self {
        let flashes = take_flashes(session).await;
        let can = |action| user.as_ref().is_some_and(|u| u.can(action));

        Self {
            can_manage_books: can(Action::ManageBooks),
            can_create_admin: can(Action::CreateAdmin),
            user,
            flashes,
        }
    }
}

/// Create the HTML page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/category/{category}", get(catalog::category))
        .route("/book/{id}", get(catalog::show))
        .route("/search_suggestions", get(catalog::search_suggestions))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/add_book", get(admin::add_book_page).post(admin::add_book))
        .route("/delete_book/{id}", post(admin::delete_book))
        .route("/add_admin", get(admin::add_admin_page).post(admin::add_admin))
        .route("/cart", get(cart::show))
        .route("/add_to_cart/{id}", post(cart::add))
        .route("/remove_from_cart/{id}", post(cart::remove))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(api::list_books))
        .route("/books/{id}", get(api::show_book))
        .route("/books/add", post(api::add_book))
}

/// Create the file routes router.
pub fn file_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(files::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download/{filename}", get(files::download))
}

/// Create all routes for the storefront.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(page_routes())
        .merge(api_routes())
        .merge(file_routes(max_upload_bytes))
}

/// Build the full application with middleware, ready to serve.
///
/// The session store is a parameter so tests can use an in-memory store.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());
    let static_dir = state.config().static_dir.clone();
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .merge(routes(max_upload_bytes))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
