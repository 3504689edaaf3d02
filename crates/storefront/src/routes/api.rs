//! JSON catalog API.
//!
//! Mirrors the HTML catalog views. Prices are JSON numbers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, Price};

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::book::{Book, BookInput, DEFAULT_API_CATEGORY};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Book as listed by `GET /books`.
#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: Price,
    pub category: Option<String>,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
            category: book.category,
        }
    }
}

/// Book as returned by `GET /books/{id}`.
#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: Price,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl From<Book> for BookDetail {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
            description: book.description,
            category: book.category,
        }
    }
}

/// A price given either as a JSON number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(serde_json::Number),
    Text(String),
}

impl PriceField {
    fn into_raw(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Body of `POST /books/add`. Missing required fields surface as validation
/// errors from the catalog rather than as deserialization failures.
#[derive(Debug, Deserialize)]
pub struct NewBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub price: Option<PriceField>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl From<NewBookRequest> for BookInput {
    fn from(req: NewBookRequest) -> Self {
        let category = req
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_CATEGORY.to_owned());

        Self {
            title: req.title,
            author: req.author,
            price: req.price.map(PriceField::into_raw).unwrap_or_default(),
            description: req.description,
            category: Some(category),
            ..Self::default()
        }
    }
}

/// Response of `POST /books/add`.
#[derive(Debug, Serialize)]
pub struct Created {
    pub message: &'static str,
    pub id: BookId,
}

/// List every book.
#[instrument(skip_all)]
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<BookSummary>>, AppError> {
    let books = CatalogService::new(state.pool()).list_all().await?;
    Ok(Json(books.into_iter().map(BookSummary::from).collect()))
}

/// One book; 404 if missing.
#[instrument(skip(state))]
pub async fn show_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookDetail>, AppError> {
    let book = CatalogService::new(state.pool())
        .find(BookId::new(id))
        .await?;
    Ok(Json(book.into()))
}

/// Create a book (admin/owner).
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_book(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<NewBookRequest>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let book = CatalogService::new(state.pool())
        .create(&user.identity(), request.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Book added successfully",
            id: book.id,
        }),
    ))
}
