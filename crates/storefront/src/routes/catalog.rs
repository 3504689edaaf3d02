//! Public catalog pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bookstore_core::BookId;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Book;
use crate::routes::PageContext;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Book grid used by the home and category pages.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub heading: String,
    pub books: Vec<Book>,
}

/// Book detail page.
#[derive(Template, WebTemplate)]
#[template(path = "book_detail.html")]
pub struct BookDetailTemplate {
    pub page: PageContext,
    pub book: Book,
}

/// One search suggestion.
#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub id: BookId,
    pub title: String,
}

/// Query parameters for `/search_suggestions`.
#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub query: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// All books.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<IndexTemplate, AppError> {
    let books = CatalogService::new(state.pool()).list_all().await?;

    Ok(IndexTemplate {
        page: PageContext::load(&session, user).await,
        heading: "All Books".to_owned(),
        books,
    })
}

/// Books in one category; the match is exact, only the heading is capitalized.
#[instrument(skip(state, session, user))]
pub async fn category(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(category): Path<String>,
) -> Result<IndexTemplate, AppError> {
    let books = CatalogService::new(state.pool())
        .list_by_category(&category)
        .await?;

    Ok(IndexTemplate {
        page: PageContext::load(&session, user).await,
        heading: capitalize(&category),
        books,
    })
}

/// Book detail page; 404 if the id does not resolve.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i64>,
) -> Result<BookDetailTemplate, AppError> {
    let book = CatalogService::new(state.pool())
        .find(BookId::new(id))
        .await?;

    Ok(BookDetailTemplate {
        page: PageContext::load(&session, user).await,
        book,
    })
}

/// Up to five `{id, title}` pairs whose title contains the query.
#[instrument(skip(state))]
pub async fn search_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let books = CatalogService::new(state.pool())
        .search_titles(&query.query)
        .await?;

    Ok(Json(
        books
            .into_iter()
            .map(|book| Suggestion {
                id: book.id,
                title: book.title,
            })
            .collect(),
    ))
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("fiction"), "Fiction");
        assert_eq!(capitalize("SCI-FI"), "Sci-fi");
        assert_eq!(capitalize(""), "");
    }
}
