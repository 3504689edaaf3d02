//! Book domain types.

use serde::Serialize;
use thiserror::Error;

use bookstore_core::{BookId, Price, PriceError};

/// Image used when a book is created without one.
pub const DEFAULT_IMAGE_URL: &str = "images/default_book.jpg";

/// Category assigned to books created through the JSON API without one.
pub const DEFAULT_API_CATEGORY: &str = "Uncategorized";

const MAX_TITLE_LENGTH: usize = 200;
const MAX_AUTHOR_LENGTH: usize = 100;
const MAX_CATEGORY_LENGTH: usize = 50;
const MAX_IMAGE_URL_LENGTH: usize = 200;

/// A book in the catalog (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: Price,
    pub image_url: String,
    pub description: Option<String>,
    pub author_bio: Option<String>,
    pub category: Option<String>,
}

impl Book {
    /// URL for the cover image as used in an `<img src>`.
    #[must_use]
    pub fn image_src(&self) -> String {
        image_src(&self.image_url)
    }
}

/// Resolve a stored image reference: absolute URLs pass through, anything
/// else is a path under `/static`.
#[must_use]
pub fn image_src(image_url: &str) -> String {
    if image_url.starts_with("http://") || image_url.starts_with("https://") {
        image_url.to_owned()
    } else {
        format!("/static/{}", image_url.trim_start_matches('/'))
    }
}

/// Raw, unvalidated book fields as submitted by a form or API client.
#[derive(Debug, Clone, Default)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub price: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub author_bio: Option<String>,
    pub category: Option<String>,
}

/// Reasons a [`BookInput`] is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("author is required")]
    MissingAuthor,

    #[error("{0}")]
    Price(#[from] PriceError),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// A validated book ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Price,
    pub image_url: String,
    pub description: Option<String>,
    pub author_bio: Option<String>,
    pub category: Option<String>,
}

impl NewBook {
    /// Validate raw input.
    ///
    /// Title and author are trimmed and must be non-empty. Blank optional
    /// fields become `None`; a blank image becomes [`DEFAULT_IMAGE_URL`].
    /// Category is kept verbatim (apart from blank handling) because catalog
    /// filtering matches it exactly.
    ///
    /// # Errors
    ///
    /// Returns `BookValidationError` describing the first invalid field.
    pub fn parse(input: BookInput) -> Result<Self, BookValidationError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(BookValidationError::MissingTitle);
        }
        check_length("title", title, MAX_TITLE_LENGTH)?;

        let author = input.author.trim();
        if author.is_empty() {
            return Err(BookValidationError::MissingAuthor);
        }
        check_length("author", author, MAX_AUTHOR_LENGTH)?;

        let price = Price::parse(&input.price)?;

        let image_url = non_blank(input.image_url)
            .map_or_else(|| DEFAULT_IMAGE_URL.to_owned(), |url| url.trim().to_owned());
        check_length("image_url", &image_url, MAX_IMAGE_URL_LENGTH)?;

        let category = non_blank(input.category);
        if let Some(category) = &category {
            check_length("category", category, MAX_CATEGORY_LENGTH)?;
        }

        Ok(Self {
            title: title.to_owned(),
            author: author.to_owned(),
            price,
            image_url,
            description: non_blank(input.description),
            author_bio: non_blank(input.author_bio),
            category,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), BookValidationError> {
    if value.chars().count() > max {
        return Err(BookValidationError::TooLong { field, max });
    }
    Ok(())
}
