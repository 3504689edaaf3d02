//! Domain models for the storefront.
//!
//! Validated domain types, kept separate from the database row types in
//! [`crate::db`].

pub mod book;
pub mod cart;
pub mod session;
pub mod user;

pub use book::{Book, BookInput, BookValidationError, NewBook};
pub use cart::{CartItem, CartLine};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
