//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, password login, admin creation, owner seeding
//! - `catalog` - Book listing, search and policy-gated mutation
//! - `cart` - Per-user cart with quantity accumulation
//! - `files` - Upload/download storage

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod files;

pub use auth::{AuthError, AuthService, OwnerSeed};
pub use cart::{CartError, CartService, CartView};
pub use catalog::{CatalogError, CatalogService};
pub use files::{FileError, FileStore};
