//! Bookstore Core - Shared types library.
//!
//! This crate provides common types used across all bookstore components:
//! - `storefront` - The web application (catalog, cart, accounts)
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, usernames and roles
//! - [`policy`] - The role/action authorization table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod policy;
pub mod types;

pub use policy::{Action, Identity, PermissionDenied};
pub use types::*;
