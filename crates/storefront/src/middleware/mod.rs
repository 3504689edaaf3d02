//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (unique id per request)
//! 4. Security headers
//! 5. Session layer (tower-sessions with `SQLite` store)
//!
//! Extractors in [`auth`] read the session; [`flash`] queues one-shot messages.

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, end_session, establish_session};
pub use flash::{Flash, FlashLevel, push_flash, take_flashes};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, create_session_store};
