//! Database migration command.
//!
//! ```bash
//! bookstore-cli migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in the
//! storefront crate; the server also applies them at startup.

use bookstore_storefront::config::BookstoreConfig;
use bookstore_storefront::db;

use super::CommandError;

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CommandError` if configuration, connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let config = BookstoreConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
