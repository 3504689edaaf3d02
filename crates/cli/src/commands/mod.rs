//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod owner;

use sqlx::SqlitePool;
use thiserror::Error;

use bookstore_storefront::config::{BookstoreConfig, ConfigError};
use bookstore_storefront::db::{self, RepositoryError};
use bookstore_storefront::services::auth::AuthError;

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("No owner account exists; run `bookstore-cli owner ensure` first")]
    MissingOwner,
}

/// Load configuration and open a migrated pool.
pub(crate) async fn connect() -> Result<(BookstoreConfig, SqlitePool), CommandError> {
    let config = BookstoreConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    db::migrate(&pool).await?;

    Ok((config, pool))
}
