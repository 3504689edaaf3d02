//! Admin account command.
//!
//! ```bash
//! bookstore-cli admin create -u alice -p 'correct horse battery'
//! ```
//!
//! The account is created on behalf of the owner, so the same policy check
//! as the `/add_admin` page applies.

use bookstore_storefront::db::users::UserRepository;
use bookstore_storefront::services::auth::AuthService;

use super::{CommandError, connect};

/// Create a new admin account.
///
/// # Errors
///
/// Returns `CommandError::MissingOwner` if no owner exists yet, or
/// `CommandError::Auth` if the username is invalid or taken.
pub async fn create(username: &str, password: &str) -> Result<(), CommandError> {
    let (_config, pool) = connect().await?;

    let owner = UserRepository::new(&pool)
        .get_owner()
        .await?
        .ok_or(CommandError::MissingOwner)?;

    tracing::info!("Creating admin user: {}", username);
    let admin = AuthService::new(&pool)
        .create_admin(&owner.identity(), username, password)
        .await?;

    tracing::info!(user_id = %admin.id, "Admin user created: {}", admin.username);
    Ok(())
}
