//! Owner account command.
//!
//! ```bash
//! BOOKSTORE_OWNER_PASSWORD='...' bookstore-cli owner ensure
//! ```

use secrecy::ExposeSecret;

use bookstore_storefront::services::auth::{AuthService, OwnerSeed};

use super::{CommandError, connect};

/// Create the configured owner account unless one already exists.
///
/// A generated password is printed once to stdout.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or account
/// creation fails.
pub async fn ensure() -> Result<(), CommandError> {
    let (config, pool) = connect().await?;

    let seed = AuthService::new(&pool)
        .ensure_owner_exists(&config.owner.username, config.owner.password.as_ref())
        .await?;

    match seed {
        OwnerSeed::Created {
            user,
            generated_password,
        } => {
            tracing::info!(user_id = %user.id, "Owner account created: {}", user.username);
            if let Some(password) = generated_password {
                #[allow(clippy::print_stdout)]
                {
                    println!("Generated owner password (shown once): {}", password.expose_secret());
                }
            }
        }
        OwnerSeed::AlreadyPresent(user) => {
            tracing::info!("Owner account already exists: {}", user.username);
        }
    }

    Ok(())
}
