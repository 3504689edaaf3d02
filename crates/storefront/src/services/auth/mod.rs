//! Authentication service.
//!
//! Registration, password login, admin creation and owner seeding. Session
//! binding lives in [`crate::middleware::auth`]; this service only decides
//! who a caller is.

mod error;
pub mod password;

pub use error::AuthError;
pub use password::{hash_password, verify_password};

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use tracing::instrument;

use bookstore_core::{Action, Identity, Role, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Length of generated owner passwords.
const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Outcome of [`AuthService::ensure_owner_exists`].
#[derive(Debug)]
pub enum OwnerSeed {
    /// A new owner account was created.
    Created {
        user: User,
        /// Set when no password was configured and one was generated.
        generated_password: Option<SecretString>,
    },
    /// An owner account already existed; nothing was changed.
    AlreadyPresent(User),
}

impl OwnerSeed {
    /// The owner account, new or existing.
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Created { user, .. } | Self::AlreadyPresent(user) => user,
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account with role `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::EmptyPassword` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self.create_account(username, password, Role::User).await?;
        tracing::info!(user_id = %user.id, "Registered new user");
        Ok(user)
    }

    /// Check a username/password pair.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the pair does not match an account.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Ok(username) = Username::parse(username) else {
            return Err(AuthError::InvalidCredentials);
        };

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Create an admin account on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PermissionDenied` unless `actor` may create admins.
    /// Returns `AuthError::InvalidUsername` or `AuthError::EmptyPassword` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password))]
    pub async fn create_admin(
        &self,
        actor: &Identity,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        actor.authorize(Action::CreateAdmin)?;

        let user = self.create_account(username, password, Role::Admin).await?;
        tracing::info!(user_id = %user.id, actor = ?actor.user_id(), "Created admin account");
        Ok(user)
    }

    /// Make sure exactly one owner account exists.
    ///
    /// Idempotent: if an owner already exists it is returned unchanged. When
    /// `password` is `None` a random one is generated and handed back in
    /// [`OwnerSeed::Created`] so the caller can report it once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if `username` is held by a non-owner.
    /// Returns `AuthError::Repository` on database errors.
    #[instrument(skip(self, password))]
    pub async fn ensure_owner_exists(
        &self,
        username: &str,
        password: Option<&SecretString>,
    ) -> Result<OwnerSeed, AuthError> {
        if let Some(owner) = self.users.get_owner().await? {
            return Ok(OwnerSeed::AlreadyPresent(owner));
        }

        let generated_password = password.is_none().then(generate_password);
        let secret = match (password, &generated_password) {
            (Some(configured), _) => configured.expose_secret(),
            (None, Some(generated)) => generated.expose_secret(),
            (None, None) => return Err(AuthError::EmptyPassword),
        };

        match self.create_account(username, secret, Role::Owner).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Created owner account");
                Ok(OwnerSeed::Created {
                    user,
                    generated_password,
                })
            }
            // Another process seeded the owner between our read and insert.
            Err(AuthError::UserAlreadyExists) => self
                .users
                .get_owner()
                .await?
                .map(OwnerSeed::AlreadyPresent)
                .ok_or(AuthError::UserAlreadyExists),
            Err(e) => Err(e),
        }
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let password_hash = hash_password(password)?;

        self.users
            .create(&username, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Generate a random alphanumeric password.
fn generate_password() -> SecretString {
    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect();
    SecretString::from(password)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::UserId;

    use super::*;
    use crate::db::{create_in_memory_pool, migrate};

    async fn pool() -> SqlitePool {
        let pool = create_in_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);

        let user = auth.register("alice", "pw1").await.unwrap();
        assert_eq!(user.role, Role::User);

        let logged_in = auth.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);
        auth.register("alice", "pw1").await.unwrap();

        assert!(matches!(
            auth.authenticate("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("bob", "pw1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("", "pw1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_conflicts() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);

        auth.register("alice", "pw1").await.unwrap();
        assert!(matches!(
            auth.register("alice", "pw2").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);

        let err = auth.register("  ", "pw").await.unwrap_err();
        assert!(err.is_validation());
        let err = auth.register("alice", "").await.unwrap_err();
        assert!(matches!(err, AuthError::EmptyPassword));
    }

    #[tokio::test]
    async fn test_create_admin_requires_owner() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);

        let admin = Identity::user(UserId::new(1), Role::Admin);
        assert!(matches!(
            auth.create_admin(&admin, "bob", "pw").await,
            Err(AuthError::PermissionDenied(_))
        ));
        assert!(matches!(
            auth.create_admin(&Identity::Anonymous, "bob", "pw").await,
            Err(AuthError::PermissionDenied(_))
        ));

        let owner = Identity::user(UserId::new(1), Role::Owner);
        let created = auth.create_admin(&owner, "bob", "pw").await.unwrap();
        assert_eq!(created.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_ensure_owner_is_idempotent() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);
        let password = SecretString::from("correct-horse-battery");

        let first = auth.ensure_owner_exists("Owner", Some(&password)).await.unwrap();
        assert!(matches!(
            first,
            OwnerSeed::Created {
                generated_password: None,
                ..
            }
        ));

        let second = auth.ensure_owner_exists("Other", None).await.unwrap();
        assert!(matches!(second, OwnerSeed::AlreadyPresent(_)));
        assert_eq!(second.user().id, first.user().id);

        let owners = UserRepository::new(&pool).list_by_role(Role::Owner).await.unwrap();
        assert_eq!(owners.len(), 1);
        assert!(auth.authenticate("Owner", "correct-horse-battery").await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_owner_generates_password() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);

        let seed = auth.ensure_owner_exists("Owner", None).await.unwrap();
        let OwnerSeed::Created {
            generated_password: Some(password),
            ..
        } = seed
        else {
            panic!("expected a generated password");
        };

        assert_eq!(password.expose_secret().len(), GENERATED_PASSWORD_LENGTH);
        assert!(auth.authenticate("Owner", password.expose_secret()).await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_owner_username_taken_by_user() {
        let pool = pool().await;
        let auth = AuthService::new(&pool);
        auth.register("Owner", "pw").await.unwrap();

        assert!(matches!(
            auth.ensure_owner_exists("Owner", None).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }
}
