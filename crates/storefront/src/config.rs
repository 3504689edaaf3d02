//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local run.
//!
//! - `BOOKSTORE_DATABASE_URL` - `SQLite` connection string (fallback `DATABASE_URL`,
//!   default: `sqlite://bookstore.db?mode=rwc`)
//! - `BOOKSTORE_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKSTORE_PORT` - Listen port (default: 5000)
//! - `BOOKSTORE_BASE_URL` - Public URL; `https` enables secure cookies
//!   (default: `http://127.0.0.1:5000`)
//! - `BOOKSTORE_UPLOAD_DIR` - Upload storage directory (default: uploads)
//! - `BOOKSTORE_MAX_UPLOAD_BYTES` - Upload size limit (default: 10 MiB)
//! - `BOOKSTORE_STATIC_DIR` - Static assets (default: crates/storefront/static)
//! - `BOOKSTORE_OWNER_USERNAME` - Owner account created at startup (default: Owner)
//! - `BOOKSTORE_OWNER_PASSWORD` - Owner password; generated and logged once if unset
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://bookstore.db?mode=rwc";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_STATIC_DIR: &str = "crates/storefront/static";
const DEFAULT_OWNER_USERNAME: &str = "Owner";

const MIN_OWNER_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "owner",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct BookstoreConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory for uploaded files
    pub upload_dir: PathBuf,
    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Owner account seeded at startup
    pub owner: OwnerConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Owner account seeding configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct OwnerConfig {
    /// Username of the owner account
    pub username: String,
    /// Password for a newly created owner; `None` generates one
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for OwnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for BookstoreConfig {
    fn default() -> Self {
        Self {
            database_url: SecretString::from(DEFAULT_DATABASE_URL),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            base_url: DEFAULT_BASE_URL.to_owned(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            owner: OwnerConfig {
                username: DEFAULT_OWNER_USERNAME.to_owned(),
                password: None,
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl BookstoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the owner
    /// password fails validation (placeholder detection, length, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let database_url = get_database_url("BOOKSTORE_DATABASE_URL")
            .unwrap_or_else(|| SecretString::from(DEFAULT_DATABASE_URL));
        let host = parse_env("BOOKSTORE_HOST", defaults.host)?;
        let port = parse_env("BOOKSTORE_PORT", defaults.port)?;
        let base_url = get_optional_env("BOOKSTORE_BASE_URL").unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidEnvVar(
                "BOOKSTORE_BASE_URL".to_owned(),
                "must start with http:// or https://".to_owned(),
            ));
        }
        let upload_dir = get_optional_env("BOOKSTORE_UPLOAD_DIR")
            .map_or(defaults.upload_dir, PathBuf::from);
        let max_upload_bytes = parse_env("BOOKSTORE_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;
        let static_dir = get_optional_env("BOOKSTORE_STATIC_DIR")
            .map_or(defaults.static_dir, PathBuf::from);

        let owner = OwnerConfig {
            username: get_optional_env("BOOKSTORE_OWNER_USERNAME")
                .unwrap_or(defaults.owner.username),
            password: get_optional_env("BOOKSTORE_OWNER_PASSWORD")
                .map(|value| validate_owner_password(value, "BOOKSTORE_OWNER_PASSWORD"))
                .transpose()?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            max_upload_bytes,
            static_dir,
            owner,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable; empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |value| parse_value(key, &value))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated password."
            ),
        ));
    }

    Ok(())
}

/// Check the configured owner password and wrap it as a secret.
fn validate_owner_password(value: String, var_name: &str) -> Result<SecretString, ConfigError> {
    let length = value.chars().count();
    if length < MIN_OWNER_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("must be at least {MIN_OWNER_PASSWORD_LENGTH} characters (got {length})"),
        ));
    }
    validate_secret_strength(&value, var_name)?;
    Ok(SecretString::from(value))
}
