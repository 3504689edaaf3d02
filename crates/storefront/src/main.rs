//! Bookstore storefront - catalog, cart and accounts.
//!
//! Serves HTML pages, the JSON catalog API and file transfer on one port
//! (5000 by default).
//!
//! # Startup
//!
//! 1. Load configuration from the environment (`.env` honoured)
//! 2. Open the `SQLite` pool and apply pending migrations
//! 3. Make sure the upload directory and the owner account exist, log the
//!    catalog size
//! 4. Serve until Ctrl+C or SIGTERM

#![cfg_attr(not(test), forbid(unsafe_code))]

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstore_storefront::config::BookstoreConfig;
use bookstore_storefront::db;
use bookstore_storefront::middleware::create_session_store;
use bookstore_storefront::routes;
use bookstore_storefront::services::auth::{AuthService, OwnerSeed};
use bookstore_storefront::services::catalog::CatalogService;
use bookstore_storefront::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BookstoreConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = BookstoreConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bookstore_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    db::migrate(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let session_store = create_session_store(&pool)
        .await
        .expect("Failed to prepare session store");

    let state = AppState::new(config.clone(), pool);
    state
        .files()
        .ensure_root()
        .await
        .expect("Failed to create upload directory");

    let seed = AuthService::new(state.pool())
        .ensure_owner_exists(&config.owner.username, config.owner.password.as_ref())
        .await
        .expect("Failed to ensure owner account");
    match &seed {
        OwnerSeed::Created {
            user,
            generated_password: Some(password),
        } => tracing::warn!(
            username = %user.username,
            password = password.expose_secret(),
            "Created owner account with a generated password; store it now, it is not shown again"
        ),
        OwnerSeed::Created { user, .. } => {
            tracing::info!(username = %user.username, "Created owner account");
        }
        OwnerSeed::AlreadyPresent(user) => {
            tracing::debug!(username = %user.username, "Owner account present");
        }
    }

    match CatalogService::new(state.pool()).count().await {
        Ok(books) => tracing::info!(books, "Catalog loaded"),
        Err(e) => tracing::warn!(error = %e, "Could not count catalog books"),
    }

    let app = routes::app(state, session_store);

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
