//! Integration test harness for the bookstore.
//!
//! Each [`TestContext`] owns a private in-memory database, a throwaway
//! upload directory and the fully layered router, so tests drive the real
//! HTTP stack in-process without binding a port.
//!
//! ```bash
//! cargo test -p bookstore-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header, request::Builder as RequestBuilder},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use bookstore_storefront::config::BookstoreConfig;
use bookstore_storefront::db::{self, BookRepository};
use bookstore_storefront::models::{Book, BookInput, NewBook, User};
use bookstore_storefront::routes;
use bookstore_storefront::services::auth::AuthService;
use bookstore_storefront::state::AppState;

/// Password used for every account the harness creates.
pub const PASSWORD: &str = "correct horse battery";

/// Username of the seeded owner.
pub const OWNER: &str = "Owner";

/// A running application backed by fresh storage.
pub struct TestContext {
    pub state: AppState,
    app: Router,
    upload_dir: PathBuf,
    database_file: Option<PathBuf>,
}

impl TestContext {
    /// Fresh in-memory database with migrations applied and an owner account.
    pub async fn new() -> Self {
        let pool = db::create_in_memory_pool().await.unwrap();
        Self::with_pool(pool, None).await
    }

    /// Like [`TestContext::new`], but over a temporary `SQLite` file using
    /// the production pool settings, so connections really run in parallel.
    pub async fn file_backed() -> Self {
        let path = std::env::temp_dir().join(format!("bookstore-it-{}.db", uuid::Uuid::new_v4()));
        let url = SecretString::from(format!("sqlite://{}?mode=rwc", path.display()));
        let pool = db::create_pool(&url).await.unwrap();
        Self::with_pool(pool, Some(path)).await
    }

    async fn with_pool(pool: SqlitePool, database_file: Option<PathBuf>) -> Self {
        db::migrate(&pool).await.unwrap();

        let upload_dir = std::env::temp_dir().join(format!("bookstore-it-{}", uuid::Uuid::new_v4()));
        let config = BookstoreConfig {
            upload_dir: upload_dir.clone(),
            ..BookstoreConfig::default()
        };

        let state = AppState::new(config, pool);
        state.files().ensure_root().await.unwrap();

        AuthService::new(state.pool())
            .ensure_owner_exists(OWNER, Some(&SecretString::from(PASSWORD)))
            .await
            .unwrap();

        let app = routes::app(state.clone(), MemoryStore::default());

        Self {
            state,
            app,
            upload_dir,
            database_file,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.state.pool()
    }

    /// Register a plain user.
    pub async fn user(&self, username: &str) -> User {
        AuthService::new(self.pool())
            .register(username, PASSWORD)
            .await
            .unwrap()
    }

    /// Create an admin on behalf of the owner.
    pub async fn admin(&self, username: &str) -> User {
        let owner = db::UserRepository::new(self.pool())
            .get_owner()
            .await
            .unwrap()
            .unwrap();
        AuthService::new(self.pool())
            .create_admin(&owner.identity(), username, PASSWORD)
            .await
            .unwrap()
    }

    /// Insert a book directly, bypassing the policy.
    pub async fn book(&self, title: &str, price: &str, category: Option<&str>) -> Book {
        let new_book = NewBook::parse(BookInput {
            title: title.to_owned(),
            author: "Test Author".to_owned(),
            price: price.to_owned(),
            category: category.map(str::to_owned),
            ..BookInput::default()
        })
        .unwrap();
        BookRepository::new(self.pool()).create(&new_book).await.unwrap()
    }

    /// Dispatch one request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Log in through `POST /login` and return the session cookie.
    pub async fn login(&self, username: &str) -> String {
        let body = format!("username={username}&password={}", PASSWORD.replace(' ', "+"));
        let response = self.send(form("/login", &body, None)).await;
        assert_eq!(location(&response), Some("/"), "login failed for {username}");
        session_cookie(&response).expect("login did not set a session cookie")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
        if let Some(path) = &self.database_file {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }
}

/// `GET` request, optionally with a session cookie.
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::get(uri), cookie).body(Body::empty()).unwrap()
}

/// Url-encoded form `POST`.
pub fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::post(uri), cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

/// JSON `POST`.
pub fn json_post(uri: &str, body: &serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::post(uri), cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart `POST` carrying one file under `field`.
pub fn multipart_post(
    uri: &str,
    field: &str,
    filename: &str,
    contents: &[u8],
    cookie: Option<&str>,
) -> Request<Body> {
    const BOUNDARY: &str = "bookstore-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    with_cookie(Request::post(uri), cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn with_cookie(builder: RequestBuilder, cookie: Option<&str>) -> RequestBuilder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

/// `name=value` of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("bookstore_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

/// Redirect target of a response.
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Collect a response body as bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Collect a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
