//! Authentication extractors and session helpers.
//!
//! The logged-in account is stored in the session as a [`CurrentUser`].
//! Handlers ask for it with [`RequireAuth`] or [`OptionalAuth`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::ACCEPT, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use bookstore_core::Identity;

use crate::models::{CurrentUser, session_keys};

/// Path prefixes served as JSON; unauthenticated requests get 401 instead of a redirect.
const JSON_PATH_PREFIXES: &[&str] = &["/books", "/upload", "/search_suggestions"];

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, HTML requests are redirected to `/login` and JSON
/// requests get `401`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "authentication required" })),
            )
                .into_response(),
        }
    }
}

/// Whether the request expects a JSON response.
fn wants_json(parts: &Parts) -> bool {
    let path = parts.uri.path();
    if JSON_PATH_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }
    parts
        .headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

async fn load_current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read current user from session");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match load_current_user(parts).await {
            Some(user) => Ok(Self(user)),
            None if wants_json(parts) => Err(AuthRejection::Unauthorized),
            None => Err(AuthRejection::RedirectToLogin),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject anonymous requests.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl OptionalAuth {
    /// The identity the policy sees for this request.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.0.as_ref().map_or(Identity::Anonymous, CurrentUser::identity)
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(load_current_user(parts).await))
    }
}

/// Bind the session to `user`.
///
/// The session id is rotated first so an id issued before login cannot be
/// reused afterwards.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn establish_session(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session (logout).
///
/// Idempotent: ending an anonymous session is a no-op.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn end_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(path: &str, accept: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(path);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_wants_json_by_path() {
        assert!(wants_json(&parts("/books/add", None)));
        assert!(wants_json(&parts("/upload", None)));
        assert!(!wants_json(&parts("/cart", None)));
        assert!(!wants_json(&parts("/book/1", None)));
    }

    #[test]
    fn test_wants_json_by_accept() {
        assert!(wants_json(&parts("/cart", Some("application/json"))));
        assert!(!wants_json(&parts("/cart", Some("text/html"))));
    }

    #[test]
    fn test_anonymous_identity() {
        assert_eq!(OptionalAuth(None).identity(), Identity::Anonymous);
    }
}
