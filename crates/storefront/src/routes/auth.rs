//! Registration, login and logout.
//!
//! Form handlers report outcomes through flash messages and redirects.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    FlashLevel, OptionalAuth, RequireAuth, end_session, establish_session, push_flash,
};
use crate::models::CurrentUser;
use crate::routes::PageContext;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Username/password form used by login, registration and admin creation.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(session: Session, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    RegisterTemplate {
        page: PageContext::load(&session, user).await,
    }
}

/// Handle registration form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, AppError> {
    match AuthService::new(state.pool())
        .register(&form.username, &form.password)
        .await
    {
        Ok(_) => {
            push_flash(
                &session,
                FlashLevel::Success,
                "Registration successful. Please log in.",
            )
            .await;
            Ok(Redirect::to("/login"))
        }
        Err(AuthError::UserAlreadyExists) => {
            push_flash(&session, FlashLevel::Error, "Username already exists").await;
            Ok(Redirect::to("/register"))
        }
        Err(e) if e.is_validation() => {
            push_flash(&session, FlashLevel::Error, e.to_string()).await;
            Ok(Redirect::to("/register"))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(session: Session, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    LoginTemplate {
        page: PageContext::load(&session, user).await,
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, AppError> {
    match AuthService::new(state.pool())
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(&user);
            establish_session(&session, &current).await?;
            set_sentry_user(&user.id, Some(user.username.as_str()));

            tracing::info!(user_id = %user.id, "User logged in");
            push_flash(&session, FlashLevel::Success, "Logged in successfully").await;
            Ok(Redirect::to("/"))
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            push_flash(&session, FlashLevel::Error, "Invalid username or password").await;
            Ok(Redirect::to("/login"))
        }
        Err(e) => Err(e.into()),
    }
}

/// End the session.
///
/// Session errors are logged rather than surfaced; from the caller's view
/// logout always succeeds.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(session: Session, RequireAuth(user): RequireAuth) -> Redirect {
    if let Err(e) = end_session(&session).await {
        tracing::error!(error = %e, "Failed to end session");
    }
    clear_sentry_user();

    push_flash(&session, FlashLevel::Info, "You have been logged out").await;
    Redirect::to("/")
}
