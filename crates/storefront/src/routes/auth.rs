//! Authentication route handlers.
//!
//! Login and sign-up exchange credentials for an API token, which is kept
//! in the server-side session. Validation failures are flashed and the
//! form is shown again.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketstall_core::Email;

use super::layout::Layout;
use crate::api::{ApiError, AuthToken};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{
    CspNonce, OptionalAuth, clear_current_user, is_safe_next, login_url, set_current_user,
};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

/// Minimum password length accepted by sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl SignupForm {
    /// Check the form before calling the API.
    ///
    /// # Errors
    ///
    /// Returns the message to flash for the first problem found.
    pub fn validate(&self) -> std::result::Result<Email, String> {
        if self.username.trim().is_empty() {
            return Err("Username is required".to_string());
        }
        let email = Email::parse(&self.email).map_err(|e| format!("Email: {e}"))?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match".to_string());
        }
        Ok(email)
    }
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub next: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
}

// =============================================================================
// Helpers
// =============================================================================

/// Where to go after signing in.
fn after_login(next: &str) -> String {
    if is_safe_next(next) {
        next.to_string()
    } else {
        "/".to_string()
    }
}

/// Store the new token and greet the shopper.
async fn sign_in(
    session: &Session,
    username: &str,
    token: AuthToken,
    greeting: &str,
) -> Result<()> {
    let user = CurrentUser {
        username: username.to_string(),
        token,
    };
    set_current_user(session, &user).await?;
    tracing::info!(username, "Signed in");
    Flash::success(greeting).push(session).await;
    Ok(())
}

/// Map an auth API failure into a flash; server-side failures propagate.
async fn flash_auth_failure(session: &Session, err: ApiError) -> Result<()> {
    if err.is_server_side() {
        return Err(AppError::Api(err));
    }
    let message = match err {
        ApiError::Rejected { message, .. } => message,
        other => other.user_message(),
    };
    Flash::error(message).push(session).await;
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state, session, user, nonce))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    nonce: CspNonce,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = query.next.unwrap_or_default();
    if user.is_some() {
        return Redirect::to(&after_login(&next)).into_response();
    }

    LoginTemplate {
        layout: Layout::load(&state, &session, None, nonce).await,
        next: if is_safe_next(&next) { next } else { String::new() },
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        Flash::error("Enter your username and password")
            .push(&session)
            .await;
        return Ok(Redirect::to(&login_url(&form.next)).into_response());
    }

    match state.api().login(username, &form.password).await {
        Ok(token) => {
            sign_in(&session, username, token, "Welcome back").await?;
            Ok(Redirect::to(&after_login(&form.next)).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            flash_auth_failure(&session, e).await?;
            Ok(Redirect::to(&login_url(&form.next)).into_response())
        }
    }
}

// =============================================================================
// Sign-up Routes
// =============================================================================

/// Display the sign-up page.
#[instrument(skip(state, session, user, nonce))]
pub async fn signup_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    nonce: CspNonce,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    SignupTemplate {
        layout: Layout::load(&state, &session, None, nonce).await,
    }
    .into_response()
}

/// Handle sign-up form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => {
            Flash::error(message).push(&session).await;
            return Ok(Redirect::to("/auth/signup").into_response());
        }
    };
    let username = form.username.trim();

    match state
        .api()
        .signup(
            username,
            email.as_str(),
            &form.password,
            &form.password_confirm,
        )
        .await
    {
        Ok(token) => {
            sign_in(&session, username, token, "Your account has been created").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            flash_auth_failure(&session, e).await?;
            Ok(Redirect::to("/auth/signup").into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out: revoke the token on the API (best effort) and cycle the session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Redirect> {
    if let Some(user) = user {
        if let Err(e) = state.api().logout(&user.token).await {
            tracing::warn!(error = %e, "Remote logout failed");
        }
    }

    clear_current_user(&session).await?;
    session.cycle_id().await?;
    Flash::success("You have been logged out").push(&session).await;

    Ok(Redirect::to("/"))
}
