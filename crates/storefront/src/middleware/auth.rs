//! Authentication extractors and session helpers.
//!
//! "Signed in" means the session holds a [`CurrentUser`] with an API token.
//! The token is validated lazily: the API rejecting it on any call clears
//! the session user (see [`forget_rejected_user`]).

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// Page requests are redirected to `/auth/login?next=<path>`; requests
/// under `/api/` get a bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Cart for {}", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
pub enum AuthRejection {
    /// Redirect to the login page, returning to `next` afterwards.
    RedirectToLogin { next: String },
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `next` after signing in.
#[must_use]
pub fn login_url(next: &str) -> String {
    if is_safe_next(next) && next != "/" {
        format!("/auth/login?next={}", urlencoding::encode(next))
    } else {
        "/auth/login".to_string()
    }
}

/// Whether `next` is a local path that is safe to redirect to.
///
/// Rejects absolute and scheme-relative URLs (`//evil.test`) and
/// backslash tricks browsers normalize into them.
#[must_use]
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers strip their prefix from `parts.uri`
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        let is_api = uri.path().starts_with("/api/");
        let next = uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), ToString::to_string);
        let reject = || {
            if is_api {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin { next: next.clone() }
            }
        };

        let session = parts.extensions.get::<Session>().ok_or_else(reject)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(reject)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user; never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the signed-in user, cycling the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.username);
    Ok(())
}

/// Sign the visitor out locally.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    clear_sentry_user();
    Ok(())
}

/// Drop the session user when the API rejected their token.
///
/// The error is passed through as an [`AppError`], whose response redirects
/// to the login page for a rejected token.
pub async fn forget_rejected_user(session: &Session, err: ApiError) -> AppError {
    if matches!(err, ApiError::Unauthorized) {
        tracing::info!("API rejected session token, signing out");
        if let Err(e) = clear_current_user(session).await {
            tracing::warn!(error = %e, "Failed to clear rejected session user");
        }
    }
    AppError::Api(err)
}
