//! Client for the remote commerce REST API.
//!
//! # Architecture
//!
//! - The API is the source of truth - NO local persistence and NO response
//!   caching; every page render reads fresh state
//! - Authenticated calls carry `Authorization: Token <key>`, where the key
//!   comes from the login or registration endpoint
//! - Errors are normalized into [`ApiError`] so handlers can turn API
//!   validation messages into flash messages
//!
//! # Endpoints
//!
//! | Area | Module |
//! |------|--------|
//! | Login, registration, logout | [`auth`] |
//! | Product list and detail | [`products`] |
//! | Order summary, cart lines, coupons, checkout, payments | [`orders`] |
//! | Address book, countries, user id | [`addresses`] |
//!
//! # Example
//!
//! ```rust,ignore
//! use marketstall_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let token = client.login("shopper", "hunter22").await?;
//! let order = client.order_summary(&token).await?;
//! ```

pub mod addresses;
pub mod auth;
pub mod orders;
pub mod products;
pub mod types;

pub use types::*;

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when calling the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    /// The auth token was rejected or is missing.
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API refused the request with a validation message.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The API failed on its side.
    #[error("API server error: {0}")]
    Server(StatusCode),
}

impl ApiError {
    /// Text that can be shown to a shopper.
    ///
    /// Validation messages from the API are passed through; transport and
    /// server failures collapse into a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unauthorized => "Please log in again.".to_string(),
            Self::NotFound(_) => "That item no longer exists.".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) | Self::Server(_) => {
                "The store is temporarily unavailable. Please try again.".to_string()
            }
        }
    }

    /// Whether the failure is on the API's side rather than the shopper's.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Parse(_) | Self::Url(_) | Self::Server(_)
        )
    }
}

/// API auth token issued at login.
///
/// Stored in the server-side session; `Debug` is redacted so the token never
/// reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self(key)
    }

    fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("marketstall-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Url::join replaces the last path segment unless the base ends in '/'
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// Resolve a media path from the API into an absolute URL.
    ///
    /// List endpoints return absolute image URLs while nested objects return
    /// `/media/...` paths; both render correctly after this.
    #[must_use]
    pub fn media_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        self.inner
            .base_url
            .join(path)
            .map_or_else(|_| path.to_string(), String::from)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = token {
            builder = builder.header(reqwest::header::AUTHORIZATION, token.header_value());
        }
        Ok(builder)
    }

    /// Send a request and map non-success statuses into [`ApiError`].
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        tracing::debug!(
            status = %status,
            path,
            body = %body.chars().take(500).collect::<String>(),
            "API returned non-success status"
        );

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            s if s.is_server_error() => {
                tracing::error!(status = %s, path, "API server error");
                ApiError::Server(s)
            }
            s => ApiError::Rejected {
                status: s,
                message: extract_error_message(&body).unwrap_or_else(|| {
                    s.canonical_reason().unwrap_or("Request rejected").to_string()
                }),
            },
        })
    }

    fn parse<T: DeserializeOwned>(body: &str, path: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, token)?;
        let body = self.send(builder, path).await?;
        Self::parse(&body, path)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
        body: &B,
    ) -> Result<String, ApiError> {
        let builder = self.request(method, path, token)?.json(body);
        self.send(builder, path).await
    }

    async fn delete(&self, path: &str, token: &AuthToken) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path, Some(token))?;
        self.send(builder, path).await.map(drop)
    }
}

/// Pull a human-readable message out of an API error body.
///
/// The API answers with one of `{"message": ...}`, `{"detail": ...}`,
/// `{"non_field_errors": [...]}` or per-field lists like
/// `{"zip": ["This field is required."]}`.
fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        One(String),
        Many(Vec<String>),
    }

    impl Field {
        fn first(self) -> Option<String> {
            match self {
                Self::One(s) => Some(s),
                Self::Many(v) => v.into_iter().next(),
            }
        }
    }

    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body).ok()?;

    for key in ["message", "detail", "non_field_errors"] {
        if let Some(msg) = map
            .get(key)
            .and_then(|v| Field::deserialize(v).ok())
            .and_then(Field::first)
        {
            return Some(msg);
        }
    }

    map.into_iter().find_map(|(field, value)| {
        Field::deserialize(value)
            .ok()
            .and_then(Field::first)
            .map(|msg| format!("{field}: {msg}"))
    })
}
