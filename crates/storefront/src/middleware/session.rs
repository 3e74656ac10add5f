//! Session middleware configuration.
//!
//! Sessions live in process memory (`MemoryStore`); the cookie carries only
//! the session ID, signed with the configured secret. A restart signs every
//! shopper out.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{ConfigError, StorefrontConfig};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ms_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session layer type used by the router.
pub type StorefrontSessionLayer = SessionManagerLayer<MemoryStore, SignedCookie>;

/// Create the session layer.
///
/// # Errors
///
/// Returns an error if the session secret is too short to derive a signing
/// key (less than 64 bytes).
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> Result<StorefrontSessionLayer, ConfigError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes()).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_SESSION_SECRET".to_string(), e.to_string())
    })?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
