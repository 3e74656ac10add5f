//! Session-related types.

use serde::{Deserialize, Serialize};

use crate::api::AuthToken;

/// Session-stored user identity.
///
/// The API token is the only credential; the username is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub token: AuthToken,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}
