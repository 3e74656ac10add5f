//! One-shot messages carried across a post/redirect/get cycle.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    /// CSS modifier class for the message banner.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Error => "flash-error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// Store the message for the next render, replacing any pending one.
    ///
    /// Failures are logged and swallowed: losing a flash must not fail the
    /// mutation that produced it.
    pub async fn push(self, session: &Session) {
        if let Err(e) = session.insert(session_keys::FLASH, &self).await {
            tracing::warn!(error = %e, "Failed to store flash message");
        }
    }

    /// Remove and return the pending message, if any.
    pub async fn take(session: &Session) -> Option<Self> {
        session
            .remove::<Self>(session_keys::FLASH)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read flash message");
                None
            })
    }
}
