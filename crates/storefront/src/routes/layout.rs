//! Data every page template shares through `base.html`.

use tower_sessions::Session;

use crate::api::{ApiError, Order};
use crate::middleware::{CspNonce, forget_rejected_user};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

/// Header cart dropdown: line count plus `quantity x title` entries.
#[derive(Clone, Debug, Default)]
pub struct CartPreview {
    pub count: usize,
    pub lines: Vec<String>,
}

impl From<&Order> for CartPreview {
    fn from(order: &Order) -> Self {
        Self {
            count: order.item_count(),
            lines: order
                .order_items
                .iter()
                .map(|item| format!("{} x {}", item.quantity, item.item_obj.title))
                .collect(),
        }
    }
}

/// Layout context rendered by `base.html`.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub username: Option<String>,
    pub cart: CartPreview,
    pub flash: Option<Flash>,
    pub nonce: String,
}

impl Layout {
    /// Build the layout, fetching the cart preview for signed-in visitors.
    ///
    /// The preview is best effort: an API failure leaves it empty rather
    /// than failing the page. A rejected token signs the visitor out.
    pub async fn load(
        state: &AppState,
        session: &Session,
        user: Option<&CurrentUser>,
        nonce: CspNonce,
    ) -> Self {
        let mut username = user.map(|u| u.username.clone());

        let cart = match user {
            Some(user) => match state.api().order_summary(&user.token).await {
                Ok(Some(order)) => CartPreview::from(&order),
                Ok(None) => CartPreview::default(),
                Err(ApiError::Unauthorized) => {
                    forget_rejected_user(session, ApiError::Unauthorized).await;
                    username = None;
                    CartPreview::default()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load cart preview");
                    CartPreview::default()
                }
            },
            None => CartPreview::default(),
        };

        Self {
            username,
            cart,
            flash: Flash::take(session).await,
            nonce: nonce.0,
        }
    }

    /// Build the layout from an order the handler already fetched.
    pub async fn with_order(
        session: &Session,
        user: &CurrentUser,
        order: Option<&Order>,
        nonce: CspNonce,
    ) -> Self {
        Self {
            username: Some(user.username.clone()),
            cart: order.map(CartPreview::from).unwrap_or_default(),
            flash: Flash::take(session).await,
            nonce: nonce.0,
        }
    }

    /// Whether a visitor is signed in.
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.username.is_some()
    }

    /// CSS class for the flash banner, empty when there is no flash.
    #[must_use]
    pub fn flash_class(&self) -> &'static str {
        self.flash.as_ref().map_or("", |f| f.level.css_class())
    }
}
