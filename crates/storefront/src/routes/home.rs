//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use super::products::ProductCardView;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::state::AppState;

/// Number of products featured below the hero.
const FEATURED_COUNT: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub featured: Vec<ProductCardView>,
}

/// Display the home page.
///
/// The catalog being unreachable only hides the featured row.
#[instrument(skip(state, session, user, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    nonce: CspNonce,
) -> impl IntoResponse {
    let featured = match state.api().list_products().await {
        Ok(products) => products
            .iter()
            .take(FEATURED_COUNT)
            .map(|p| ProductCardView::new(p, state.api()))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured products");
            Vec::new()
        }
    };

    HomeTemplate {
        layout: Layout::load(&state, &session, user.as_ref(), nonce).await,
        featured,
    }
}
