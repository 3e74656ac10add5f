//! Cart route handlers.
//!
//! The cart is the shopper's active order on the API. Every mutation is a
//! form post answered with a redirect back to `/cart`, which re-reads the
//! order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use marketstall_core::OrderItemId;

use super::layout::Layout;
use crate::api::{ApiError, AuthToken, Order, OrderItem};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth, forget_rejected_user};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Clone, Debug)]
pub struct CartLineView {
    /// 1-based row number.
    pub position: usize,
    pub id: OrderItemId,
    pub title: String,
    pub options: String,
    pub unit_price: String,
    /// Struck-through list price when the product is discounted.
    pub original_price: Option<String>,
    pub quantity: u32,
    pub line_total: String,
    pub discounted: bool,
}

impl CartLineView {
    fn new(position: usize, item: &OrderItem) -> Self {
        let product = &item.item_obj;
        Self {
            position,
            id: item.id,
            title: product.title.clone(),
            options: item.options_summary(),
            unit_price: product.effective_price().display(),
            original_price: item.is_discounted().then(|| product.price.display()),
            quantity: item.quantity,
            line_total: item.final_price.display(),
            discounted: item.is_discounted(),
        }
    }
}

/// Order display data for the cart and checkout pages.
#[derive(Clone, Debug)]
pub struct OrderView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub coupon_code: Option<String>,
    pub coupon_amount: Option<String>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            lines: order
                .order_items
                .iter()
                .enumerate()
                .map(|(i, item)| CartLineView::new(i + 1, item))
                .collect(),
            total: order.total.display(),
            coupon_code: order.coupon.as_ref().map(|c| c.code.clone()),
            coupon_amount: order.coupon.as_ref().map(|c| c.amount.display()),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub order: Option<OrderView>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Fetch the active order, signing the visitor out on a rejected token.
pub(crate) async fn load_order(
    state: &AppState,
    session: &Session,
    token: &AuthToken,
) -> Result<Option<Order>> {
    match state.api().order_summary(token).await {
        Ok(order) => Ok(order),
        Err(e) => Err(forget_rejected_user(session, e).await),
    }
}

/// Turn the outcome of a cart mutation into a flash or an error.
///
/// API rejections become an error flash; anything else propagates.
pub(crate) async fn flash_outcome(
    session: &Session,
    outcome: std::result::Result<(), ApiError>,
    success: Option<&str>,
) -> Result<()> {
    match outcome {
        Ok(()) => {
            if let Some(message) = success {
                Flash::success(message).push(session).await;
            }
            Ok(())
        }
        Err(e @ (ApiError::Rejected { .. } | ApiError::NotFound(_))) => {
            Flash::error(e.user_message()).push(session).await;
            Ok(())
        }
        Err(e) => Err(forget_rejected_user(session, e).await),
    }
}

/// Find a cart line, or flash that it is gone.
async fn find_line(
    state: &AppState,
    session: &Session,
    token: &AuthToken,
    id: OrderItemId,
) -> Result<Option<OrderItem>> {
    let line = load_order(state, session, token)
        .await?
        .and_then(|order| order.find_item(id).cloned());

    if line.is_none() {
        Flash::error("That item is no longer in your cart")
            .push(session)
            .await;
    }
    Ok(line)
}

fn back_to_cart() -> Response {
    Redirect::to("/cart").into_response()
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, user, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let order = load_order(&state, &session, &user.token).await?;

    Ok(CartShowTemplate {
        layout: Layout::with_order(&session, &user, order.as_ref(), nonce).await,
        order: order.as_ref().filter(|o| !o.is_empty()).map(OrderView::from),
    })
}

/// Add one more unit of a line, with the same options.
#[instrument(skip(state, session, user), fields(order_item_id = %id))]
pub async fn increment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderItemId>,
) -> Result<Response> {
    let Some(line) = find_line(&state, &session, &user.token, id).await? else {
        return Ok(back_to_cart());
    };

    let outcome = state
        .api()
        .add_to_cart(&user.token, &line.item_obj.slug, &line.option_ids())
        .await;
    flash_outcome(&session, outcome, None).await?;

    Ok(back_to_cart())
}

/// Remove one unit of a line.
#[instrument(skip(state, session, user), fields(order_item_id = %id))]
pub async fn decrement(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderItemId>,
) -> Result<Response> {
    let Some(line) = find_line(&state, &session, &user.token, id).await? else {
        return Ok(back_to_cart());
    };

    let outcome = state
        .api()
        .subtract_item(&user.token, &line.item_obj.slug)
        .await;
    flash_outcome(&session, outcome, None).await?;

    Ok(back_to_cart())
}

/// Remove a line entirely.
#[instrument(skip(state, session, user), fields(order_item_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderItemId>,
) -> Result<Response> {
    let outcome = state.api().delete_item(&user.token, id).await;
    if outcome.is_ok() {
        add_breadcrumb("cart", "Removed cart line", None);
    }
    flash_outcome(&session, outcome, Some("Item removed from cart")).await?;

    Ok(back_to_cart())
}
