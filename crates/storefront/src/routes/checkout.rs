//! Checkout route handlers.
//!
//! The card is tokenized in the browser by Stripe Elements
//! (`static/js/checkout.js`); only the single-use token reaches this
//! server, which forwards it with the chosen addresses to the API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketstall_core::{AddressId, AddressType};

use super::cart::{OrderView, flash_outcome, load_order};
use super::layout::Layout;
use crate::api::{Address, CheckoutRequest, default_address_id};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth, forget_rejected_user};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// An address rendered as a select option.
#[derive(Clone, Debug)]
pub struct AddressOptionView {
    pub id: AddressId,
    pub summary: String,
    pub selected: bool,
}

/// Select options for one address kind, with the default pre-selected.
#[must_use]
pub fn address_options(addresses: &[Address]) -> Vec<AddressOptionView> {
    let default = default_address_id(addresses);
    addresses
        .iter()
        .map(|a| AddressOptionView {
            id: a.id,
            summary: a.summary(),
            selected: Some(a.id) == default,
        })
        .collect()
}

// =============================================================================
// Form Types
// =============================================================================

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

/// Payment form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    /// Card token from Stripe Elements.
    #[serde(default)]
    pub card_token: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub shipping_address: String,
}

impl CheckoutForm {
    /// Validate the submission into an API request.
    ///
    /// # Errors
    ///
    /// Returns the message to flash when the token or an address is missing.
    pub fn into_request(self) -> std::result::Result<CheckoutRequest, &'static str> {
        let card_token = self.card_token.trim().to_string();
        if card_token.is_empty() {
            return Err("Your card details could not be verified. Please try again.");
        }
        let billing_address = self
            .billing_address
            .parse::<AddressId>()
            .map_err(|_| "Please select a billing address")?;
        let shipping_address = self
            .shipping_address
            .parse::<AddressId>()
            .map_err(|_| "Please select a shipping address")?;

        Ok(CheckoutRequest {
            card_token,
            billing_address,
            shipping_address,
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub order: OrderView,
    pub billing: Vec<AddressOptionView>,
    pub shipping: Vec<AddressOptionView>,
    /// The payment form needs at least one address of each kind.
    pub can_pay: bool,
    pub stripe_publishable_key: String,
}

/// Payment confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub layout: Layout,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the checkout page.
#[instrument(skip(state, session, user, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    nonce: CspNonce,
) -> Result<Response> {
    let order = match load_order(&state, &session, &user.token).await? {
        Some(order) if !order.is_empty() => order,
        _ => return Ok(Redirect::to("/products").into_response()),
    };

    let mut addresses = Vec::with_capacity(AddressType::ALL.len());
    for kind in AddressType::ALL {
        match state.api().addresses(&user.token, kind).await {
            Ok(list) => addresses.push(address_options(&list)),
            Err(e) => return Err(forget_rejected_user(&session, e).await),
        }
    }
    let shipping = addresses.pop().unwrap_or_default();
    let billing = addresses.pop().unwrap_or_default();

    Ok(CheckoutTemplate {
        layout: Layout::with_order(&session, &user, Some(&order), nonce).await,
        order: OrderView::from(&order),
        can_pay: !billing.is_empty() && !shipping.is_empty(),
        billing,
        shipping,
        stripe_publishable_key: state.config().payments.stripe_publishable_key.clone(),
    }
    .into_response())
}

/// Apply a coupon code.
#[instrument(skip(state, session, user, form))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let code = form.code.trim();
    if code.is_empty() {
        Flash::error("Please enter a coupon code").push(&session).await;
        return Ok(Redirect::to("/checkout").into_response());
    }

    let outcome = state.api().add_coupon(&user.token, code).await;
    flash_outcome(&session, outcome, Some("Coupon applied")).await?;

    Ok(Redirect::to("/checkout").into_response())
}

/// Submit payment.
#[instrument(skip(state, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let request = match form.into_request() {
        Ok(request) => request,
        Err(message) => {
            Flash::error(message).push(&session).await;
            return Ok(Redirect::to("/checkout").into_response());
        }
    };

    let outcome = state.api().checkout(&user.token, &request).await;
    let paid = outcome.is_ok();
    flash_outcome(&session, outcome, None).await?;

    if paid {
        tracing::info!("Checkout completed");
        add_breadcrumb("checkout", "Payment submitted", None);
        Ok(Redirect::to("/checkout/success").into_response())
    } else {
        Ok(Redirect::to("/checkout").into_response())
    }
}

/// Display the payment confirmation.
#[instrument(skip(state, session, user, nonce))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    nonce: CspNonce,
) -> impl IntoResponse {
    CheckoutSuccessTemplate {
        layout: Layout::load(&state, &session, user.as_ref(), nonce).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(token: &str, billing: &str, shipping: &str) -> CheckoutForm {
        CheckoutForm {
            card_token: token.to_string(),
            billing_address: billing.to_string(),
            shipping_address: shipping.to_string(),
        }
    }

    #[test]
    fn test_checkout_form_valid() {
        let request = form("tok_visa", "3", "4").into_request().unwrap();
        assert_eq!(request.card_token, "tok_visa");
        assert_eq!(request.billing_address, AddressId::new(3));
        assert_eq!(request.shipping_address, AddressId::new(4));
    }

    #[test]
    fn test_checkout_form_requires_token() {
        assert!(form("  ", "3", "4").into_request().is_err());
    }

    #[test]
    fn test_checkout_form_requires_addresses() {
        assert_eq!(
            form("tok_visa", "", "4").into_request().unwrap_err(),
            "Please select a billing address"
        );
        assert_eq!(
            form("tok_visa", "3", "x").into_request().unwrap_err(),
            "Please select a shipping address"
        );
    }

    #[test]
    fn test_address_options_preselect_default() {
        let addresses: Vec<Address> = serde_json::from_str(
            r#"[
                {"id": 1, "user": 3, "street_address": "1 Main St", "apartment_address": "",
                 "country": "US", "zip": "10001", "address_type": "S", "default": false},
                {"id": 2, "user": 3, "street_address": "2 Side St", "apartment_address": "",
                 "country": "US", "zip": "10002", "address_type": "S", "default": true}
            ]"#,
        )
        .unwrap();

        let options = address_options(&addresses);
        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(options[1].summary, "2 Side St, US");
    }
}
