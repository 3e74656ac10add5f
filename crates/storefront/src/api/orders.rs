//! Cart, coupon, checkout and payment history endpoints.
//!
//! The API has no explicit "cart"; the shopper's unordered order plays that
//! role and is created on the first add-to-cart.

use reqwest::Method;
use tracing::instrument;

use marketstall_core::{ItemOptionId, OrderItemId};

use super::types::{AddToCartRequest, CouponRequest, SlugRequest};
use super::{ApiClient, ApiError, AuthToken, CheckoutRequest, Order, Payment};

impl ApiClient {
    /// Add one unit of a product with the given option values.
    ///
    /// If a line with the same product and options exists, its quantity is
    /// incremented instead.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the API refuses the selection.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &AuthToken,
        slug: &str,
        options: &[ItemOptionId],
    ) -> Result<(), ApiError> {
        self.send_json(
            Method::POST,
            "api/add-to-cart/",
            Some(token),
            &AddToCartRequest { slug, options },
        )
        .await
        .map(drop)
    }

    /// Fetch the shopper's active order.
    ///
    /// Returns `Ok(None)` when there is no active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any other reason.
    #[instrument(skip_all)]
    pub async fn order_summary(&self, token: &AuthToken) -> Result<Option<Order>, ApiError> {
        match self.get_json("api/order-summary/", Some(token)).await {
            Ok(order) => Ok(Some(order)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove one unit of the product's line; the line disappears at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn subtract_item(&self, token: &AuthToken, slug: &str) -> Result<(), ApiError> {
        self.send_json(
            Method::POST,
            "api/order-item/subtract/",
            Some(token),
            &SlugRequest { slug },
        )
        .await
        .map(drop)
    }

    /// Delete a cart line regardless of quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order_item_id = %id))]
    pub async fn delete_item(&self, token: &AuthToken, id: OrderItemId) -> Result<(), ApiError> {
        self.delete(&format!("api/order-item/{id}/delete/"), token)
            .await
    }

    /// Apply a coupon code to the active order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the API's message when the code
    /// is unknown or there is no active order.
    #[instrument(skip(self, token))]
    pub async fn add_coupon(&self, token: &AuthToken, code: &str) -> Result<(), ApiError> {
        self.send_json(
            Method::POST,
            "api/add-coupon/",
            Some(token),
            &CouponRequest { code },
        )
        .await
        .map(drop)
    }

    /// Charge the card token and mark the active order as ordered.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the API's message when the charge
    /// fails or an address is missing.
    #[instrument(skip_all, fields(billing = %request.billing_address, shipping = %request.shipping_address))]
    pub async fn checkout(
        &self,
        token: &AuthToken,
        request: &CheckoutRequest,
    ) -> Result<(), ApiError> {
        self.send_json(Method::POST, "api/checkout/", Some(token), request)
            .await
            .map(drop)
    }

    /// Completed payments for the shopper.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn payments(&self, token: &AuthToken) -> Result<Vec<Payment>, ApiError> {
        self.get_json("api/payments/", Some(token)).await
    }
}
