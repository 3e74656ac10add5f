//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Home page
//! GET  /health                             - Liveness
//! GET  /health/ready                       - Readiness (API reachable)
//!
//! # Products
//! GET  /products                           - Product listing
//! GET  /products/{id}                      - Product detail
//! POST /products/{id}/add                  - Add to cart (auth)
//!
//! # Cart (auth)
//! GET  /cart                               - Order summary
//! POST /cart/items/{id}/increment          - One more unit
//! POST /cart/items/{id}/decrement          - One less unit
//! POST /cart/items/{id}/remove             - Remove line
//!
//! # Checkout (auth)
//! GET  /checkout                           - Addresses, coupon, card form
//! POST /checkout                           - Submit card token
//! POST /checkout/coupon                    - Apply coupon
//! GET  /checkout/success                   - Confirmation
//!
//! # Account (auth)
//! GET  /account                            - Redirect to billing addresses
//! GET  /account/addresses/{kind}           - Address book (?edit={id})
//! POST /account/addresses/{kind}           - Create address
//! POST /account/addresses/{kind}/{id}      - Update address
//! POST /account/addresses/{kind}/{id}/delete - Delete address
//! GET  /account/payments                   - Payment history
//!
//! # Auth
//! GET  /auth/login                         - Login page
//! POST /auth/login                         - Login action
//! GET  /auth/signup                        - Sign-up page
//! POST /auth/signup                        - Sign-up action
//! POST /auth/logout                        - Logout action
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod layout;
pub mod products;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::ConfigError;
use crate::middleware::{
    auth_rate_limiter, create_session_layer, csp_nonce_middleware, form_rate_limiter,
    request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`, relative to the crate root.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/signup", get(auth::signup_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/add", post(products::add))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items/{id}/increment", post(cart::increment))
        .route("/items/{id}/decrement", post(cart::decrement))
        .route("/items/{id}/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/", post(checkout::submit))
        .route("/coupon", post(checkout::apply_coupon))
        .layer(form_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .route("/success", get(checkout::success))
        .merge(limited)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route(
            "/addresses/{kind}",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{kind}/{id}", post(account::update_address))
        .route(
            "/addresses/{kind}/{id}/delete",
            post(account::delete_address),
        )
        .route("/payments", get(account::payments))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}

/// Build the full application: pages, health checks, static files and the
/// middleware stack (see [`crate::middleware`] for the order).
///
/// # Errors
///
/// Returns an error if the session layer cannot be built from the config.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let session_layer = create_session_layer(state.config())?;

    Ok(Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(axum_middleware::from_fn(csp_nonce_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}
