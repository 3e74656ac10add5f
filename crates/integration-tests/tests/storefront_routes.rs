//! Page flows through the full router against a mocked commerce API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use marketstall_integration_tests::{
    TestApp, body_text, location, order_json, product_detail_json, product_list_json,
    session_cookie,
};

#[tokio::test]
async fn test_health() {
    let app = TestApp::start().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_fails_when_api_is_down() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/api/product-list/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.api)
        .await;

    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_security_headers() {
    let app = TestApp::start().await;

    let response = app.get("/health", None).await;
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");

    let csp = headers["content-security-policy"].to_str().unwrap();
    assert!(csp.contains("'nonce-"));
    assert!(csp.contains("https://js.stripe.com"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_product_listing_shows_discount_and_badge() {
    let app = TestApp::start().await;
    app.mock_get("/api/product-list/", product_list_json()).await;

    let response = app.get("/products", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Phone 11 Pro"));
    assert!(body.contains("<s>$999.00</s> $899.50"));
    assert!(body.contains("Best seller"));
    assert!(body.contains("Canvas Tote"));
    assert!(body.contains("$25.00"));
    assert!(body.contains("href=\"/auth/login\""));
}

#[tokio::test]
async fn test_product_detail_lists_options() {
    let app = TestApp::start().await;
    app.mock_get("/api/products/1/", product_detail_json()).await;

    let response = app.get("/products/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("A transformative triple-camera system."));
    assert!(body.contains("name=\"option_2\""));
    assert!(body.contains("256GB"));
}

#[tokio::test]
async fn test_missing_product_is_404() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/42/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&app.api)
        .await;

    let response = app.get("/products/42", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = TestApp::start().await;

    let response = app.get("/cart", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Fcart");
}

#[tokio::test]
async fn test_login_then_cart() {
    let app = TestApp::start().await;
    app.mock_get("/api/order-summary/", order_json()).await;
    let cookie = app.login().await;

    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Welcome back"));
    assert!(body.contains("shopper"));
    assert!(body.contains("Color: Midnight, Size: 256GB"));
    assert!(body.contains("On discount"));
    assert!(body.contains("Coupon: TEN"));
    assert!(body.contains("$1789.00"));
}

#[tokio::test]
async fn test_login_redirects_to_next() {
    let app = TestApp::start().await;
    Mock::given(method("POST"))
        .and(path("/rest-auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "abc"})))
        .mount(&app.api)
        .await;

    let response = app
        .post_form(
            "/auth/login",
            "username=shopper&password=hunter22&next=%2Fcheckout",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout");
}

#[tokio::test]
async fn test_login_failure_flashes_api_message() {
    let app = TestApp::start().await;
    Mock::given(method("POST"))
        .and(path("/rest-auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "non_field_errors": ["Unable to log in with provided credentials."]
        })))
        .mount(&app.api)
        .await;

    let response = app
        .post_form("/auth/login", "username=shopper&password=wrong", None)
        .await;
    assert_eq!(location(&response), "/auth/login");
    let cookie = session_cookie(&response).unwrap();

    let body = body_text(app.get("/auth/login", Some(&cookie)).await).await;
    assert!(body.contains("class=\"flash flash-error\""));
    assert!(body.contains("Unable to log in with provided credentials."));
}

#[tokio::test]
async fn test_signup_validates_locally() {
    let app = TestApp::start().await;
    Mock::given(method("POST"))
        .and(path("/rest-auth/registration/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"key": "abc"})))
        .expect(0)
        .mount(&app.api)
        .await;

    let response = app
        .post_form(
            "/auth/signup",
            "username=shopper&email=shopper%40example.com&password=hunter2hunter2&password_confirm=different1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/signup");
}

#[tokio::test]
async fn test_add_to_cart_requires_every_option() {
    let app = TestApp::start().await;
    app.mock_get("/api/products/1/", product_detail_json()).await;
    Mock::given(method("POST"))
        .and(path("/api/add-to-cart/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.api)
        .await;
    let cookie = app.login().await;

    let response = app
        .post_form("/products/1/add", "option_1=10&option_2=", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products/1");

    let body = body_text(app.get("/products/1", Some(&cookie)).await).await;
    assert!(body.contains("role=\"status\">Select a size</div>"));
}

#[tokio::test]
async fn test_add_to_cart_sends_selection() {
    let app = TestApp::start().await;
    app.mock_get("/api/products/1/", product_detail_json()).await;
    Mock::given(method("POST"))
        .and(path("/api/add-to-cart/"))
        .and(wiremock::matchers::body_json(
            json!({"slug": "phone-11-pro", "options": [11, 20]}),
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.api)
        .await;
    let cookie = app.login().await;

    let response = app
        .post_form("/products/1/add", "option_2=20&option_1=11", Some(&cookie))
        .await;
    assert_eq!(location(&response), "/products/1");
}

#[tokio::test]
async fn test_rejected_token_signs_out() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/api/order-summary/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})))
        .mount(&app.api)
        .await;
    let cookie = app.login().await;

    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(location(&response), "/auth/login?next=%2Fcart");
}

#[tokio::test]
async fn test_checkout_without_order_goes_to_products() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/api/order-summary/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"message": "You do not have an active order"})),
        )
        .mount(&app.api)
        .await;
    let cookie = app.login().await;

    let response = app.get("/checkout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products");
}

#[tokio::test]
async fn test_empty_coupon_is_not_sent() {
    let app = TestApp::start().await;
    app.mock_get("/api/product-list/", product_list_json()).await;
    Mock::given(method("POST"))
        .and(path("/api/add-coupon/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.api)
        .await;
    let cookie = app.login().await;

    let response = app
        .post_form("/checkout/coupon", "code=+", Some(&cookie))
        .await;
    assert_eq!(location(&response), "/checkout");

    let body = body_text(app.get("/products", Some(&cookie)).await).await;
    assert!(body.contains("role=\"status\">Please enter a coupon code</div>"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::start().await;
    Mock::given(method("POST"))
        .and(path("/rest-auth/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "Successfully logged out."})))
        .expect(1)
        .mount(&app.api)
        .await;
    let cookie = app.login().await;

    let response = app.post_form("/auth/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(location(&response), "/auth/login?next=%2Fcart");
}
