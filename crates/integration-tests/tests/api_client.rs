//! `ApiClient` against a mocked commerce API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketstall_core::{AddressId, AddressType, ItemOptionId, ProductId, UserId};
use marketstall_integration_tests::{
    TEST_TOKEN, address_json, order_json, product_detail_json, product_list_json,
};
use marketstall_storefront::api::{AddressInput, ApiClient, ApiError, AuthToken};
use marketstall_storefront::config::ApiConfig;

async fn client() -> (ApiClient, MockServer) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&ApiConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    (client, server)
}

fn token() -> AuthToken {
    AuthToken::new(TEST_TOKEN.to_string())
}

#[tokio::test]
async fn test_login_returns_token() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/rest-auth/login/"))
        .and(body_json(json!({"username": "shopper", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": TEST_TOKEN})))
        .expect(1)
        .mount(&server)
        .await;

    let token = api.login("shopper", "hunter22").await.unwrap();
    assert_eq!(token, self::token());
}

#[tokio::test]
async fn test_login_rejection_carries_api_message() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/rest-auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "non_field_errors": ["Unable to log in with provided credentials."]
        })))
        .mount(&server)
        .await;

    let err = api.login("shopper", "wrong").await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "Unable to log in with provided credentials."
    );
}

#[tokio::test]
async fn test_signup_sends_both_passwords() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/rest-auth/registration/"))
        .and(body_json(json!({
            "username": "shopper",
            "email": "shopper@example.com",
            "password1": "hunter2hunter2",
            "password2": "hunter2hunter2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"key": TEST_TOKEN})))
        .expect(1)
        .mount(&server)
        .await;

    let token = api
        .signup(
            "shopper",
            "shopper@example.com",
            "hunter2hunter2",
            "hunter2hunter2",
        )
        .await
        .unwrap();
    assert_eq!(token, self::token());
}

#[tokio::test]
async fn test_products_list_and_detail() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/product-list/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_list_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_detail_json()))
        .mount(&server)
        .await;

    let products = api.list_products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].effective_price().display(), "$899.50");
    assert!(!products[1].label.is_visible());

    let detail = api.get_product(ProductId::new(1)).await.unwrap();
    assert_eq!(detail.options.len(), 2);
    assert_eq!(detail.options[1].item_options[1].value, "256GB");
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/products/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let err = api.get_product(ProductId::new(99)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_order_summary_sends_token() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/order-summary/"))
        .and(header("authorization", format!("Token {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json()))
        .expect(1)
        .mount(&server)
        .await;

    let order = api.order_summary(&token()).await.unwrap().unwrap();
    assert_eq!(order.item_count(), 1);
    assert_eq!(order.total.display(), "$1789.00");
    assert_eq!(order.order_items[0].options_summary(), "Color: Midnight, Size: 256GB");
}

#[tokio::test]
async fn test_order_summary_without_order_is_none() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/order-summary/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"message": "You do not have an active order"})),
        )
        .mount(&server)
        .await;

    assert!(api.order_summary(&token()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/payments/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})))
        .mount(&server)
        .await;

    let err = api.payments(&token()).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_add_to_cart_body() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/add-to-cart/"))
        .and(body_json(json!({"slug": "phone-11-pro", "options": [10, 21]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    api.add_to_cart(
        &token(),
        "phone-11-pro",
        &[ItemOptionId::new(10), ItemOptionId::new(21)],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_coupon_rejection_message() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/add-coupon/"))
        .and(body_json(json!({"code": "NOPE"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid data received"})))
        .mount(&server)
        .await;

    let err = api.add_coupon(&token(), "NOPE").await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(err.user_message(), "Invalid data received");
}

#[tokio::test]
async fn test_server_error_is_generic() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/checkout/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = api
        .checkout(
            &token(),
            &marketstall_storefront::api::CheckoutRequest {
                card_token: "tok_visa".to_string(),
                billing_address: AddressId::new(1),
                shipping_address: AddressId::new(2),
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_server_side());
}

#[tokio::test]
async fn test_addresses_filter_by_kind() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/address/list/"))
        .and(query_param("address_type", "S"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            address_json(5, "S", false),
            address_json(6, "S", true)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let addresses = api.addresses(&token(), AddressType::Shipping).await.unwrap();
    assert_eq!(addresses.len(), 2);
    assert_eq!(
        marketstall_storefront::api::default_address_id(&addresses),
        Some(AddressId::new(6))
    );
}

#[tokio::test]
async fn test_create_address_flat_body() {
    let (api, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/address/create/"))
        .and(body_json(json!({
            "user": 3,
            "address_type": "B",
            "street_address": "1 Main St",
            "apartment_address": "",
            "country": "US",
            "zip": "10001",
            "default": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(address_json(1, "B", true)))
        .expect(1)
        .mount(&server)
        .await;

    api.create_address(
        &token(),
        &AddressInput {
            user: UserId::new(3),
            address_type: AddressType::Billing,
            street_address: "1 Main St".to_string(),
            apartment_address: String::new(),
            country: "US".to_string(),
            zip: "10001".to_string(),
            default: true,
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_delete_address() {
    let (api, server) = client().await;

    Mock::given(method("DELETE"))
        .and(path("/api/address/5/delete/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    api.delete_address(&token(), AddressId::new(5)).await.unwrap();
}

#[tokio::test]
async fn test_countries_and_user_id() {
    let (api, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/country/list/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "US": "United States of America",
            "CA": "Canada"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/id/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userID": 3})))
        .mount(&server)
        .await;

    let countries = api.countries().await.unwrap();
    assert_eq!(countries[0].name, "Canada");
    assert_eq!(api.user_id(&token()).await.unwrap(), UserId::new(3));
}
