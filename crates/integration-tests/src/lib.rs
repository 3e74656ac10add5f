//! Integration test harness for the Marketstall storefront.
//!
//! The commerce API is replaced by a `wiremock` server and the full router
//! (middleware included) is driven in-process with `tower::ServiceExt`.
//!
//! ```rust,ignore
//! let app = TestApp::start().await;
//! let cookie = app.login().await;
//! let response = app.get("/cart", Some(&cookie)).await;
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketstall_storefront::config::{ApiConfig, PaymentsConfig, StorefrontConfig};
use marketstall_storefront::routes;
use marketstall_storefront::state::AppState;

/// Token the mocked login endpoint issues.
pub const TEST_TOKEN: &str = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b";

/// Session secret for tests: long and high-entropy enough to pass validation.
const TEST_SESSION_SECRET: &str =
    "q8Zk3vN1xR7pT5wY2bL9mC4hJ6dF0sG8aE3uK7nV1zX5cB2oQ9iW4yH6tM8rP0lD";

/// A storefront router wired to a mock commerce API.
pub struct TestApp {
    pub router: Router,
    pub api: MockServer,
}

impl TestApp {
    pub async fn start() -> Self {
        let api = MockServer::start().await;

        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from(TEST_SESSION_SECRET.to_string()),
            api: ApiConfig {
                base_url: Url::parse(&api.uri()).unwrap(),
                timeout: Duration::from_secs(5),
            },
            payments: PaymentsConfig {
                stripe_publishable_key: "pk_test_marketstall".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let state = AppState::new(config).unwrap();
        let router = routes::app(state).unwrap();

        Self { router, api }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            // Rate-limited routes key on the client address
            .header("x-forwarded-for", "203.0.113.10");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sign in as `shopper` and return the session cookie.
    pub async fn login(&self) -> String {
        Mock::given(method("POST"))
            .and(path("/rest-auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": TEST_TOKEN})))
            .mount(&self.api)
            .await;

        let response = self
            .post_form("/auth/login", "username=shopper&password=hunter22", None)
            .await;
        assert_eq!(location(&response), "/");
        session_cookie(&response).expect("login sets a session cookie")
    }

    /// Mount a GET endpoint answering with `body`.
    pub async fn mock_get(&self, endpoint: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.api)
            .await;
    }
}

/// `name=value` pair from the response's `Set-Cookie`, ready for a `Cookie`
/// header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("ms_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Redirect target of a response.
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product_summary_json() -> Value {
    json!({
        "id": 1,
        "title": "Phone 11 Pro",
        "price": 999.0,
        "discount_price": 899.5,
        "category": "Electronics",
        "label": "Best seller",
        "slug": "phone-11-pro",
        "description": "Pro camera system.",
        "image": "/media/phone.png"
    })
}

pub fn product_list_json() -> Value {
    json!([
        product_summary_json(),
        {
            "id": 2,
            "title": "Canvas Tote",
            "price": 25.0,
            "discount_price": null,
            "category": "Bags",
            "label": null,
            "slug": "canvas-tote",
            "description": "Sturdy everyday tote.",
            "image": null
        }
    ])
}

pub fn product_detail_json() -> Value {
    let mut detail = product_summary_json();
    let fields = detail.as_object_mut().unwrap();
    fields.insert(
        "long_description".to_string(),
        json!("A transformative triple-camera system."),
    );
    fields.insert(
        "options".to_string(),
        json!([
            {"id": 1, "name": "Color", "item_options": [
                {"id": 10, "value": "Midnight", "attachment": "/media/midnight.png"},
                {"id": 11, "value": "Silver", "attachment": null}
            ]},
            {"id": 2, "name": "Size", "item_options": [
                {"id": 20, "value": "64GB", "attachment": null},
                {"id": 21, "value": "256GB", "attachment": null}
            ]}
        ]),
    );
    detail
}

pub fn order_json() -> Value {
    json!({
        "id": 4,
        "order_items": [{
            "id": 7,
            "item": "Phone 11 Pro",
            "item_obj": product_summary_json(),
            "item_options": [
                {"id": 10, "value": "Midnight", "attachment": null, "option": {"id": 1, "name": "Color"}},
                {"id": 21, "value": "256GB", "attachment": null, "option": {"id": 2, "name": "Size"}}
            ],
            "quantity": 2,
            "final_price": 1799.0
        }],
        "total": 1789.0,
        "coupon": {"id": 1, "code": "TEN", "amount": 10.0}
    })
}

pub fn address_json(id: i64, kind: &str, default: bool) -> Value {
    json!({
        "id": id,
        "user": 3,
        "street_address": format!("{id} Main St"),
        "apartment_address": "",
        "country": "US",
        "zip": "10001",
        "address_type": kind,
        "default": default
    })
}
