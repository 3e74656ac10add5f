//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Start locked down and loosen only when specific functionality requires
//! it. The card form needs Stripe's script, frames and API; product media is
//! served from the commerce API's origin.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;
use crate::state::AppState;

const STRIPE_JS: &str = "https://js.stripe.com";
const STRIPE_HOOKS: &str = "https://hooks.stripe.com";
const STRIPE_API: &str = "https://api.stripe.com";

/// Build the Content-Security-Policy for one response.
///
/// ```text
/// default-src 'none';
/// script-src 'self' 'nonce-<nonce>' https://js.stripe.com;
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' <media origin> https://*.stripe.com;
/// connect-src 'self' https://api.stripe.com;
/// frame-src https://js.stripe.com https://hooks.stripe.com;
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none'
/// ```
#[must_use]
pub fn content_security_policy(nonce: &str, media_origin: &str) -> String {
    let script_nonce = if nonce.is_empty() {
        String::new()
    } else {
        format!(" 'nonce-{nonce}'")
    };

    format!(
        "default-src 'none'; \
         script-src 'self'{script_nonce} {STRIPE_JS}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' {media_origin} https://*.stripe.com; \
         connect-src 'self' {STRIPE_API}; \
         frame-src {STRIPE_JS} {STRIPE_HOOKS}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: same-origin` (Stripe needs nothing from us)
/// - `Content-Security-Policy` from [`content_security_policy`]
/// - `Permissions-Policy` denying sensitive features except `payment` for
///   ourselves and Stripe
/// - `Cache-Control: no-store` (pages embed cart and account data)
/// - `Cross-Origin-Opener-Policy` / `Cross-Origin-Resource-Policy: same-origin`
///
/// No `Cross-Origin-Embedder-Policy`: `require-corp` would block the Stripe
/// card frame.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string())
        .unwrap_or_default();
    let media_origin = state.config().api.origin();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    match HeaderValue::from_str(&content_security_policy(&nonce, &media_origin)) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid CSP header value");
        }
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(self \"https://js.stripe.com\"), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_admits_stripe_and_media() {
        let csp = content_security_policy("abc=", "http://127.0.0.1:8000");
        assert!(csp.contains("script-src 'self' 'nonce-abc=' https://js.stripe.com;"));
        assert!(csp.contains("img-src 'self' http://127.0.0.1:8000 https://*.stripe.com;"));
        assert!(csp.contains("frame-src https://js.stripe.com https://hooks.stripe.com;"));
        assert!(csp.contains("connect-src 'self' https://api.stripe.com;"));
        assert!(csp.ends_with("frame-ancestors 'none'"));
    }

    #[test]
    fn test_csp_without_nonce() {
        let csp = content_security_policy("", "https://api.shop.test");
        assert!(csp.contains("script-src 'self' https://js.stripe.com;"));
    }
}
