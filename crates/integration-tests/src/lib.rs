//! Integration tests for the Skeleton storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Offline tests (router driven in-process, no Shopify calls)
//! cargo test -p skeleton-integration-tests
//!
//! # Live tests against a running storefront
//! STOREFRONT_URL=http://127.0.0.1:3000 cargo test -p skeleton-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - The `hydrogen-cart-data` record through cookie storage
//! - `optimistic_cart` - Request coalescing and reconciliation
//! - `storefront_routes` - Router behaviour that needs no Shopify response

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use secrecy::SecretString;
use skeleton_storefront::config::{ShopifyStorefrontConfig, StorefrontConfig};
use skeleton_storefront::state::AppState;
use tower::ServiceExt;

/// Configuration pointing at a store that is never contacted.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap_or(std::net::Ipv4Addr::LOCALHOST.into()),
        port: 0,
        base_url: "https://shop.example.com".to_string(),
        shopify: ShopifyStorefrontConfig {
            store: "skeleton-test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_public_token: "public-test-token".to_string(),
            storefront_private_token: SecretString::from("private-test-token"),
            customer_shop_id: "1234567".to_string(),
            customer_client_id: "shp_test_client".to_string(),
            customer_client_secret: SecretString::from("customer-test-secret"),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The full storefront router over [`test_config`].
#[must_use]
pub fn test_app() -> Router {
    skeleton_storefront::app(AppState::new(test_config()))
}

/// Send one request through a fresh router.
///
/// # Panics
///
/// Panics if the router fails, which the storefront's infallible services
/// never do.
pub async fn send(request: Request<Body>) -> Response<Body> {
    #[allow(clippy::expect_used)]
    test_app()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// Collect a response body as UTF-8 text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    #[allow(clippy::expect_used)]
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    #[allow(clippy::expect_used)]
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
