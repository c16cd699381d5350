//! Integration tests for storefront routes.
//!
//! The router runs in-process with a configuration whose Shopify store is
//! never contacted, so only paths that answer without an API call are
//! covered here. Live tests against a running server are `#[ignore]`d.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use skeleton_core::{CartId, CartPersistence};
use skeleton_integration_tests::{body_text, send};
use skeleton_storefront::middleware::ClientStorage;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &'static str, fragment: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "198.51.100.7");
    if fragment {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::from(body)).unwrap()
}

/// `Cookie` header value carrying a cart record with `total_quantity`.
fn cart_record_cookie(total_quantity: u32) -> String {
    let mut storage = ClientStorage::default();
    let cart_id = CartId::new("gid://shopify/Cart/old-cart?key=k");
    assert!(CartPersistence::new(&mut storage).save_at(&cart_id, total_quantity, Utc::now()));
    storage.set_cookie_headers()[0]
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

// =============================================================================
// Health and Crawlers
// =============================================================================

#[tokio::test]
async fn test_health() {
    let response = send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_robots_txt_points_at_sitemap() {
    let response = send(get("/robots.txt")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );

    let body = body_text(response).await;
    assert!(body.contains("Disallow: /account"));
    assert!(body.contains("Sitemap: https://shop.example.com/sitemap.xml"));
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let response = send(get("/health")).await;
    let headers = response.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));
    let csp = headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
    assert!(csp.contains("https://skeleton-test.myshopify.com"));
}

// =============================================================================
// Cart Page
// =============================================================================

#[tokio::test]
async fn test_empty_cart_shows_call_to_action() {
    let response = send(get("/cart")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Your cart is empty"));
    assert!(body.contains("Continue shopping"));
    assert!(!body.contains("Restore that cart"));
}

#[tokio::test]
async fn test_stale_empty_record_does_not_prompt_recovery() {
    let request = Request::builder()
        .uri("/cart")
        .header(header::COOKIE, cart_record_cookie(0))
        .body(Body::empty())
        .unwrap();

    let body = body_text(send(request).await).await;
    assert!(body.contains("Your cart is empty"));
    assert!(!body.contains("Restore that cart"));
}

#[tokio::test]
async fn test_persisted_cart_prompts_recovery() {
    let request = Request::builder()
        .uri("/cart")
        .header(header::COOKIE, cart_record_cookie(3))
        .body(Body::empty())
        .unwrap();

    let body = body_text(send(request).await).await;
    assert!(body.contains("Restore that cart"));
    assert!(body.contains("3 items"));
}

#[tokio::test]
async fn test_cart_count_without_cart_is_empty() {
    let response = send(get("/cart/count")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.trim().is_empty());
}

#[tokio::test]
async fn test_dismiss_recovery_clears_cookie() {
    let mut request = post_form("/cart/recover/dismiss", "", false);
    request
        .headers_mut()
        .insert(header::COOKIE, cart_record_cookie(2).parse().unwrap());

    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/cart");

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|c| c.starts_with("hydrogen-cart-data=;") && c.contains("Max-Age=0"));
    assert!(cleared);
}

// =============================================================================
// Cart Mutations Without a Cart
// =============================================================================

#[tokio::test]
async fn test_update_without_cart_renders_fragment_with_message() {
    let response = send(post_form(
        "/cart/update",
        "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=2",
        true,
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["hx-trigger"], "cart-updated");
    let body = body_text(response).await;
    assert!(body.contains("Your cart has expired"));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn test_update_without_cart_renders_full_page_for_plain_post() {
    let response = send(post_form(
        "/cart/remove",
        "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1",
        false,
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<html"));
    assert!(body.contains("Your cart has expired"));
}

#[tokio::test]
async fn test_invalid_permalink_is_rejected() {
    let response = send(get("/cart/not-a-variant:1")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_without_cart_returns_to_cart() {
    let response = send(get("/checkout")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/cart");
}

// =============================================================================
// Account
// =============================================================================

#[tokio::test]
async fn test_account_redirects_to_orders() {
    let response = send(get("/account")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/account/orders");
}

#[tokio::test]
async fn test_orders_require_login() {
    let response = send(get("/account/orders?cursor=abc")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/account/login?return_to=%2Faccount%2Forders%3Fcursor%3Dabc"
    );
}

#[tokio::test]
async fn test_login_redirects_to_hosted_login_with_pkce() {
    let response = send(get("/account/login?return_to=%2Faccount%2Fprofile")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://shopify.com/1234567/auth/oauth/authorize?"));
    assert!(location.contains("code_challenge_method=S256"));
    assert!(location.contains(
        "redirect_uri=https%3A%2F%2Fshop.example.com%2Faccount%2Fauthorize"
    ));
    assert!(response.headers().contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn test_authorize_without_login_state_is_rejected() {
    let response = send(get("/account/authorize?code=abc&state=forged")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Live Server
// =============================================================================

fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
}

#[tokio::test]
#[ignore = "Requires running storefront server and Shopify credentials"]
async fn test_live_readiness_and_home() {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let ready = client
        .get(format!("{}/health/ready", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), 200);

    let home = client.get(storefront_url()).send().await.unwrap();
    assert_eq!(home.status(), 200);
    assert!(home.text().await.unwrap().contains("Recommended products"));
}
