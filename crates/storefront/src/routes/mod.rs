//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (Storefront API reachable)
//!
//! # Catalog
//! GET  /products/{handle}          - Product detail (?Color=Red selects a variant)
//! GET  /collections                - Collection listing (?cursor=)
//! GET  /collections/all            - Every product (?cursor=)
//! GET  /collections/{handle}       - Collection detail (?cursor=)
//! GET  /pages/{handle}             - Content page
//! GET  /policies                   - Policy listing
//! GET  /policies/{handle}          - Policy page
//! GET  /search                     - Search results (?q=&cursor=)
//! GET  /search/predictive          - Predictive search fragment (?q=)
//!
//! # Cart (fragments for HX-Request, redirects otherwise)
//! GET  /cart                       - Cart page
//! GET  /cart/count                 - Cart count badge (fragment)
//! POST /cart/add                   - Add line
//! POST /cart/update                - Update line quantity
//! POST /cart/remove                - Remove line
//! POST /cart/discount-codes        - Add or remove a discount code
//! POST /cart/gift-card-codes       - Apply a gift card
//! POST /cart/note                  - Set the cart note
//! POST /cart/recover               - Restore the persisted cart
//! POST /cart/recover/dismiss       - Forget the persisted cart
//! GET  /cart/{lines}               - Permalink (variant:qty,...?discount=)
//! GET  /discount/{code}            - Apply discount and redirect (?redirect=)
//! GET  /checkout                   - Redirect to Shopify checkout
//!
//! # Customer Account OAuth
//! GET  /account/login              - Redirect to Shopify login (?return_to=)
//! GET  /account/authorize          - OAuth callback
//! POST /account/logout             - Logout
//!
//! # Account (requires login)
//! GET  /account                    - Redirect to orders
//! GET  /account/orders             - Order history (?cursor=)
//! GET  /account/orders/{id}        - Order detail
//! GET  /account/profile            - Profile form
//! POST /account/profile            - Update profile
//! GET  /account/addresses          - Address book
//! POST /account/addresses          - Create address
//! POST /account/addresses/{id}     - Update address
//! POST /account/addresses/{id}/delete - Delete address
//!
//! # Crawlers
//! GET  /sitemap.xml
//! GET  /robots.txt
//! ```

pub mod account;
pub mod cart;
pub mod collections;
pub mod home;
pub mod pages;
pub mod products;
pub mod search;
pub mod seo;
pub mod shopify_auth;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::warn;

use crate::middleware::{cart_rate_limiter, search_rate_limiter};
use crate::state::AppState;

/// `?cursor=` for forward pagination.
#[derive(Debug, Default, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<String>,
}

impl CursorQuery {
    /// The cursor, ignoring empty values.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the Storefront API is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.storefront().get_policies().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products/{handle}", get(products::show))
        .route("/collections", get(collections::index))
        .route("/collections/all", get(collections::all))
        .route("/collections/{handle}", get(collections::show))
        .route("/pages/{handle}", get(pages::show))
        .route("/policies", get(pages::policies))
        .route("/policies/{handle}", get(pages::policy))
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search))
        .route("/search/predictive", get(search::predictive))
        .layer(search_rate_limiter())
}

/// Create the cart page routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/count", get(cart::count))
        .route("/cart/{lines}", get(cart::permalink))
        .route("/discount/{code}", get(cart::discount))
        .route("/checkout", get(cart::checkout))
}

/// Create the cart mutation routes router.
pub fn cart_mutation_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
        .route("/cart/discount-codes", post(cart::discount_codes))
        .route("/cart/gift-card-codes", post(cart::gift_card_codes))
        .route("/cart/note", post(cart::note))
        .route("/cart/recover", post(cart::recover))
        .route("/cart/recover/dismiss", post(cart::dismiss_recovery))
        .layer(cart_rate_limiter())
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        // Shopify Customer Account OAuth
        .route("/login", get(shopify_auth::login))
        .route("/authorize", get(shopify_auth::authorize))
        .route("/logout", post(shopify_auth::logout))
        // Customer pages
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(catalog_routes())
        .merge(search_routes())
        .merge(cart_routes())
        .merge(cart_mutation_routes())
        .nest("/account", account_routes())
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/robots.txt", get(seo::robots))
}
