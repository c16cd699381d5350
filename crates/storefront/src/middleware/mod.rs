//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Security headers (CSP, frame and isolation policies)
//! 6. Rate limiting (governor) on cart mutations and search
//!
//! Extractors: [`ClientStorage`] for the browser-held cart record,
//! [`RequireShopifyCustomer`] for account pages.

pub mod client_storage;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod shopify_customer;

pub use client_storage::ClientStorage;
pub use rate_limit::{cart_rate_limiter, search_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use shopify_customer::{
    RequireShopifyCustomer, clear_shopify_customer_token, set_shopify_customer_token,
};
