//! Cache types for Storefront API responses.

use std::sync::Arc;

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Collection, CollectionSummary, Connection, Page, Policy, PredictiveResults, Product,
    ProductCard, SitemapData,
};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Connection<ProductCard>),
    Recommendations(Vec<ProductCard>),
    Collection(Box<Collection>),
    Collections(Connection<CollectionSummary>),
    Page(Box<Page>),
    Policies(Vec<Policy>),
    Predictive(Box<PredictiveResults>),
    Sitemap(Box<SitemapData>),
}

/// Recover an owned error from a failed coalesced load.
///
/// Every caller waiting on the same key receives the same `Arc`, so variants
/// that carry non-cloneable sources collapse into a message.
pub fn shared_error(error: Arc<ShopifyError>) -> ShopifyError {
    match &*error {
        ShopifyError::NotFound(what) => ShopifyError::NotFound(what.clone()),
        ShopifyError::RateLimited(seconds) => ShopifyError::RateLimited(*seconds),
        ShopifyError::UserError(message) => ShopifyError::UserError(message.clone()),
        other => ShopifyError::message(other.to_string()),
    }
}

/// Error for a cache entry holding an unexpected variant.
pub fn mismatch(key: &str) -> ShopifyError {
    ShopifyError::message(format!("Unexpected cached value for {key}"))
}
