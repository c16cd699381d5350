//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::filters;
use crate::shopify::types::{CollectionSummary, ProductCard};
use crate::state::AppState;

/// Products shown under "New arrivals".
const RECOMMENDED_PRODUCTS: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured_collection: Option<CollectionSummary>,
    pub products: Vec<ProductCard>,
}

/// Display the home page: the featured collection and the newest products.
///
/// A missing featured collection only hides its banner.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let (featured, products) = tokio::join!(
        state.storefront().get_featured_collection(),
        state.storefront().get_recent_products(RECOMMENDED_PRODUCTS),
    );

    let featured_collection = featured.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load featured collection");
        None
    });

    Ok(HomeTemplate {
        featured_collection,
        products: products?,
    })
}
