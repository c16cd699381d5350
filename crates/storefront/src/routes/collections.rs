//! Collection route handlers.
//!
//! Listings paginate forward with Shopify cursors: `?cursor=<endCursor>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use super::CursorQuery;
use crate::error::{AppError, Result};
use crate::filters;
use crate::shopify::types::{Collection, CollectionSummary, Connection, ProductCard};
use crate::state::AppState;

/// Collections per listing page.
const COLLECTIONS_PER_PAGE: i64 = 12;

/// Products per collection page.
const PRODUCTS_PER_PAGE: i64 = 24;

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub collections: Connection<CollectionSummary>,
    pub is_first_page: bool,
}

/// Collection detail page template, also used for `/collections/all`.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub handle: String,
    pub title: String,
    pub description_html: String,
    pub seo_description: Option<String>,
    pub products: Connection<ProductCard>,
    pub is_first_page: bool,
}

impl CollectionShowTemplate {
    fn from_collection(collection: Collection, is_first_page: bool) -> Self {
        Self {
            seo_description: collection
                .seo
                .description
                .or_else(|| (!collection.description.is_empty()).then_some(collection.description)),
            handle: collection.handle,
            title: collection.title,
            description_html: collection.description_html,
            products: collection.products,
            is_first_page,
        }
    }
}

/// Display collection listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> Result<CollectionsIndexTemplate> {
    let collections = state
        .storefront()
        .get_collections(COLLECTIONS_PER_PAGE, query.cursor())
        .await?;

    Ok(CollectionsIndexTemplate {
        collections,
        is_first_page: query.cursor().is_none(),
    })
}

/// Display every product in the catalog.
#[instrument(skip(state))]
pub async fn all(
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> Result<CollectionShowTemplate> {
    let products = state
        .storefront()
        .get_products(PRODUCTS_PER_PAGE, query.cursor())
        .await?;

    Ok(CollectionShowTemplate {
        handle: "all".to_string(),
        title: "All products".to_string(),
        description_html: String::new(),
        seo_description: None,
        products,
        is_first_page: query.cursor().is_none(),
    })
}

/// Display collection detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Result<CollectionShowTemplate> {
    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, PRODUCTS_PER_PAGE, query.cursor())
        .await
        .map_err(AppError::from_lookup)?;

    Ok(CollectionShowTemplate::from_collection(
        collection,
        query.cursor().is_none(),
    ))
}
