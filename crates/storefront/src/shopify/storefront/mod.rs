//! Shopify Storefront API client implementation.
//!
//! Requests use the `graphql_client` envelope (`QueryBody` / `Response`) with
//! `reqwest` 0.13 for HTTP. Catalog reads are cached with `moka` (5-minute
//! TTL); concurrent loads of the same key share one upstream request.

mod cache;
mod conversions;
pub mod queries;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use graphql_client::{QueryBody, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use skeleton_core::{CartId, CartLineId, ProductId};
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, CollectionSummary, Connection, Page,
    Policy, PredictiveResults, Product, ProductCard, SearchResults, SitemapData,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheValue, mismatch, shared_error};
use conversions::{
    convert_cart, convert_collection, convert_collection_summaries, convert_page, convert_page_info,
    convert_policies, convert_predictive, convert_product, convert_product_cards, convert_search,
    convert_sitemap, user_errors_message,
};
use queries::{
    CartData, CartInputVar, CartLineInputVar, CartLineUpdateInputVar, CartMutationData,
    CollectionByHandleData, CollectionsData, PageData, PoliciesData, PredictiveSearchData,
    ProductByHandleData, ProductRecommendationsData, ProductsData, SearchData,
};

/// Maximum handles fetched per sitemap section.
const SITEMAP_PAGE_SIZE: i64 = 250;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides typed access to products, collections, content, search, and
/// cart operations. Catalog responses are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    store: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                store: config.store.clone(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation and return its `data`.
    async fn execute<V, T>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<T, ShopifyError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let request_body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                operation = operation_name,
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<T> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    operation = operation_name,
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(operation = operation_name, errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| GraphQLErrorLocation {
                                    line: i64::from(l.line),
                                    column: i64::from(l.column),
                                })
                                .collect()
                        }),
                        path: e.path.map_or_else(Vec::new, |p| {
                            p.into_iter()
                                .map(|fragment| match fragment {
                                    graphql_client::PathFragment::Key(s) => {
                                        serde_json::Value::String(s)
                                    }
                                    graphql_client::PathFragment::Index(i) => {
                                        serde_json::Value::Number(i.into())
                                    }
                                })
                                .collect()
                        }),
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    /// Load through the cache; concurrent callers for `key` share one load.
    async fn cached<F>(&self, key: &str, load: F) -> Result<CacheValue, ShopifyError>
    where
        F: Future<Output = Result<CacheValue, ShopifyError>>,
    {
        self.inner
            .cache
            .try_get_with(key.to_string(), load)
            .await
            .map_err(shared_error)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let key = format!("product:{handle}");

        let value = self
            .cached(&key, async {
                let data: ProductByHandleData = self
                    .execute(
                        "GetProductByHandle",
                        queries::PRODUCT_BY_HANDLE,
                        json!({ "handle": handle }),
                    )
                    .await?;
                let product = data
                    .product
                    .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;
                Ok::<_, ShopifyError>(CacheValue::Product(Box::new(convert_product(product)?)))
            })
            .await?;

        match value {
            CacheValue::Product(product) => Ok(*product),
            _ => Err(mismatch(&key)),
        }
    }

    /// Get a page of all products in the store's default order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Connection<ProductCard>, ShopifyError> {
        self.product_page(first, after, None, false).await
    }

    /// Most recently updated products, used for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_recent_products(&self, first: i64) -> Result<Vec<ProductCard>, ShopifyError> {
        Ok(self
            .product_page(first, None, Some("UPDATED_AT"), true)
            .await?
            .items)
    }

    async fn product_page(
        &self,
        first: i64,
        after: Option<&str>,
        sort_key: Option<&'static str>,
        reverse: bool,
    ) -> Result<Connection<ProductCard>, ShopifyError> {
        let key = format!(
            "products:{first}:{}:{}:{reverse}",
            after.unwrap_or(""),
            sort_key.unwrap_or("")
        );

        let value = self
            .cached(&key, async {
                let data: ProductsData = self
                    .execute(
                        "GetProducts",
                        queries::PRODUCTS,
                        json!({
                            "first": first,
                            "after": after,
                            "sortKey": sort_key,
                            "reverse": reverse,
                        }),
                    )
                    .await?;
                Ok::<_, ShopifyError>(CacheValue::Products(Connection {
                    items: convert_product_cards(data.products.nodes)?,
                    page_info: convert_page_info(data.products.page_info),
                }))
            })
            .await?;

        match value {
            CacheValue::Products(products) => Ok(products),
            _ => Err(mismatch(&key)),
        }
    }

    /// Get product recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<ProductCard>, ShopifyError> {
        let key = format!("recommendations:{product_id}");

        let value = self
            .cached(&key, async {
                let data: ProductRecommendationsData = self
                    .execute(
                        "GetProductRecommendations",
                        queries::PRODUCT_RECOMMENDATIONS,
                        json!({ "productId": product_id }),
                    )
                    .await?;
                Ok::<_, ShopifyError>(CacheValue::Recommendations(convert_product_cards(
                    data.product_recommendations.unwrap_or_default(),
                )?))
            })
            .await?;

        match value {
            CacheValue::Recommendations(products) => Ok(products),
            _ => Err(mismatch(&key)),
        }
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection by its handle with one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: i64,
        after: Option<&str>,
    ) -> Result<Collection, ShopifyError> {
        let key = format!("collection:{handle}:{first}:{}", after.unwrap_or(""));

        let value = self
            .cached(&key, async {
                let data: CollectionByHandleData = self
                    .execute(
                        "GetCollectionByHandle",
                        queries::COLLECTION_BY_HANDLE,
                        json!({ "handle": handle, "first": first, "after": after }),
                    )
                    .await?;
                let collection = data.collection.ok_or_else(|| {
                    ShopifyError::NotFound(format!("Collection not found: {handle}"))
                })?;
                Ok::<_, ShopifyError>(CacheValue::Collection(Box::new(convert_collection(
                    collection,
                )?)))
            })
            .await?;

        match value {
            CacheValue::Collection(collection) => Ok(*collection),
            _ => Err(mismatch(&key)),
        }
    }

    /// Get a page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Connection<CollectionSummary>, ShopifyError> {
        self.collection_page(first, after, None, false).await
    }

    /// The most recently updated collection, featured on the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_featured_collection(
        &self,
    ) -> Result<Option<CollectionSummary>, ShopifyError> {
        Ok(self
            .collection_page(1, None, Some("UPDATED_AT"), true)
            .await?
            .items
            .into_iter()
            .next())
    }

    async fn collection_page(
        &self,
        first: i64,
        after: Option<&str>,
        sort_key: Option<&'static str>,
        reverse: bool,
    ) -> Result<Connection<CollectionSummary>, ShopifyError> {
        let key = format!(
            "collections:{first}:{}:{}:{reverse}",
            after.unwrap_or(""),
            sort_key.unwrap_or("")
        );

        let value = self
            .cached(&key, async {
                let data: CollectionsData = self
                    .execute(
                        "GetCollections",
                        queries::COLLECTIONS,
                        json!({
                            "first": first,
                            "after": after,
                            "sortKey": sort_key,
                            "reverse": reverse,
                        }),
                    )
                    .await?;
                Ok::<_, ShopifyError>(CacheValue::Collections(Connection {
                    items: convert_collection_summaries(data.collections.nodes),
                    page_info: convert_page_info(data.collections.page_info),
                }))
            })
            .await?;

        match value {
            CacheValue::Collections(collections) => Ok(collections),
            _ => Err(mismatch(&key)),
        }
    }

    // =========================================================================
    // Content Methods
    // =========================================================================

    /// Get a CMS page by handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_page(&self, handle: &str) -> Result<Page, ShopifyError> {
        let key = format!("page:{handle}");

        let value = self
            .cached(&key, async {
                let data: PageData = self
                    .execute(
                        "GetPage",
                        queries::PAGE_BY_HANDLE,
                        json!({ "handle": handle }),
                    )
                    .await?;
                let page = data
                    .page
                    .ok_or_else(|| ShopifyError::NotFound(format!("Page not found: {handle}")))?;
                Ok::<_, ShopifyError>(CacheValue::Page(Box::new(convert_page(page))))
            })
            .await?;

        match value {
            CacheValue::Page(page) => Ok(*page),
            _ => Err(mismatch(&key)),
        }
    }

    /// Get every configured shop policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_policies(&self) -> Result<Vec<Policy>, ShopifyError> {
        let key = "policies";

        let value = self
            .cached(key, async {
                let data: PoliciesData = self
                    .execute("GetPolicies", queries::POLICIES, json!({}))
                    .await?;
                Ok::<_, ShopifyError>(CacheValue::Policies(convert_policies(data.shop)))
            })
            .await?;

        match value {
            CacheValue::Policies(policies) => Ok(policies),
            _ => Err(mismatch(key)),
        }
    }

    /// Get one shop policy by handle (e.g., `privacy-policy`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the shop has no such policy.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_policy(&self, handle: &str) -> Result<Policy, ShopifyError> {
        self.get_policies()
            .await?
            .into_iter()
            .find(|p| p.handle == handle)
            .ok_or_else(|| ShopifyError::NotFound(format!("Policy not found: {handle}")))
    }

    /// Handles for the sitemap.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_sitemap(&self) -> Result<SitemapData, ShopifyError> {
        let key = "sitemap";

        let value = self
            .cached(key, async {
                let data: queries::SitemapData = self
                    .execute(
                        "GetSitemap",
                        queries::SITEMAP,
                        json!({ "first": SITEMAP_PAGE_SIZE }),
                    )
                    .await?;
                Ok::<_, ShopifyError>(CacheValue::Sitemap(Box::new(convert_sitemap(data))))
            })
            .await?;

        match value {
            CacheValue::Sitemap(sitemap) => Ok(*sitemap),
            _ => Err(mismatch(key)),
        }
    }

    // =========================================================================
    // Search Methods
    // =========================================================================

    /// Full search across products, pages, and articles.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        first: i64,
        after: Option<&str>,
    ) -> Result<SearchResults, ShopifyError> {
        let data: SearchData = self
            .execute(
                "Search",
                queries::SEARCH,
                json!({ "query": query, "first": first, "after": after }),
            )
            .await?;

        convert_search(data.search, &self.inner.store)
    }

    /// Predictive search. Identical concurrent queries (after trimming and
    /// lowercasing) share a single upstream request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn predictive_search(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<PredictiveResults, ShopifyError> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(PredictiveResults::default());
        }
        let key = format!("predictive:{limit}:{normalized}");

        let value = self
            .cached(&key, async {
                let data: PredictiveSearchData = self
                    .execute(
                        "PredictiveSearch",
                        queries::PREDICTIVE_SEARCH,
                        json!({ "query": normalized, "limit": limit }),
                    )
                    .await?;
                let results = match data.predictive_search {
                    Some(node) => convert_predictive(node, &self.inner.store)?,
                    None => PredictiveResults::default(),
                };
                Ok::<_, ShopifyError>(CacheValue::Predictive(Box::new(results)))
            })
            .await?;

        match value {
            CacheValue::Predictive(results) => Ok(*results),
            _ => Err(mismatch(&key)),
        }
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Run a cart mutation whose root field is aliased to `payload`.
    async fn cart_mutation(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: serde_json::Value,
    ) -> Result<Cart, ShopifyError> {
        let data: CartMutationData = self.execute(operation_name, query, variables).await?;

        if let Some(payload) = data.payload {
            if !payload.user_errors.is_empty() {
                debug!(operation = operation_name, errors = ?payload.user_errors, "Cart user errors");
                return Err(ShopifyError::UserError(user_errors_message(
                    payload.user_errors,
                )));
            }

            if let Some(cart) = payload.cart {
                return convert_cart(cart);
            }
        }

        Err(ShopifyError::message(format!(
            "{operation_name} returned no cart"
        )))
    }

    /// Create a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        note: Option<String>,
    ) -> Result<Cart, ShopifyError> {
        let input = CartInputVar {
            lines: lines.into_iter().map(line_input_var).collect(),
            note,
        };

        self.cart_mutation(
            "CreateCart",
            queries::CREATE_CART,
            json!({ "input": input }),
        )
        .await
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart no longer exists, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ShopifyError> {
        let data: CartData = self
            .execute("GetCart", queries::GET_CART, json!({ "cartId": cart_id }))
            .await?;

        data.cart
            .map(convert_cart)
            .transpose()?
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let lines: Vec<_> = lines.into_iter().map(line_input_var).collect();
        self.cart_mutation(
            "AddToCart",
            queries::ADD_TO_CART,
            json!({ "cartId": cart_id, "lines": lines }),
        )
        .await
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let lines: Vec<_> = lines
            .into_iter()
            .map(|line| CartLineUpdateInputVar {
                id: line.id.into_inner(),
                quantity: line.quantity,
            })
            .collect();
        self.cart_mutation(
            "UpdateCartLines",
            queries::UPDATE_CART_LINES,
            json!({ "cartId": cart_id, "lines": lines }),
        )
        .await
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        self.cart_mutation(
            "RemoveFromCart",
            queries::REMOVE_FROM_CART,
            json!({ "cartId": cart_id, "lineIds": line_ids }),
        )
        .await
    }

    /// Replace the discount codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, discount_codes), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &CartId,
        discount_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        self.cart_mutation(
            "UpdateCartDiscountCodes",
            queries::UPDATE_DISCOUNT_CODES,
            json!({ "cartId": cart_id, "discountCodes": discount_codes }),
        )
        .await
    }

    /// Replace the gift card codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, gift_card_codes), fields(cart_id = %cart_id))]
    pub async fn update_gift_card_codes(
        &self,
        cart_id: &CartId,
        gift_card_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        self.cart_mutation(
            "UpdateCartGiftCardCodes",
            queries::UPDATE_GIFT_CARD_CODES,
            json!({ "cartId": cart_id, "giftCardCodes": gift_card_codes }),
        )
        .await
    }

    /// Update the cart note.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, note), fields(cart_id = %cart_id))]
    pub async fn update_cart_note(&self, cart_id: &CartId, note: &str) -> Result<Cart, ShopifyError> {
        self.cart_mutation(
            "UpdateCartNote",
            queries::UPDATE_NOTE,
            json!({ "cartId": cart_id, "note": note }),
        )
        .await
    }
}

fn line_input_var(line: CartLineInput) -> CartLineInputVar {
    CartLineInputVar {
        merchandise_id: line.merchandise_id.into_inner(),
        quantity: line.quantity,
    }
}
