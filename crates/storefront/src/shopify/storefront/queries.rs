//! GraphQL documents and response DTOs for the Shopify Storefront API.
//!
//! Each operation pairs a query string with the `Deserialize` structs its
//! response data maps onto. Shared selections live in fragment macros so the
//! documents can be assembled with `concat!`.

use serde::{Deserialize, Serialize};

// =============================================================================
// Fragments
// =============================================================================

macro_rules! money_fields {
    () => {
        "amount currencyCode"
    };
}

macro_rules! image_fields {
    () => {
        "url altText width height"
    };
}

macro_rules! product_card_fragment {
    () => {
        concat!(
            "fragment ProductCard on Product {
  id
  handle
  title
  featuredImage { ",
            image_fields!(),
            " }
  priceRange { minVariantPrice { ",
            money_fields!(),
            " } }
}
"
        )
    };
}

macro_rules! page_info_fields {
    () => {
        "pageInfo { hasNextPage hasPreviousPage startCursor endCursor }"
    };
}

macro_rules! cart_fragment {
    () => {
        concat!(
            "fragment CartFields on Cart {
  id
  checkoutUrl
  updatedAt
  note
  totalQuantity
  cost {
    subtotalAmount { ",
            money_fields!(),
            " }
    totalAmount { ",
            money_fields!(),
            " }
    totalTaxAmount { ",
            money_fields!(),
            " }
  }
  discountCodes { code applicable }
  appliedGiftCards { lastCharacters amountUsed { ",
            money_fields!(),
            " } }
  lines(first: 100) {
    nodes {
      id
      quantity
      cost {
        amountPerQuantity { ",
            money_fields!(),
            " }
        compareAtAmountPerQuantity { ",
            money_fields!(),
            " }
        totalAmount { ",
            money_fields!(),
            " }
      }
      merchandise {
        ... on ProductVariant {
          id
          title
          selectedOptions { name value }
          image { ",
            image_fields!(),
            " }
          product { handle title }
        }
      }
    }
  }
}
"
        )
    };
}

macro_rules! cart_payload_fields {
    () => {
        "cart { ...CartFields }
    userErrors { field message code }"
    };
}

// =============================================================================
// Product Queries
// =============================================================================

pub const PRODUCT_BY_HANDLE: &str = concat!(
    "query GetProductByHandle($handle: String!) {
  product(handle: $handle) {
    id
    handle
    title
    vendor
    description
    descriptionHtml
    availableForSale
    seo { title description }
    priceRange { minVariantPrice { ",
    money_fields!(),
    " } }
    featuredImage { ",
    image_fields!(),
    " }
    images(first: 10) { nodes { ",
    image_fields!(),
    " } }
    options { name optionValues { name } }
    variants(first: 100) {
      nodes {
        id
        title
        availableForSale
        sku
        price { ",
    money_fields!(),
    " }
        compareAtPrice { ",
    money_fields!(),
    " }
        selectedOptions { name value }
        image { ",
    image_fields!(),
    " }
      }
    }
  }
}
"
);

pub const PRODUCTS: &str = concat!(
    "query GetProducts($first: Int!, $after: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
  products(first: $first, after: $after, sortKey: $sortKey, reverse: $reverse) {
    nodes { ...ProductCard }
    ",
    page_info_fields!(),
    "
  }
}
",
    product_card_fragment!()
);

pub const PRODUCT_RECOMMENDATIONS: &str = concat!(
    "query GetProductRecommendations($productId: ID!) {
  productRecommendations(productId: $productId) { ...ProductCard }
}
",
    product_card_fragment!()
);

// =============================================================================
// Collection Queries
// =============================================================================

pub const COLLECTIONS: &str = concat!(
    "query GetCollections($first: Int!, $after: String, $sortKey: CollectionSortKeys, $reverse: Boolean) {
  collections(first: $first, after: $after, sortKey: $sortKey, reverse: $reverse) {
    nodes { handle title image { ",
    image_fields!(),
    " } }
    ",
    page_info_fields!(),
    "
  }
}
"
);

pub const COLLECTION_BY_HANDLE: &str = concat!(
    "query GetCollectionByHandle($handle: String!, $first: Int!, $after: String) {
  collection(handle: $handle) {
    handle
    title
    description
    descriptionHtml
    seo { title description }
    image { ",
    image_fields!(),
    " }
    products(first: $first, after: $after) {
      nodes { ...ProductCard }
      ",
    page_info_fields!(),
    "
    }
  }
}
",
    product_card_fragment!()
);

// =============================================================================
// Content Queries
// =============================================================================

pub const PAGE_BY_HANDLE: &str = "query GetPage($handle: String!) {
  page(handle: $handle) {
    handle
    title
    body
    seo { title description }
  }
}
";

pub const POLICIES: &str = "query GetPolicies {
  shop {
    privacyPolicy { handle title body }
    refundPolicy { handle title body }
    shippingPolicy { handle title body }
    termsOfService { handle title body }
  }
}
";

pub const SITEMAP: &str = "query GetSitemap($first: Int!) {
  products(first: $first) { nodes { handle updatedAt } }
  collections(first: $first) { nodes { handle updatedAt } }
  pages(first: $first) { nodes { handle updatedAt } }
}
";

// =============================================================================
// Search Queries
// =============================================================================

pub const SEARCH: &str = concat!(
    "query Search($query: String!, $first: Int!, $after: String) {
  search(query: $query, first: $first, after: $after, types: [PRODUCT, PAGE, ARTICLE], unavailableProducts: LAST) {
    nodes {
      __typename
      ... on Product { ...ProductCard }
      ... on Page { handle title }
      ... on Article { handle title blog { handle } }
    }
    ",
    page_info_fields!(),
    "
  }
}
",
    product_card_fragment!()
);

pub const PREDICTIVE_SEARCH: &str = concat!(
    "query PredictiveSearch($query: String!, $limit: Int!) {
  predictiveSearch(query: $query, limit: $limit, types: [PRODUCT, COLLECTION, PAGE, ARTICLE, QUERY]) {
    products { ...ProductCard }
    collections { handle title image { ",
    image_fields!(),
    " } }
    pages { handle title }
    articles { handle title blog { handle } }
    queries { text }
  }
}
",
    product_card_fragment!()
);

// =============================================================================
// Cart Queries and Mutations
// =============================================================================

pub const GET_CART: &str = concat!(
    "query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
    cart_fragment!()
);

pub const CREATE_CART: &str = concat!(
    "mutation CreateCart($input: CartInput!) {
  payload: cartCreate(input: $input) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

pub const ADD_TO_CART: &str = concat!(
    "mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  payload: cartLinesAdd(cartId: $cartId, lines: $lines) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

pub const UPDATE_CART_LINES: &str = concat!(
    "mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  payload: cartLinesUpdate(cartId: $cartId, lines: $lines) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

pub const REMOVE_FROM_CART: &str = concat!(
    "mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  payload: cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

pub const UPDATE_DISCOUNT_CODES: &str = concat!(
    "mutation UpdateCartDiscountCodes($cartId: ID!, $discountCodes: [String!]!) {
  payload: cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

pub const UPDATE_GIFT_CARD_CODES: &str = concat!(
    "mutation UpdateCartGiftCardCodes($cartId: ID!, $giftCardCodes: [String!]!) {
  payload: cartGiftCardCodesUpdate(cartId: $cartId, giftCardCodes: $giftCardCodes) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

pub const UPDATE_NOTE: &str = concat!(
    "mutation UpdateCartNote($cartId: ID!, $note: String!) {
  payload: cartNoteUpdate(cartId: $cartId, note: $note) {
    ",
    cart_payload_fields!(),
    "
  }
}
",
    cart_fragment!()
);

// =============================================================================
// Shared DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyNode {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeoNode {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoNode {
    pub has_next_page: bool,
    #[serde(default)]
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// A connection selected with `nodes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
    #[serde(default)]
    pub page_info: PageInfoNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandleNode {
    pub handle: String,
}

// =============================================================================
// Product DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCardNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub featured_image: Option<ImageNode>,
    pub price_range: PriceRangeNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionValueNode {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOptionNode {
    pub name: String,
    pub option_values: Vec<OptionValueNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub sku: Option<String>,
    pub price: MoneyNode,
    pub compare_at_price: Option<MoneyNode>,
    pub selected_options: Vec<SelectedOptionNode>,
    pub image: Option<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub description: String,
    pub description_html: String,
    pub available_for_sale: bool,
    #[serde(default)]
    pub seo: SeoNode,
    pub price_range: PriceRangeNode,
    pub featured_image: Option<ImageNode>,
    pub images: Nodes<ImageNode>,
    pub options: Vec<ProductOptionNode>,
    pub variants: Nodes<VariantNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductByHandleData {
    pub product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: Nodes<ProductCardNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecommendationsData {
    pub product_recommendations: Option<Vec<ProductCardNode>>,
}

// =============================================================================
// Collection DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSummaryNode {
    pub handle: String,
    pub title: String,
    pub image: Option<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionNode {
    pub handle: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    #[serde(default)]
    pub seo: SeoNode,
    pub image: Option<ImageNode>,
    pub products: Nodes<ProductCardNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionsData {
    pub collections: Nodes<CollectionSummaryNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionByHandleData {
    pub collection: Option<CollectionNode>,
}

// =============================================================================
// Content DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PageNode {
    pub handle: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub seo: SeoNode,
}

#[derive(Debug, Deserialize)]
pub struct PageData {
    pub page: Option<PageNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyNode {
    pub handle: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPoliciesNode {
    pub privacy_policy: Option<PolicyNode>,
    pub refund_policy: Option<PolicyNode>,
    pub shipping_policy: Option<PolicyNode>,
    pub terms_of_service: Option<PolicyNode>,
}

#[derive(Debug, Deserialize)]
pub struct PoliciesData {
    pub shop: ShopPoliciesNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapNode {
    pub handle: String,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SitemapData {
    pub products: Nodes<SitemapNode>,
    pub collections: Nodes<SitemapNode>,
    pub pages: Nodes<SitemapNode>,
}

// =============================================================================
// Search DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleNode {
    pub handle: String,
    pub title: String,
    pub blog: HandleNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageHitNode {
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum SearchResultNode {
    Product(ProductCardNode),
    Page(PageHitNode),
    Article(ArticleNode),
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    pub search: Nodes<SearchResultNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySuggestionNode {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictiveNode {
    pub products: Vec<ProductCardNode>,
    pub collections: Vec<CollectionSummaryNode>,
    pub pages: Vec<PageHitNode>,
    pub articles: Vec<ArticleNode>,
    pub queries: Vec<QuerySuggestionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveSearchData {
    pub predictive_search: Option<PredictiveNode>,
}

// =============================================================================
// Cart DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostNode {
    pub subtotal_amount: MoneyNode,
    pub total_amount: MoneyNode,
    pub total_tax_amount: Option<MoneyNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCodeNode {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedGiftCardNode {
    pub last_characters: String,
    pub amount_used: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostNode {
    pub amount_per_quantity: MoneyNode,
    pub compare_at_amount_per_quantity: Option<MoneyNode>,
    pub total_amount: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseProductNode {
    pub handle: String,
    pub title: String,
}

/// Merchandise selected through `... on ProductVariant`; other merchandise
/// types deserialize with every field missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseNode {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionNode>,
    pub image: Option<ImageNode>,
    pub product: Option<MerchandiseProductNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineNode {
    pub id: String,
    pub quantity: u32,
    pub cost: CartLineCostNode,
    pub merchandise: MerchandiseNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: String,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub note: Option<String>,
    pub total_quantity: u32,
    pub cost: CartCostNode,
    pub discount_codes: Vec<DiscountCodeNode>,
    #[serde(default)]
    pub applied_gift_cards: Vec<AppliedGiftCardNode>,
    pub lines: Nodes<CartLineNode>,
}

#[derive(Debug, Deserialize)]
pub struct CartData {
    pub cart: Option<CartNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUserErrorNode {
    pub field: Option<Vec<String>>,
    pub message: String,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayloadNode {
    pub cart: Option<CartNode>,
    pub user_errors: Vec<CartUserErrorNode>,
}

/// Response of every cart mutation; each document aliases its root field
/// to `payload`.
#[derive(Debug, Deserialize)]
pub struct CartMutationData {
    pub payload: Option<CartPayloadNode>,
}

// =============================================================================
// Variables
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInputVar {
    pub merchandise_id: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInputVar {
    pub id: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInputVar {
    pub lines: Vec<CartLineInputVar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
