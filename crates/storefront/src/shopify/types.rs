//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the per-query
//! response DTOs. IDs are typed GIDs and prices are parsed [`Money`] values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skeleton_core::{
    CartId, CartLineId, CartSnapshot, LineSnapshot, MerchandiseId, Money, ProductId,
};

// =============================================================================
// Shared Types
// =============================================================================

/// Product, collection, or article image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

/// SEO metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seo {
    /// Page title for search engines.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
}

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    pub has_previous_page: bool,
    /// Cursor for the first item.
    pub start_cursor: Option<String>,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

/// A page of results with its pagination info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Pagination info.
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// An empty page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            page_info: PageInfo::default(),
        }
    }
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Product option definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID (cart merchandise ID).
    pub id: MerchandiseId,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// SKU code.
    pub sku: Option<String>,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Money>,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
}

impl ProductVariant {
    /// Whether every given option matches this variant's selection.
    #[must_use]
    pub fn matches(&self, selection: &[SelectedOption]) -> bool {
        selection
            .iter()
            .all(|wanted| self.selected_options.iter().any(|o| o == wanted))
    }
}

/// A product in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Vendor name.
    pub vendor: String,
    /// Plain text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// Whether any variant is available.
    pub available_for_sale: bool,
    /// SEO metadata.
    pub seo: Seo,
    /// Lowest variant price.
    pub min_price: Money,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// All product images.
    pub images: Vec<Image>,
    /// Product options.
    pub options: Vec<ProductOption>,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// The variant matching `selection`, else the first available variant,
    /// else the first variant.
    #[must_use]
    pub fn selected_variant(&self, selection: &[SelectedOption]) -> Option<&ProductVariant> {
        if !selection.is_empty()
            && let Some(variant) = self.variants.iter().find(|v| v.matches(selection))
        {
            return Some(variant);
        }

        self.variants
            .iter()
            .find(|v| v.available_for_sale)
            .or_else(|| self.variants.first())
    }
}

/// Compact product used in grids, search results, and recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCard {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Lowest variant price.
    pub min_price: Money,
    /// Featured image.
    pub featured_image: Option<Image>,
}

// =============================================================================
// Collection Types
// =============================================================================

/// Collection as shown in the collection index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Collection image.
    pub image: Option<Image>,
}

/// A collection with one page of its products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// SEO metadata.
    pub seo: Seo,
    /// Collection image.
    pub image: Option<Image>,
    /// Products in this page.
    pub products: Connection<ProductCard>,
}

// =============================================================================
// Content Types
// =============================================================================

/// An online store page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// URL handle.
    pub handle: String,
    /// Page title.
    pub title: String,
    /// HTML body.
    pub body: String,
    /// SEO metadata.
    pub seo: Seo,
}

/// A shop policy (privacy, shipping, terms, refund).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// URL handle (e.g., "privacy-policy").
    pub handle: String,
    /// Policy title.
    pub title: String,
    /// HTML body.
    pub body: String,
}

// =============================================================================
// Search Types
// =============================================================================

/// A page or article search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentHit {
    /// Title.
    pub title: String,
    /// Storefront URL for the hit.
    pub url: String,
}

/// Full search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Matching products (paginated).
    pub products: Connection<ProductCard>,
    /// Matching pages.
    pub pages: Vec<ContentHit>,
    /// Matching articles.
    pub articles: Vec<ContentHit>,
}

impl SearchResults {
    /// Results for an empty query.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            products: Connection::empty(),
            pages: Vec::new(),
            articles: Vec::new(),
        }
    }

    /// Total number of hits on this page.
    #[must_use]
    pub fn total(&self) -> usize {
        self.products.items.len() + self.pages.len() + self.articles.len()
    }
}

/// Predictive (type-ahead) search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictiveResults {
    /// Matching products.
    pub products: Vec<ProductCard>,
    /// Matching collections.
    pub collections: Vec<CollectionSummary>,
    /// Matching pages.
    pub pages: Vec<ContentHit>,
    /// Matching articles.
    pub articles: Vec<ContentHit>,
    /// Suggested query completions.
    pub queries: Vec<String>,
}

impl PredictiveResults {
    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.collections.is_empty()
            && self.pages.is_empty()
            && self.articles.is_empty()
            && self.queries.is_empty()
    }
}

// =============================================================================
// Sitemap Types
// =============================================================================

/// A resource listed in the sitemap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapEntry {
    /// URL handle.
    pub handle: String,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Handles for every sitemap section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitemapData {
    /// Product handles.
    pub products: Vec<SitemapEntry>,
    /// Collection handles.
    pub collections: Vec<SitemapEntry>,
    /// Page handles.
    pub pages: Vec<SitemapEntry>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: MerchandiseId,
    /// Variant title.
    pub title: String,
    /// Parent product handle.
    pub product_handle: String,
    /// Parent product title.
    pub product_title: String,
    /// Selected options.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
}

/// Cost for a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Compare-at price per unit.
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Quantity.
    pub quantity: u32,
    /// Line cost.
    pub cost: CartLineCost,
    /// Product variant.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
    /// Total tax amount.
    pub total_tax: Option<Money>,
}

/// Discount code applied to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code.
    pub code: String,
    /// Whether the code is applicable.
    pub applicable: bool,
}

/// Gift card applied to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedGiftCard {
    /// Last characters of the gift card code.
    pub last_characters: String,
    /// Amount used from the card.
    pub amount_used: Money,
}

/// A shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Checkout URL.
    pub checkout_url: String,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Cart note.
    pub note: Option<String>,
    /// Total item quantity.
    pub total_quantity: u32,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Applied discount codes.
    pub discount_codes: Vec<CartDiscountCode>,
    /// Applied gift cards.
    pub applied_gift_cards: Vec<AppliedGiftCard>,
    /// Cart lines.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// The parts of the cart the optimistic reconciler tracks.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            id: self.id.clone(),
            lines: self
                .lines
                .iter()
                .map(|line| LineSnapshot {
                    id: line.id.clone(),
                    merchandise_id: line.merchandise.id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            discount_codes: self.discount_codes.iter().map(|d| d.code.clone()).collect(),
            gift_card_codes: Vec::new(),
            note: self.note.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: MerchandiseId,
    /// Quantity to add.
    pub quantity: u32,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity.
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(amount: &str) -> Money {
        Money::parse(amount, "USD").unwrap()
    }

    fn variant(id: u32, size: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: MerchandiseId::new(format!("gid://shopify/ProductVariant/{id}")),
            title: size.to_string(),
            available_for_sale: available,
            sku: None,
            price: money("10.00"),
            compare_at_price: None,
            selected_options: vec![SelectedOption {
                name: "Size".to_string(),
                value: size.to_string(),
            }],
            image: None,
        }
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("gid://shopify/Product/1"),
            handle: "tee".to_string(),
            title: "Tee".to_string(),
            vendor: "Skeleton".to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            seo: Seo::default(),
            min_price: money("10.00"),
            featured_image: None,
            images: vec![],
            options: vec![],
            variants: vec![variant(1, "S", false), variant(2, "M", true), variant(3, "L", true)],
        }
    }

    #[test]
    fn test_selected_variant_by_options() {
        let selection = vec![SelectedOption {
            name: "Size".to_string(),
            value: "L".to_string(),
        }];
        let variant = product();
        let variant = variant.selected_variant(&selection).unwrap();
        assert_eq!(variant.title, "L");
    }

    #[test]
    fn test_selected_variant_defaults_to_first_available() {
        let product = product();
        assert_eq!(product.selected_variant(&[]).unwrap().title, "M");

        let unknown = vec![SelectedOption {
            name: "Size".to_string(),
            value: "XXL".to_string(),
        }];
        assert_eq!(product.selected_variant(&unknown).unwrap().title, "M");
    }

    #[test]
    fn test_cart_snapshot() {
        let cart = Cart {
            id: CartId::new("gid://shopify/Cart/c1"),
            checkout_url: "https://checkout.example/c1".to_string(),
            updated_at: None,
            note: Some("gift".to_string()),
            total_quantity: 2,
            cost: CartCost {
                subtotal: money("20.00"),
                total: money("20.00"),
                total_tax: None,
            },
            discount_codes: vec![CartDiscountCode {
                code: "SAVE".to_string(),
                applicable: true,
            }],
            applied_gift_cards: vec![],
            lines: vec![CartLine {
                id: CartLineId::new("gid://shopify/CartLine/1"),
                quantity: 2,
                cost: CartLineCost {
                    amount_per_quantity: money("10.00"),
                    compare_at_amount_per_quantity: None,
                    total_amount: money("20.00"),
                },
                merchandise: CartMerchandise {
                    id: MerchandiseId::new("gid://shopify/ProductVariant/2"),
                    title: "M".to_string(),
                    product_handle: "tee".to_string(),
                    product_title: "Tee".to_string(),
                    selected_options: vec![],
                    image: None,
                },
            }],
        };

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.total_quantity(), 2);
        assert_eq!(snapshot.discount_codes, vec!["SAVE".to_string()]);
        assert_eq!(snapshot.note.as_deref(), Some("gift"));
    }
}
