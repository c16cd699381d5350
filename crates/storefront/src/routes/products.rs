//! Product route handlers.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::filters;
use crate::shopify::types::{Image, Product, ProductCard, ProductVariant, SelectedOption};
use crate::state::AppState;

/// An option picker with the value currently chosen.
#[derive(Clone)]
pub struct OptionPicker {
    pub name: String,
    pub values: Vec<String>,
    pub selected: String,
}

impl OptionPicker {
    /// Whether `value` is the chosen one.
    #[must_use]
    pub fn is_selected(&self, value: &str) -> bool {
        self.selected == value
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub variant: Option<ProductVariant>,
    pub pickers: Vec<OptionPicker>,
    pub recommendations: Vec<ProductCard>,
}

impl ProductShowTemplate {
    /// The selected variant's image, falling back to the product's.
    #[must_use]
    pub fn image(&self) -> Option<&Image> {
        self.variant
            .as_ref()
            .and_then(|v| v.image.as_ref())
            .or(self.product.featured_image.as_ref())
    }
}

/// Variant selection from the query string, e.g. `?Size=M&Color=Red`.
///
/// Only names matching one of the product's options count.
fn selection_from_query(product: &Product, query: &HashMap<String, String>) -> Vec<SelectedOption> {
    product
        .options
        .iter()
        .filter_map(|option| {
            query.get(&option.name).map(|value| SelectedOption {
                name: option.name.clone(),
                value: value.clone(),
            })
        })
        .collect()
}

fn pickers(product: &Product, variant: Option<&ProductVariant>) -> Vec<OptionPicker> {
    product
        .options
        .iter()
        .filter(|option| option.values.len() > 1)
        .map(|option| OptionPicker {
            name: option.name.clone(),
            values: option.values.clone(),
            selected: variant
                .and_then(|v| v.selected_options.iter().find(|o| o.name == option.name))
                .map(|o| o.value.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Display product detail page.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ProductShowTemplate> {
    let product = state
        .storefront()
        .get_product_by_handle(&handle)
        .await
        .map_err(AppError::from_lookup)?;

    let selection = selection_from_query(&product, &query);
    let variant = product.selected_variant(&selection).cloned();

    let recommendations = state
        .storefront()
        .get_product_recommendations(&product.id)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load product recommendations");
            Vec::new()
        });

    Ok(ProductShowTemplate {
        pickers: pickers(&product, variant.as_ref()),
        variant,
        product,
        recommendations,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::shopify::types::{ProductOption, Seo};
    use skeleton_core::{MerchandiseId, Money, ProductId};

    fn product() -> Product {
        let variant = |id: u32, size: &str| ProductVariant {
            id: MerchandiseId::new(format!("gid://shopify/ProductVariant/{id}")),
            title: size.to_string(),
            available_for_sale: true,
            sku: None,
            price: Money::parse("25.00", "USD").unwrap(),
            compare_at_price: None,
            selected_options: vec![SelectedOption {
                name: "Size".to_string(),
                value: size.to_string(),
            }],
            image: None,
        };
        Product {
            id: ProductId::new("gid://shopify/Product/1"),
            handle: "hoodie".to_string(),
            title: "Hoodie".to_string(),
            vendor: "Skeleton".to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            seo: Seo::default(),
            min_price: Money::parse("25.00", "USD").unwrap(),
            featured_image: None,
            images: vec![],
            options: vec![ProductOption {
                name: "Size".to_string(),
                values: vec!["S".to_string(), "M".to_string()],
            }],
            variants: vec![variant(1, "S"), variant(2, "M")],
        }
    }

    #[test]
    fn test_selection_ignores_unknown_params() {
        let product = product();
        let query = HashMap::from([
            ("Size".to_string(), "M".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
        ]);
        let selection = selection_from_query(&product, &query);
        assert_eq!(selection.len(), 1);
        assert_eq!(product.selected_variant(&selection).unwrap().title, "M");
    }

    #[test]
    fn test_pickers_mark_selected_value() {
        let product = product();
        let variant = product.variants.get(1);
        let pickers = pickers(&product, variant);
        assert_eq!(pickers.len(), 1);
        assert_eq!(pickers[0].selected, "M");
    }
}
