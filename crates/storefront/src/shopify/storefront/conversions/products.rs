//! Product type conversion functions.

use skeleton_core::{MerchandiseId, ProductId};

use crate::shopify::ShopifyError;
use crate::shopify::types::{Product, ProductCard, ProductOption, ProductVariant, SelectedOption};

use super::super::queries::{ProductCardNode, ProductNode, SelectedOptionNode, VariantNode};
use super::{convert_image, convert_money, convert_optional_money, convert_seo};

pub(in crate::shopify::storefront) fn convert_selected_options(
    options: Vec<SelectedOptionNode>,
) -> Vec<SelectedOption> {
    options
        .into_iter()
        .map(|o| SelectedOption {
            name: o.name,
            value: o.value,
        })
        .collect()
}

fn convert_variant(variant: VariantNode) -> Result<ProductVariant, ShopifyError> {
    Ok(ProductVariant {
        id: MerchandiseId::new(variant.id),
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        sku: variant.sku.filter(|s| !s.is_empty()),
        price: convert_money(variant.price)?,
        compare_at_price: convert_optional_money(variant.compare_at_price)?,
        selected_options: convert_selected_options(variant.selected_options),
        image: variant.image.map(convert_image),
    })
}

/// Convert a full product response.
pub fn convert_product(product: ProductNode) -> Result<Product, ShopifyError> {
    let variants = product
        .variants
        .nodes
        .into_iter()
        .map(convert_variant)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        vendor: product.vendor,
        description: product.description,
        description_html: product.description_html,
        available_for_sale: product.available_for_sale,
        seo: convert_seo(product.seo),
        min_price: convert_money(product.price_range.min_variant_price)?,
        featured_image: product.featured_image.map(convert_image),
        images: product.images.nodes.into_iter().map(convert_image).collect(),
        options: product
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.option_values.into_iter().map(|v| v.name).collect(),
            })
            .collect(),
        variants,
    })
}

pub(in crate::shopify::storefront) fn convert_product_card(
    card: ProductCardNode,
) -> Result<ProductCard, ShopifyError> {
    Ok(ProductCard {
        id: ProductId::new(card.id),
        handle: card.handle,
        title: card.title,
        min_price: convert_money(card.price_range.min_variant_price)?,
        featured_image: card.featured_image.map(convert_image),
    })
}

/// Convert a list of product cards.
pub fn convert_product_cards(
    cards: Vec<ProductCardNode>,
) -> Result<Vec<ProductCard>, ShopifyError> {
    cards.into_iter().map(convert_product_card).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "id": "gid://shopify/Product/1",
        "handle": "board",
        "title": "Board",
        "vendor": "Skeleton",
        "description": "A board",
        "descriptionHtml": "<p>A board</p>",
        "availableForSale": true,
        "seo": {"title": null, "description": null},
        "priceRange": {"minVariantPrice": {"amount": "100.0", "currencyCode": "USD"}},
        "featuredImage": null,
        "images": {"nodes": []},
        "options": [{"name": "Size", "optionValues": [{"name": "150"}, {"name": "155"}]}],
        "variants": {"nodes": [{
            "id": "gid://shopify/ProductVariant/11",
            "title": "150",
            "availableForSale": true,
            "sku": "",
            "price": {"amount": "100.0", "currencyCode": "USD"},
            "compareAtPrice": {"amount": "120.0", "currencyCode": "USD"},
            "selectedOptions": [{"name": "Size", "value": "150"}],
            "image": null
        }]}
    }"#;

    #[test]
    fn test_convert_product() {
        let node: ProductNode = serde_json::from_str(PRODUCT_JSON).unwrap();
        let product = convert_product(node).unwrap();

        assert_eq!(product.handle, "board");
        assert_eq!(product.options[0].values, vec!["150", "155"]);
        let variant = &product.variants[0];
        assert_eq!(variant.id.as_str(), "gid://shopify/ProductVariant/11");
        assert!(variant.sku.is_none());
        assert_eq!(variant.compare_at_price.as_ref().unwrap().display(), "$120.00");
    }
}
