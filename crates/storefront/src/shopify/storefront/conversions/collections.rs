//! Collection type conversion functions.

use crate::shopify::ShopifyError;
use crate::shopify::types::{Collection, CollectionSummary, Connection};

use super::super::queries::{CollectionNode, CollectionSummaryNode};
use super::products::convert_product_cards;
use super::{convert_image, convert_page_info, convert_seo};

/// Convert a collection and its page of products.
pub fn convert_collection(collection: CollectionNode) -> Result<Collection, ShopifyError> {
    Ok(Collection {
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        description_html: collection.description_html,
        seo: convert_seo(collection.seo),
        image: collection.image.map(convert_image),
        products: Connection {
            items: convert_product_cards(collection.products.nodes)?,
            page_info: convert_page_info(collection.products.page_info),
        },
    })
}

/// Convert collection index entries.
pub fn convert_collection_summaries(
    collections: Vec<CollectionSummaryNode>,
) -> Vec<CollectionSummary> {
    collections
        .into_iter()
        .map(|c| CollectionSummary {
            handle: c.handle,
            title: c.title,
            image: c.image.map(convert_image),
        })
        .collect()
}
