//! Type conversion functions for Shopify Storefront API responses.
//!
//! DTOs carry prices as decimal strings; converting parses them into
//! [`Money`](skeleton_core::Money), so every conversion is fallible.

pub mod cart;
pub mod collections;
pub mod content;
pub mod products;

pub use cart::{convert_cart, user_errors_message};
pub use collections::{convert_collection, convert_collection_summaries};
pub use content::{
    convert_page, convert_policies, convert_predictive, convert_search, convert_sitemap,
};
pub use products::{convert_product, convert_product_cards};

use skeleton_core::Money;

use crate::shopify::ShopifyError;
use crate::shopify::types::{Image, PageInfo, Seo};

use super::queries::{ImageNode, MoneyNode, PageInfoNode, SeoNode};

pub(super) fn convert_money(money: MoneyNode) -> Result<Money, ShopifyError> {
    Ok(Money::parse(&money.amount, &money.currency_code)?)
}

pub(super) fn convert_optional_money(
    money: Option<MoneyNode>,
) -> Result<Option<Money>, ShopifyError> {
    money.map(convert_money).transpose()
}

pub(super) fn convert_image(image: ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

pub(super) fn convert_seo(seo: SeoNode) -> Seo {
    Seo {
        title: seo.title,
        description: seo.description,
    }
}

pub(super) fn convert_page_info(info: PageInfoNode) -> PageInfo {
    PageInfo {
        has_next_page: info.has_next_page,
        has_previous_page: info.has_previous_page,
        start_cursor: info.start_cursor,
        end_cursor: info.end_cursor,
    }
}
