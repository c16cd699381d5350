//! Cart type conversion functions.

use skeleton_core::{CartId, CartLineId, MerchandiseId};
use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    AppliedGiftCard, Cart, CartCost, CartDiscountCode, CartLine, CartLineCost, CartMerchandise,
};

use super::super::queries::{CartLineNode, CartNode, CartUserErrorNode};
use super::products::convert_selected_options;
use super::{convert_image, convert_money, convert_optional_money};

/// Convert a cart line. Lines whose merchandise is not a product variant
/// are skipped.
fn convert_cart_line(line: CartLineNode) -> Result<Option<CartLine>, ShopifyError> {
    let merchandise = line.merchandise;
    let Some(merchandise_id) = merchandise.id else {
        warn!(line_id = %line.id, "Skipping cart line with unsupported merchandise");
        return Ok(None);
    };
    let product = merchandise.product;

    Ok(Some(CartLine {
        id: CartLineId::new(line.id),
        quantity: line.quantity,
        cost: CartLineCost {
            amount_per_quantity: convert_money(line.cost.amount_per_quantity)?,
            compare_at_amount_per_quantity: convert_optional_money(
                line.cost.compare_at_amount_per_quantity,
            )?,
            total_amount: convert_money(line.cost.total_amount)?,
        },
        merchandise: CartMerchandise {
            id: MerchandiseId::new(merchandise_id),
            title: merchandise.title,
            product_handle: product.as_ref().map(|p| p.handle.clone()).unwrap_or_default(),
            product_title: product.map(|p| p.title).unwrap_or_default(),
            selected_options: convert_selected_options(merchandise.selected_options),
            image: merchandise.image.map(convert_image),
        },
    }))
}

/// Convert a cart.
pub fn convert_cart(cart: CartNode) -> Result<Cart, ShopifyError> {
    let mut lines = Vec::with_capacity(cart.lines.nodes.len());
    for line in cart.lines.nodes {
        if let Some(line) = convert_cart_line(line)? {
            lines.push(line);
        }
    }

    Ok(Cart {
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        updated_at: cart.updated_at,
        note: cart.note.filter(|n| !n.is_empty()),
        total_quantity: cart.total_quantity,
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount)?,
            total: convert_money(cart.cost.total_amount)?,
            total_tax: convert_optional_money(cart.cost.total_tax_amount)?,
        },
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        applied_gift_cards: cart
            .applied_gift_cards
            .into_iter()
            .map(|g| {
                Ok(AppliedGiftCard {
                    last_characters: g.last_characters,
                    amount_used: convert_money(g.amount_used)?,
                })
            })
            .collect::<Result<Vec<_>, ShopifyError>>()?,
        lines,
    })
}

/// Join mutation user errors into a single message.
pub fn user_errors_message(errors: Vec<CartUserErrorNode>) -> String {
    errors
        .into_iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CART_JSON: &str = r#"{
        "id": "gid://shopify/Cart/c1?key=k",
        "checkoutUrl": "https://shop.example/checkouts/c1",
        "updatedAt": "2026-03-01T12:00:00Z",
        "note": "",
        "totalQuantity": 3,
        "cost": {
            "subtotalAmount": {"amount": "30.0", "currencyCode": "USD"},
            "totalAmount": {"amount": "32.5", "currencyCode": "USD"},
            "totalTaxAmount": null
        },
        "discountCodes": [{"code": "SAVE10", "applicable": false}],
        "appliedGiftCards": [],
        "lines": {"nodes": [
            {"id": "gid://shopify/CartLine/1", "quantity": 3,
             "cost": {"amountPerQuantity": {"amount": "10.0", "currencyCode": "USD"},
                      "compareAtAmountPerQuantity": null,
                      "totalAmount": {"amount": "30.0", "currencyCode": "USD"}},
             "merchandise": {"id": "gid://shopify/ProductVariant/9", "title": "Large",
                             "selectedOptions": [{"name": "Size", "value": "L"}],
                             "image": null, "product": {"handle": "tee", "title": "Tee"}}},
            {"id": "gid://shopify/CartLine/2", "quantity": 1,
             "cost": {"amountPerQuantity": {"amount": "0", "currencyCode": "USD"},
                      "compareAtAmountPerQuantity": null,
                      "totalAmount": {"amount": "0", "currencyCode": "USD"}},
             "merchandise": {}}
        ]}
    }"#;

    #[test]
    fn test_convert_cart() {
        let node: CartNode = serde_json::from_str(CART_JSON).unwrap();
        let cart = convert_cart(node).unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert!(cart.note.is_none());
        assert_eq!(cart.lines[0].merchandise.product_handle, "tee");
        assert_eq!(cart.cost.total.display(), "$32.50");
        assert!(!cart.discount_codes[0].applicable);
        assert!(cart.updated_at.is_some());
    }

    #[test]
    fn test_user_errors_message() {
        let errors = vec![
            CartUserErrorNode {
                field: Some(vec!["lines".to_string()]),
                message: "Variant is sold out".to_string(),
                code: None,
            },
            CartUserErrorNode {
                field: None,
                message: "Quantity too high".to_string(),
                code: Some("INVALID".to_string()),
            },
        ];
        assert_eq!(
            user_errors_message(errors),
            "Variant is sold out; Quantity too high"
        );
    }
}
