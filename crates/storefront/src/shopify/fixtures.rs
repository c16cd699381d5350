//! Cart builders shared by unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use skeleton_core::{CartId, CartLineId, MerchandiseId, Money};

use super::types::{Cart, CartCost, CartLine, CartLineCost, CartMerchandise};

pub fn money(amount: &str) -> Money {
    Money::parse(amount, "USD").unwrap()
}

pub fn line(line: u32, variant: u32, quantity: u32) -> CartLine {
    let unit = money("10.00");
    CartLine {
        id: CartLineId::new(format!("gid://shopify/CartLine/{line}")),
        quantity,
        cost: CartLineCost {
            total_amount: unit.times(quantity),
            amount_per_quantity: unit,
            compare_at_amount_per_quantity: None,
        },
        merchandise: CartMerchandise {
            id: MerchandiseId::new(format!("gid://shopify/ProductVariant/{variant}")),
            title: "Default Title".to_string(),
            product_handle: format!("product-{variant}"),
            product_title: format!("Product {variant}"),
            selected_options: vec![],
            image: None,
        },
    }
}

pub fn cart(lines: Vec<CartLine>, updated_at: Option<DateTime<Utc>>) -> Cart {
    let total_quantity = lines.iter().map(|l| l.quantity).sum();
    let subtotal = money("10.00").times(total_quantity);
    Cart {
        id: CartId::new("gid://shopify/Cart/c1?key=abc"),
        checkout_url: "https://checkout.example.com/c1".to_string(),
        updated_at,
        note: None,
        total_quantity,
        cost: CartCost {
            total: subtotal.clone(),
            subtotal,
            total_tax: None,
        },
        discount_codes: vec![],
        applied_gift_cards: vec![],
        lines,
    }
}
