//! Cart view model.
//!
//! The single shape every cart template renders: the full Shopify cart for
//! titles, images and prices, with the optimistic view deciding which lines
//! exist, their quantities, and which controls are disabled.

use rust_decimal::Decimal;
use skeleton_core::{Money, OptimisticCart, OptimisticLine, OptimisticView};

use crate::shopify::types::{Cart, CartLine};

/// Variant title Shopify uses for products without options.
const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// A cart line ready for display.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub image_url: Option<String>,
    pub image_alt: String,
    pub quantity: u32,
    pub unit_price: Option<String>,
    pub line_price: Option<String>,
    pub compare_at_price: Option<String>,
    /// A request touching this line is pending; quantity controls are disabled.
    pub is_pending: bool,
    /// The line was just added and has no server data yet.
    pub is_placeholder: bool,
}

impl CartLineView {
    fn from_line(line: &CartLine, optimistic: &OptimisticLine) -> Self {
        let line_price = if optimistic.is_optimistic {
            line.cost.amount_per_quantity.times(optimistic.quantity)
        } else {
            line.cost.total_amount.clone()
        };
        let merchandise = &line.merchandise;

        Self {
            id: line.id.to_string(),
            handle: merchandise.product_handle.clone(),
            title: merchandise.product_title.clone(),
            variant_title: (merchandise.title != DEFAULT_VARIANT_TITLE)
                .then(|| merchandise.title.clone()),
            image_url: merchandise.image.as_ref().map(|i| i.url.clone()),
            image_alt: merchandise
                .image
                .as_ref()
                .and_then(|i| i.alt_text.clone())
                .unwrap_or_else(|| merchandise.product_title.clone()),
            quantity: optimistic.quantity,
            unit_price: Some(line.cost.amount_per_quantity.display()),
            line_price: Some(line_price.display()),
            compare_at_price: line
                .cost
                .compare_at_amount_per_quantity
                .as_ref()
                .map(|m| m.times(optimistic.quantity).display()),
            is_pending: optimistic.is_optimistic,
            is_placeholder: false,
        }
    }

    fn placeholder(optimistic: &OptimisticLine) -> Self {
        Self {
            id: optimistic.id.to_string(),
            handle: String::new(),
            title: "Adding to cart".to_string(),
            variant_title: None,
            image_url: None,
            image_alt: String::new(),
            quantity: optimistic.quantity,
            unit_price: None,
            line_price: None,
            compare_at_price: None,
            is_pending: true,
            is_placeholder: true,
        }
    }
}

/// A discount code as shown in the cart summary.
#[derive(Debug, Clone)]
pub struct DiscountCodeView {
    pub code: String,
    pub applicable: bool,
    pub is_pending: bool,
}

/// A gift card applied to the cart.
#[derive(Debug, Clone)]
pub struct GiftCardView {
    pub last_characters: String,
    pub amount_used: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_quantity: u32,
    pub subtotal: String,
    pub total: String,
    pub total_tax: Option<String>,
    pub discount_codes: Vec<DiscountCodeView>,
    pub gift_cards: Vec<GiftCardView>,
    /// Gift card codes submitted but not yet confirmed.
    pub pending_gift_card_codes: Vec<String>,
    pub note: String,
    pub checkout_url: Option<String>,
    /// Totals are estimates until every pending request settles.
    pub is_optimistic: bool,
}

impl CartView {
    /// A cart with no lines.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(None, &OptimisticCart::new(None).view())
    }

    /// Build the view from the latest server cart and the merged optimistic view.
    #[must_use]
    pub fn new(cart: Option<&Cart>, view: &OptimisticView) -> Self {
        let lines: Vec<CartLineView> = view
            .lines
            .iter()
            .map(|optimistic| {
                cart.and_then(|c| c.line(&optimistic.id)).map_or_else(
                    || CartLineView::placeholder(optimistic),
                    |line| CartLineView::from_line(line, optimistic),
                )
            })
            .collect();

        let (subtotal, total) = match cart {
            Some(cart) if view.is_optimistic => {
                let estimate = estimated_subtotal(cart, view);
                (estimate.display(), estimate.display())
            }
            Some(cart) => (cart.cost.subtotal.display(), cart.cost.total.display()),
            None => {
                let zero = Money::zero("USD").display();
                (zero.clone(), zero)
            }
        };

        let discount_codes = view
            .discount_codes
            .iter()
            .map(|code| {
                let confirmed = cart.and_then(|c| {
                    c.discount_codes
                        .iter()
                        .find(|d| d.code.eq_ignore_ascii_case(code))
                });
                DiscountCodeView {
                    code: code.clone(),
                    applicable: confirmed.is_none_or(|d| d.applicable),
                    is_pending: confirmed.is_none(),
                }
            })
            .collect();

        Self {
            lines,
            total_quantity: view.total_quantity,
            subtotal,
            total,
            total_tax: cart
                .filter(|_| !view.is_optimistic)
                .and_then(|c| c.cost.total_tax.as_ref())
                .filter(|tax| !tax.is_zero())
                .map(Money::display),
            discount_codes,
            gift_cards: cart
                .map(|c| {
                    c.applied_gift_cards
                        .iter()
                        .map(|g| GiftCardView {
                            last_characters: g.last_characters.clone(),
                            amount_used: g.amount_used.display(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            pending_gift_card_codes: view.gift_card_codes.clone(),
            note: view.note.clone().unwrap_or_default(),
            checkout_url: cart
                .filter(|c| c.total_quantity > 0)
                .map(|c| c.checkout_url.clone()),
            is_optimistic: view.is_optimistic,
        }
    }

    /// Whether the cart should show the empty-cart call to action.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_quantity == 0
    }

    /// Whether any line or field is awaiting confirmation.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.is_optimistic
    }
}

/// Subtotal recomputed from unit prices while requests are pending.
fn estimated_subtotal(cart: &Cart, view: &OptimisticView) -> Money {
    let amount = view
        .lines
        .iter()
        .filter_map(|l| cart.line(&l.id).map(|line| (line, l.quantity)))
        .map(|(line, quantity)| line.cost.amount_per_quantity.amount * Decimal::from(quantity))
        .sum();
    Money::new(amount, cart.cost.subtotal.currency_code.clone())
}
