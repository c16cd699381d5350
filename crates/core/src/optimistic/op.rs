//! Cart operations and the keys they coalesce under.

use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, MerchandiseId};

/// A cart mutation awaiting server confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartOp {
    /// Add `quantity` units of a variant.
    AddLine {
        merchandise_id: MerchandiseId,
        quantity: u32,
    },
    /// Set the quantity of an existing line. Zero removes the line.
    UpdateQuantity { line_id: CartLineId, quantity: u32 },
    /// Remove a line.
    RemoveLine { line_id: CartLineId },
    /// Replace the applied discount codes.
    UpdateDiscountCodes { codes: Vec<String> },
    /// Replace the applied gift card codes.
    UpdateGiftCardCodes { codes: Vec<String> },
    /// Replace the cart note.
    UpdateNote { note: String },
}

impl CartOp {
    /// The key this operation coalesces under.
    #[must_use]
    pub fn key(&self) -> RequestKey {
        match self {
            Self::AddLine { merchandise_id, .. } => RequestKey::Merchandise(merchandise_id.clone()),
            Self::UpdateQuantity { line_id, .. } | Self::RemoveLine { line_id } => {
                RequestKey::Line(line_id.clone())
            }
            Self::UpdateDiscountCodes { .. } => RequestKey::DiscountCodes,
            Self::UpdateGiftCardCodes { .. } => RequestKey::GiftCardCodes,
            Self::UpdateNote { .. } => RequestKey::Note,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddLine { .. } => "add_line",
            Self::UpdateQuantity { .. } => "update_quantity",
            Self::RemoveLine { .. } => "remove_line",
            Self::UpdateDiscountCodes { .. } => "update_discount_codes",
            Self::UpdateGiftCardCodes { .. } => "update_gift_card_codes",
            Self::UpdateNote { .. } => "update_note",
        }
    }
}

/// Identity under which requests collapse: at most one in flight per key,
/// and the latest submission wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestKey {
    /// Edits to one cart line.
    Line(CartLineId),
    /// Additions of one variant.
    Merchandise(MerchandiseId),
    /// The cart's discount codes.
    DiscountCodes,
    /// The cart's gift card codes.
    GiftCardCodes,
    /// The cart note.
    Note,
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Line(id) => write!(f, "line:{id}"),
            Self::Merchandise(id) => write!(f, "merchandise:{id}"),
            Self::DiscountCodes => f.write_str("discount_codes"),
            Self::GiftCardCodes => f.write_str("gift_card_codes"),
            Self::Note => f.write_str("note"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_remove_share_a_key() {
        let line = CartLineId::new("gid://shopify/CartLine/1");
        let update = CartOp::UpdateQuantity {
            line_id: line.clone(),
            quantity: 3,
        };
        let remove = CartOp::RemoveLine { line_id: line };
        assert_eq!(update.key(), remove.key());
    }

    #[test]
    fn test_key_display() {
        let op = CartOp::AddLine {
            merchandise_id: MerchandiseId::new("gid://shopify/ProductVariant/7"),
            quantity: 1,
        };
        assert_eq!(
            op.key().to_string(),
            "merchandise:gid://shopify/ProductVariant/7"
        );
        assert_eq!(RequestKey::DiscountCodes.to_string(), "discount_codes");
    }
}
