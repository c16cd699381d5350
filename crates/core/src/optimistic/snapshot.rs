//! Server cart snapshots and the merged optimistic view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CartId, CartLineId, MerchandiseId};

/// Prefix of line IDs invented for additions the server has not confirmed.
pub const PLACEHOLDER_LINE_PREFIX: &str = "optimistic:";

/// A cart line as last confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub id: CartLineId,
    pub merchandise_id: MerchandiseId,
    pub quantity: u32,
}

/// The parts of a server cart the reconciler reasons about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub id: CartId,
    pub lines: Vec<LineSnapshot>,
    pub discount_codes: Vec<String>,
    pub gift_card_codes: Vec<String>,
    pub note: Option<String>,
    /// Server `updatedAt`, used to ignore responses that arrive out of order.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub fn empty(id: CartId) -> Self {
        Self {
            id,
            lines: Vec::new(),
            discount_codes: Vec::new(),
            gift_card_codes: Vec::new(),
            note: None,
            updated_at: None,
        }
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether `self` is at least as recent as `other`.
    ///
    /// Snapshots without a timestamp are always considered current.
    #[must_use]
    pub fn is_newer_or_equal(&self, other: &Self) -> bool {
        match (self.updated_at, other.updated_at) {
            (Some(mine), Some(theirs)) => mine >= theirs,
            _ => true,
        }
    }
}

/// A line in the merged view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimisticLine {
    pub id: CartLineId,
    pub merchandise_id: MerchandiseId,
    pub quantity: u32,
    /// A pending request affects this line; controls should be disabled.
    pub is_optimistic: bool,
}

impl OptimisticLine {
    /// Whether this line only exists locally (an unconfirmed addition).
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id.as_str().starts_with(PLACEHOLDER_LINE_PREFIX)
    }
}

/// Last confirmed server state with every pending request applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimisticView {
    pub cart_id: Option<CartId>,
    pub lines: Vec<OptimisticLine>,
    pub total_quantity: u32,
    pub discount_codes: Vec<String>,
    pub gift_card_codes: Vec<String>,
    pub note: Option<String>,
    /// Any request is still pending.
    pub is_optimistic: bool,
}

impl OptimisticView {
    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&OptimisticLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    /// Whether the view has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
