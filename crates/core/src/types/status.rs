//! Order status enums as reported by the Customer Account API.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// Maps to Shopify's fulfillment status values. Values added by Shopify after
/// this enum was written deserialize as [`FulfillmentStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    Restocked,
    PendingFulfillment,
    Open,
    InProgress,
    OnHold,
    Scheduled,
    #[serde(other)]
    Unknown,
}

impl FulfillmentStatus {
    /// Human-readable label for order pages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unfulfilled => "Unfulfilled",
            Self::PartiallyFulfilled => "Partially fulfilled",
            Self::Fulfilled => "Fulfilled",
            Self::Restocked => "Restocked",
            Self::PendingFulfillment => "Pending fulfillment",
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::OnHold => "On hold",
            Self::Scheduled => "Scheduled",
            Self::Unknown => "Unknown",
        }
    }
}

/// Order financial status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialStatus {
    #[default]
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    Expired,
    #[serde(other)]
    Unknown,
}

impl FinancialStatus {
    /// Human-readable label for order pages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Authorized => "Authorized",
            Self::PartiallyPaid => "Partially paid",
            Self::Paid => "Paid",
            Self::PartiallyRefunded => "Partially refunded",
            Self::Refunded => "Refunded",
            Self::Voided => "Voided",
            Self::Expired => "Expired",
            Self::Unknown => "Unknown",
        }
    }
}
