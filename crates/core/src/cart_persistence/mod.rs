//! Best-effort bookmark of the remote cart that belongs to this browser.
//!
//! The storefront writes a [`CartPersistenceRecord`] to client storage after
//! every cart mutation and reads it back on page load to decide whether to
//! offer a "recover your cart" prompt.
//!
//! Every operation is fail-soft: storage errors are logged at `warn` and the
//! storefront continues without persistence. There is no cross-tab
//! coordination; the last write wins.

mod storage;

pub use storage::{KeyValueStorage, MemoryStorage, StorageError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::CartId;

/// Storage key holding the JSON record.
pub const CART_STORAGE_KEY: &str = "hydrogen-cart-data";

/// Records older than this are discarded on read.
pub const RETENTION_DAYS: i64 = 30;

/// The persisted cart pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPersistenceRecord {
    /// Remote cart ID.
    pub cart_id: CartId,
    /// When the record was last written.
    pub last_updated: DateTime<Utc>,
    /// Total quantity of the cart at write time.
    pub total_quantity: u32,
}

impl CartPersistenceRecord {
    /// Retention window as a duration.
    #[must_use]
    pub fn retention() -> Duration {
        Duration::days(RETENTION_DAYS)
    }

    /// Whether the record is older than the retention window at `now`.
    ///
    /// A record exactly `RETENTION_DAYS` old is still valid.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_updated) > Self::retention()
    }
}

/// Reads and writes the cart pointer through a [`KeyValueStorage`].
#[derive(Debug)]
pub struct CartPersistence<S> {
    storage: S,
}

impl<S: KeyValueStorage> CartPersistence<S> {
    /// Wrap a storage backend.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Access the underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Return the underlying storage.
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Persist the cart pointer stamped with the current time.
    ///
    /// Returns whether the record was stored. Failures are logged, never
    /// propagated.
    pub fn save(&mut self, cart_id: &CartId, total_quantity: u32) -> bool {
        self.save_at(cart_id, total_quantity, Utc::now())
    }

    /// Persist the cart pointer stamped with `now`.
    pub fn save_at(&mut self, cart_id: &CartId, total_quantity: u32, now: DateTime<Utc>) -> bool {
        let record = CartPersistenceRecord {
            cart_id: cart_id.clone(),
            last_updated: now,
            total_quantity,
        };

        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart persistence record");
                return false;
            }
        };

        match self.storage.set_item(CART_STORAGE_KEY, &json) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, cart_id = %cart_id, "Failed to persist cart data");
                false
            }
        }
    }

    /// Read the cart pointer if present and not expired.
    ///
    /// Expired or unparseable records are removed as a side effect.
    pub fn read(&mut self) -> Option<CartPersistenceRecord> {
        self.read_at(Utc::now())
    }

    /// Read the cart pointer, judging expiry against `now`.
    pub fn read_at(&mut self, now: DateTime<Utc>) -> Option<CartPersistenceRecord> {
        let raw = match self.storage.get_item(CART_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read cart data");
                return None;
            }
        };

        let record: CartPersistenceRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cart data");
                self.clear();
                return None;
            }
        };

        if record.is_expired_at(now) {
            tracing::debug!(cart_id = %record.cart_id, "Cart data expired");
            self.clear();
            return None;
        }

        Some(record)
    }

    /// Remove the cart pointer.
    pub fn clear(&mut self) {
        if let Err(e) = self.storage.remove_item(CART_STORAGE_KEY) {
            warn!(error = %e, "Failed to clear cart data");
        }
    }
}

/// A prompt offering to restore a previously used cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOffer {
    /// Cart to restore.
    pub cart_id: CartId,
    /// Item count shown in the prompt.
    pub total_quantity: u32,
    /// When the cart was last touched.
    pub last_updated: DateTime<Utc>,
}

/// Decide whether to offer cart recovery.
///
/// An offer is made only for a non-empty persisted cart that is not already
/// the session's active cart.
#[must_use]
pub fn recovery_offer(
    record: Option<&CartPersistenceRecord>,
    active_cart_id: Option<&CartId>,
) -> Option<RecoveryOffer> {
    let record = record?;

    if record.total_quantity == 0 {
        return None;
    }

    if active_cart_id == Some(&record.cart_id) {
        return None;
    }

    Some(RecoveryOffer {
        cart_id: record.cart_id.clone(),
        total_quantity: record.total_quantity,
        last_updated: record.last_updated,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_id() -> CartId {
        CartId::new("gid://shopify/Cart/c1-abc?key=k1")
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_record_json_shape() {
        let record = CartPersistenceRecord {
            cart_id: cart_id(),
            last_updated: at("2026-01-02T03:04:05Z"),
            total_quantity: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["cartId"], "gid://shopify/Cart/c1-abc?key=k1");
        assert_eq!(json["totalQuantity"], 3);
        assert!(json["lastUpdated"].as_str().unwrap().starts_with("2026-01-02T03:04:05"));
    }

    #[test]
    fn test_save_then_read() {
        let mut persistence = CartPersistence::new(MemoryStorage::new());
        let now = at("2026-03-01T12:00:00Z");

        assert!(persistence.save_at(&cart_id(), 2, now));
        let record = persistence.read_at(now).unwrap();

        assert_eq!(record.cart_id, cart_id());
        assert_eq!(record.total_quantity, 2);
        assert_eq!(record.last_updated, now);
    }

    #[test]
    fn test_retention_boundary() {
        let mut persistence = CartPersistence::new(MemoryStorage::new());
        let written = at("2026-03-01T12:00:00Z");
        persistence.save_at(&cart_id(), 1, written);

        let exactly_thirty_days = written + Duration::days(30);
        assert!(persistence.read_at(exactly_thirty_days).is_some());

        let just_over = exactly_thirty_days + Duration::seconds(1);
        assert!(persistence.read_at(just_over).is_none());
        assert!(persistence.storage().is_empty());
    }

    #[test]
    fn test_unparseable_record_is_cleared() {
        let mut storage = MemoryStorage::new();
        storage.insert_raw(CART_STORAGE_KEY, "{not json");
        let mut persistence = CartPersistence::new(storage);

        assert!(persistence.read().is_none());
        assert!(persistence.storage().raw(CART_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_save_on_unavailable_storage_is_soft() {
        let mut storage = MemoryStorage::new();
        storage.set_available(false);
        let mut persistence = CartPersistence::new(storage);

        assert!(!persistence.save(&cart_id(), 1));
        assert!(persistence.read().is_none());
        persistence.clear();
    }

    #[test]
    fn test_recovery_offer_rules() {
        let record = CartPersistenceRecord {
            cart_id: cart_id(),
            last_updated: at("2026-03-01T12:00:00Z"),
            total_quantity: 2,
        };

        // No active cart: offer
        let offer = recovery_offer(Some(&record), None).unwrap();
        assert_eq!(offer.total_quantity, 2);

        // Same cart already active: no offer
        assert!(recovery_offer(Some(&record), Some(&cart_id())).is_none());

        // Different active cart: offer
        let other = CartId::new("gid://shopify/Cart/other");
        assert!(recovery_offer(Some(&record), Some(&other)).is_some());

        // Empty persisted cart: no offer
        let empty = CartPersistenceRecord {
            total_quantity: 0,
            ..record
        };
        assert!(recovery_offer(Some(&empty), None).is_none());

        assert!(recovery_offer(None, None).is_none());
    }
}
