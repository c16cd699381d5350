//! Optimistic cart reconciliation.
//!
//! [`OptimisticCart`] keeps the last server-confirmed cart and a log of
//! pending requests keyed by the entity they touch ([`RequestKey`]). The merged
//! [`OptimisticView`] shows the cart as it will look once every pending request
//! lands, with each affected line flagged so its controls can be disabled.
//!
//! # Coalescing
//!
//! Per key, at most one request is in flight. A submission made while another
//! request for the same key is in flight is queued, and replaces (supersedes)
//! any request already queued for that key, which is then never sent. When an
//! in-flight request settles after a newer submission for its key, its
//! response is absorbed into the base cart but the view keeps showing the
//! newer value, so exactly one settled state (the last requested one) is
//! observed per burst of edits.
//!
//! ```text
//! submit(set L=3) -> InFlight #1
//! submit(set L=2) -> Queued   #2
//! submit(set L=5) -> Queued   #3, supersedes #2
//! settle(#1)      -> Absorbed          (view still shows L=5)
//! try_begin(#3)   -> Started
//! settle(#3)      -> Settled           (view shows server L=5)
//! ```

mod op;
mod snapshot;

pub use op::{CartOp, RequestKey};
pub use snapshot::{
    CartSnapshot, LineSnapshot, OptimisticLine, OptimisticView, PLACEHOLDER_LINE_PREFIX,
};

use std::collections::BTreeMap;

use crate::types::CartLineId;

/// Identifier of a submitted request, unique per [`OptimisticCart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a new submission may be sent right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing else is in flight for the key; send now.
    Now,
    /// Another request for the key is in flight; wait for [`OptimisticCart::try_begin`].
    Queued,
}

/// Result of [`OptimisticCart::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: RequestId,
    pub key: RequestKey,
    pub dispatch: Dispatch,
    /// Queued requests for the same key that will never be sent.
    pub superseded: Vec<RequestId>,
}

/// Result of [`OptimisticCart::try_begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// The request is now in flight; send this operation.
    Started(CartOp),
    /// Another request for the key is still in flight.
    Waiting,
    /// This request is already in flight and must not be sent again.
    AlreadyStarted,
    /// The request was replaced by a newer one and must not be sent.
    Superseded,
}

/// Result of [`OptimisticCart::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The request was the latest for its key; the view now shows server truth for it.
    Settled,
    /// A newer request for the key is pending; the response only refreshed the base.
    Absorbed,
    /// The request is not pending (already settled, failed, or superseded).
    Unknown,
}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Queued,
    InFlight,
    /// Settled, failed, superseded, or never submitted here.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Queued,
    InFlight,
}

#[derive(Debug, Clone)]
struct Entry {
    id: RequestId,
    op: CartOp,
    state: EntryState,
}

/// Pending-request log merged over the last known server cart.
#[derive(Debug, Clone, Default)]
pub struct OptimisticCart {
    base: Option<CartSnapshot>,
    pending: BTreeMap<RequestKey, Vec<Entry>>,
    next_id: u64,
}

impl OptimisticCart {
    /// Start from a server snapshot, or nothing before the first load.
    #[must_use]
    pub fn new(base: Option<CartSnapshot>) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// The last confirmed server snapshot.
    #[must_use]
    pub const fn base(&self) -> Option<&CartSnapshot> {
        self.base.as_ref()
    }

    /// Whether any request is queued or in flight.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of queued or in-flight requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Replace the base with a freshly loaded server cart, unless it is older
    /// than the current base.
    pub fn observe(&mut self, snapshot: CartSnapshot) {
        let accept = self
            .base
            .as_ref()
            .is_none_or(|base| base.id != snapshot.id || snapshot.is_newer_or_equal(base));
        if accept {
            self.base = Some(snapshot);
        }
    }

    /// Record a new request.
    pub fn submit(&mut self, op: CartOp) -> Submission {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        let key = op.key();
        let entries = self.pending.entry(key.clone()).or_default();

        let superseded: Vec<RequestId> = entries
            .iter()
            .filter(|e| e.state == EntryState::Queued)
            .map(|e| e.id)
            .collect();
        entries.retain(|e| e.state != EntryState::Queued);

        let dispatch = if entries.iter().any(|e| e.state == EntryState::InFlight) {
            entries.push(Entry {
                id,
                op,
                state: EntryState::Queued,
            });
            Dispatch::Queued
        } else {
            entries.push(Entry {
                id,
                op,
                state: EntryState::InFlight,
            });
            Dispatch::Now
        };

        Submission {
            id,
            key,
            dispatch,
            superseded,
        }
    }

    /// Move a queued request in flight once its key is free.
    ///
    /// Hands out the operation to send at most once per request.
    pub fn try_begin(&mut self, id: RequestId) -> Begin {
        let Some(entries) = self
            .pending
            .values_mut()
            .find(|entries| entries.iter().any(|e| e.id == id))
        else {
            return Begin::Superseded;
        };

        let busy = entries
            .iter()
            .any(|e| e.state == EntryState::InFlight && e.id != id);

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Begin::Superseded;
        };

        match entry.state {
            EntryState::InFlight => Begin::AlreadyStarted,
            EntryState::Queued if busy => Begin::Waiting,
            EntryState::Queued => {
                entry.state = EntryState::InFlight;
                Begin::Started(entry.op.clone())
            }
        }
    }

    /// Apply the server's response to a request.
    pub fn settle(&mut self, id: RequestId, server: CartSnapshot) -> Settlement {
        let Some(key) = self.remove_entry(id) else {
            return Settlement::Unknown;
        };

        self.observe(server);

        if self.pending.contains_key(&key) {
            Settlement::Absorbed
        } else {
            Settlement::Settled
        }
    }

    /// Drop a request that failed; the view reverts for its key.
    ///
    /// Returns whether the request was pending.
    pub fn fail(&mut self, id: RequestId) -> bool {
        self.remove_entry(id).is_some()
    }

    /// Current state of a request.
    #[must_use]
    pub fn status(&self, id: RequestId) -> RequestStatus {
        self.pending
            .values()
            .flatten()
            .find(|e| e.id == id)
            .map_or(RequestStatus::Finished, |e| match e.state {
                EntryState::Queued => RequestStatus::Queued,
                EntryState::InFlight => RequestStatus::InFlight,
            })
    }

    /// The merged view: base plus the latest pending request per key, applied
    /// in submission order.
    #[must_use]
    pub fn view(&self) -> OptimisticView {
        let mut lines: Vec<OptimisticLine> = self
            .base
            .iter()
            .flat_map(|b| b.lines.iter())
            .map(|l| OptimisticLine {
                id: l.id.clone(),
                merchandise_id: l.merchandise_id.clone(),
                quantity: l.quantity,
                is_optimistic: false,
            })
            .collect();

        let mut discount_codes = self
            .base
            .as_ref()
            .map(|b| b.discount_codes.clone())
            .unwrap_or_default();
        let mut gift_card_codes = self
            .base
            .as_ref()
            .map(|b| b.gift_card_codes.clone())
            .unwrap_or_default();
        let mut note = self.base.as_ref().and_then(|b| b.note.clone());

        let mut latest: Vec<&Entry> = self.pending.values().filter_map(|v| v.last()).collect();
        latest.sort_by_key(|e| e.id);

        for entry in latest {
            match &entry.op {
                CartOp::AddLine {
                    merchandise_id,
                    quantity,
                } => {
                    if let Some(line) = lines
                        .iter_mut()
                        .find(|l| &l.merchandise_id == merchandise_id)
                    {
                        line.quantity = line.quantity.saturating_add(*quantity);
                        line.is_optimistic = true;
                    } else {
                        lines.push(OptimisticLine {
                            id: CartLineId::new(format!(
                                "{PLACEHOLDER_LINE_PREFIX}{merchandise_id}"
                            )),
                            merchandise_id: merchandise_id.clone(),
                            quantity: *quantity,
                            is_optimistic: true,
                        });
                    }
                }
                CartOp::UpdateQuantity { line_id, quantity } if *quantity == 0 => {
                    lines.retain(|l| &l.id != line_id);
                }
                CartOp::UpdateQuantity { line_id, quantity } => {
                    if let Some(line) = lines.iter_mut().find(|l| &l.id == line_id) {
                        line.quantity = *quantity;
                        line.is_optimistic = true;
                    }
                }
                CartOp::RemoveLine { line_id } => {
                    lines.retain(|l| &l.id != line_id);
                }
                CartOp::UpdateDiscountCodes { codes } => discount_codes.clone_from(codes),
                CartOp::UpdateGiftCardCodes { codes } => gift_card_codes.clone_from(codes),
                CartOp::UpdateNote { note: new_note } => note = Some(new_note.clone()),
            }
        }

        OptimisticView {
            cart_id: self.base.as_ref().map(|b| b.id.clone()),
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            lines,
            discount_codes,
            gift_card_codes,
            note,
            is_optimistic: self.has_pending(),
        }
    }

    fn remove_entry(&mut self, id: RequestId) -> Option<RequestKey> {
        let key = self
            .pending
            .iter()
            .find(|(_, entries)| entries.iter().any(|e| e.id == id))
            .map(|(key, _)| key.clone())?;

        if let Some(entries) = self.pending.get_mut(&key) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                self.pending.remove(&key);
            }
        }

        Some(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{CartId, MerchandiseId};

    fn line_id(n: u32) -> CartLineId {
        CartLineId::new(format!("gid://shopify/CartLine/{n}"))
    }

    fn variant(n: u32) -> MerchandiseId {
        MerchandiseId::new(format!("gid://shopify/ProductVariant/{n}"))
    }

    fn snapshot(lines: &[(u32, u32, u32)]) -> CartSnapshot {
        CartSnapshot {
            lines: lines
                .iter()
                .map(|&(line, merch, quantity)| LineSnapshot {
                    id: line_id(line),
                    merchandise_id: variant(merch),
                    quantity,
                })
                .collect(),
            ..CartSnapshot::empty(CartId::new("gid://shopify/Cart/c1"))
        }
    }

    fn set(line: u32, quantity: u32) -> CartOp {
        CartOp::UpdateQuantity {
            line_id: line_id(line),
            quantity,
        }
    }

    #[test]
    fn test_view_without_pending_matches_base() {
        let cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2), (2, 20, 1)])));
        let view = cart.view();

        assert_eq!(view.total_quantity, 3);
        assert!(!view.is_optimistic);
        assert!(view.lines.iter().all(|l| !l.is_optimistic));
    }

    #[test]
    fn test_empty_view_before_first_load() {
        let cart = OptimisticCart::new(None);
        let view = cart.view();
        assert!(view.cart_id.is_none());
        assert!(view.is_empty());
        assert_eq!(view.total_quantity, 0);
    }

    #[test]
    fn test_pending_update_is_visible_and_flagged() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2)])));
        let submission = cart.submit(set(1, 3));
        assert_eq!(submission.dispatch, Dispatch::Now);

        let view = cart.view();
        let line = view.line(&line_id(1)).unwrap();
        assert_eq!(line.quantity, 3);
        assert!(line.is_optimistic);
        assert!(view.is_optimistic);

        assert_eq!(
            cart.settle(submission.id, snapshot(&[(1, 10, 3)])),
            Settlement::Settled
        );
        let view = cart.view();
        assert!(!view.line(&line_id(1)).unwrap().is_optimistic);
        assert!(!cart.has_pending());
    }

    #[test]
    fn test_second_update_waits_and_third_supersedes_it() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2)])));

        let first = cart.submit(set(1, 3));
        let second = cart.submit(set(1, 2));
        assert_eq!(second.dispatch, Dispatch::Queued);
        assert_eq!(cart.try_begin(second.id), Begin::Waiting);

        assert_eq!(cart.pending_count(), 2);

        let third = cart.submit(set(1, 5));
        assert_eq!(third.superseded, vec![second.id]);
        assert_eq!(cart.pending_count(), 2);
        assert_eq!(cart.status(second.id), RequestStatus::Finished);
        assert_eq!(cart.try_begin(second.id), Begin::Superseded);

        // The view always shows the latest request
        assert_eq!(cart.view().line(&line_id(1)).unwrap().quantity, 5);

        assert_eq!(
            cart.settle(first.id, snapshot(&[(1, 10, 3)])),
            Settlement::Absorbed
        );
        assert_eq!(cart.view().line(&line_id(1)).unwrap().quantity, 5);

        assert_eq!(cart.try_begin(third.id), Begin::Started(set(1, 5)));
        assert_eq!(cart.try_begin(third.id), Begin::AlreadyStarted);
        assert_eq!(
            cart.settle(third.id, snapshot(&[(1, 10, 5)])),
            Settlement::Settled
        );
        assert_eq!(cart.settle(third.id, snapshot(&[(1, 10, 5)])), Settlement::Unknown);
    }

    #[test]
    fn test_request_sent_now_is_never_started_again() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2)])));
        let submission = cart.submit(set(1, 3));
        assert_eq!(submission.dispatch, Dispatch::Now);

        assert_eq!(cart.try_begin(submission.id), Begin::AlreadyStarted);
        assert_eq!(cart.try_begin(submission.id), Begin::AlreadyStarted);
        assert_eq!(cart.status(submission.id), RequestStatus::InFlight);
    }

    #[test]
    fn test_failed_request_reverts_view() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2)])));
        let submission = cart.submit(CartOp::RemoveLine { line_id: line_id(1) });
        assert!(cart.view().is_empty());

        assert!(cart.fail(submission.id));
        assert!(!cart.fail(submission.id));
        assert_eq!(cart.view().line(&line_id(1)).unwrap().quantity, 2);
    }

    #[test]
    fn test_zero_quantity_hides_line() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2), (2, 20, 1)])));
        cart.submit(set(1, 0));
        let view = cart.view();
        assert!(view.line(&line_id(1)).is_none());
        assert_eq!(view.total_quantity, 1);
    }

    #[test]
    fn test_add_existing_variant_increments_line() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2)])));
        cart.submit(CartOp::AddLine {
            merchandise_id: variant(10),
            quantity: 1,
        });
        let view = cart.view();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 3);
        assert!(view.lines[0].is_optimistic);
    }

    #[test]
    fn test_add_new_variant_appends_placeholder() {
        let mut cart = OptimisticCart::new(None);
        cart.submit(CartOp::AddLine {
            merchandise_id: variant(30),
            quantity: 2,
        });
        let view = cart.view();
        assert_eq!(view.lines.len(), 1);
        assert!(view.lines[0].is_placeholder());
        assert_eq!(view.total_quantity, 2);
    }

    #[test]
    fn test_different_keys_do_not_block_each_other() {
        let mut cart = OptimisticCart::new(Some(snapshot(&[(1, 10, 2), (2, 20, 1)])));
        let a = cart.submit(set(1, 4));
        let b = cart.submit(set(2, 6));
        let codes = cart.submit(CartOp::UpdateDiscountCodes {
            codes: vec!["SAVE10".to_string()],
        });

        assert_eq!(a.dispatch, Dispatch::Now);
        assert_eq!(b.dispatch, Dispatch::Now);
        assert_eq!(codes.dispatch, Dispatch::Now);

        let view = cart.view();
        assert_eq!(view.total_quantity, 10);
        assert_eq!(view.discount_codes, vec!["SAVE10".to_string()]);
    }

    #[test]
    fn test_out_of_order_response_does_not_regress_base() {
        let newer = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:10Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let older = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:05Z")
            .unwrap()
            .with_timezone(&chrono::Utc);

        let mut cart = OptimisticCart::new(None);
        let a = cart.submit(set(1, 4));
        let b = cart.submit(set(2, 6));

        let mut fresh = snapshot(&[(1, 10, 4), (2, 20, 6)]);
        fresh.updated_at = Some(newer);
        let mut stale = snapshot(&[(1, 10, 4), (2, 20, 1)]);
        stale.updated_at = Some(older);

        cart.settle(b.id, fresh);
        cart.settle(a.id, stale);

        assert_eq!(cart.view().line(&line_id(2)).unwrap().quantity, 6);
    }
}
