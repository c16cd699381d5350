//! Integration tests for optimistic cart reconciliation.
//!
//! These drive [`OptimisticCart`] the way the storefront's cart coordinator
//! does: submit, send when the key is free, settle with the server's answer.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, TimeZone, Utc};
use skeleton_core::{
    Begin, CartId, CartLineId, CartOp, CartSnapshot, Dispatch, LineSnapshot, MerchandiseId,
    OptimisticCart, RequestStatus, Settlement,
};

fn line_id() -> CartLineId {
    CartLineId::new("gid://shopify/CartLine/L1")
}

fn server_cart(quantity: u32, minutes: i64) -> CartSnapshot {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    CartSnapshot {
        lines: vec![LineSnapshot {
            id: line_id(),
            merchandise_id: MerchandiseId::new("gid://shopify/ProductVariant/100"),
            quantity,
        }],
        updated_at: Some(start + Duration::minutes(minutes)),
        ..CartSnapshot::empty(CartId::new("gid://shopify/Cart/c1?key=k"))
    }
}

fn set_quantity(quantity: u32) -> CartOp {
    CartOp::UpdateQuantity {
        line_id: line_id(),
        quantity,
    }
}

// =============================================================================
// Pending Updates
// =============================================================================

#[test]
fn test_pending_update_shows_new_quantity() {
    let mut cart = OptimisticCart::new(Some(server_cart(2, 0)));
    cart.submit(set_quantity(3));

    let view = cart.view();
    let line = view.line(&line_id()).unwrap();
    assert_eq!(line.quantity, 3);
    assert!(line.is_optimistic);
    assert!(view.is_optimistic);
    assert_eq!(view.total_quantity, 3);
}

#[test]
fn test_rapid_updates_settle_once_with_last_value() {
    let mut cart = OptimisticCart::new(Some(server_cart(2, 0)));

    let first = cart.submit(set_quantity(3));
    let second = cart.submit(set_quantity(2));
    assert_eq!(first.dispatch, Dispatch::Now);
    assert_eq!(second.dispatch, Dispatch::Queued);

    // The first response lands while the second is queued: absorbed, and the
    // view keeps the newer value.
    assert_eq!(cart.settle(first.id, server_cart(3, 1)), Settlement::Absorbed);
    assert_eq!(cart.view().line(&line_id()).unwrap().quantity, 2);

    assert_eq!(cart.try_begin(second.id), Begin::Started(set_quantity(2)));
    assert_eq!(cart.settle(second.id, server_cart(2, 2)), Settlement::Settled);

    let view = cart.view();
    assert!(!view.is_optimistic);
    assert_eq!(view.line(&line_id()).unwrap().quantity, 2);
}

#[test]
fn test_queued_update_is_superseded() {
    let mut cart = OptimisticCart::new(Some(server_cart(1, 0)));

    let first = cart.submit(set_quantity(2));
    let second = cart.submit(set_quantity(3));
    let third = cart.submit(set_quantity(4));

    assert_eq!(third.superseded, vec![second.id]);
    assert_eq!(cart.status(second.id), RequestStatus::Finished);
    assert_eq!(cart.try_begin(second.id), Begin::Superseded);
    assert_eq!(cart.try_begin(third.id), Begin::Waiting);

    cart.settle(first.id, server_cart(2, 1));
    assert_eq!(cart.try_begin(third.id), Begin::Started(set_quantity(4)));
}

#[test]
fn test_failed_update_reverts_view() {
    let mut cart = OptimisticCart::new(Some(server_cart(2, 0)));
    let submission = cart.submit(set_quantity(5));

    assert!(cart.fail(submission.id));
    let view = cart.view();
    assert_eq!(view.line(&line_id()).unwrap().quantity, 2);
    assert!(!view.is_optimistic);
}

// =============================================================================
// Independent Keys
// =============================================================================

#[test]
fn test_different_keys_do_not_wait_for_each_other() {
    let mut cart = OptimisticCart::new(Some(server_cart(1, 0)));

    let quantity = cart.submit(set_quantity(2));
    let note = cart.submit(CartOp::UpdateNote {
        note: "Gift wrap please".to_string(),
    });
    let add = cart.submit(CartOp::AddLine {
        merchandise_id: MerchandiseId::new("gid://shopify/ProductVariant/200"),
        quantity: 1,
    });

    assert_eq!(quantity.dispatch, Dispatch::Now);
    assert_eq!(note.dispatch, Dispatch::Now);
    assert_eq!(add.dispatch, Dispatch::Now);

    let view = cart.view();
    assert_eq!(view.total_quantity, 3);
    assert_eq!(view.note.as_deref(), Some("Gift wrap please"));
    assert!(view.lines.iter().any(|l| l.is_placeholder()));
}

#[test]
fn test_out_of_order_response_does_not_roll_back_base() {
    let mut cart = OptimisticCart::new(Some(server_cart(4, 5)));
    cart.observe(server_cart(1, 1));

    assert_eq!(cart.view().line(&line_id()).unwrap().quantity, 4);
}
