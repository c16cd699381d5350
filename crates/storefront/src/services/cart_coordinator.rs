//! Per-cart coordination of optimistic cart mutations.
//!
//! Every remote cart gets one [`OptimisticCart`] shared by all requests that
//! touch it. Handlers go through [`CartCoordinator::run`], which submits the
//! operation, waits while another request for the same key is in flight,
//! sends it, and settles the response. Rapid edits to one line therefore
//! reach Shopify one at a time, and a queued edit that is replaced by a newer
//! one is never sent. A request abandoned mid-run (the client went away) is
//! failed, so it never holds its key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use skeleton_core::{
    Begin, CartId, CartOp, Dispatch, OptimisticCart, OptimisticView, RequestId, Settlement,
};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, instrument, warn};

use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput};
use crate::shopify::{ShopifyError, StorefrontClient};

/// Carts untouched for this long are forgotten.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Result of a coordinated cart mutation.
#[derive(Debug, Clone)]
pub struct CartOutcome {
    /// Latest full cart known for this cart id.
    pub cart: Option<Cart>,
    /// Merged view over `cart`, including other requests still pending.
    pub view: OptimisticView,
    /// How the request ended; `None` when it was replaced before being sent.
    pub settlement: Option<Settlement>,
}

impl CartOutcome {
    /// Whether the request was replaced by a newer one for the same key.
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        self.settlement.is_none()
    }
}

#[derive(Default)]
struct CartState {
    engine: OptimisticCart,
    cart: Option<Cart>,
}

impl CartState {
    /// Keep `cart` if it is not older than the one already held.
    fn remember(&mut self, cart: &Cart) {
        let newer = self.cart.as_ref().is_none_or(|held| {
            held.id != cart.id || cart.snapshot().is_newer_or_equal(&held.snapshot())
        });
        if newer {
            self.cart = Some(cart.clone());
        }
    }
}

#[derive(Default)]
struct CartSlot {
    state: Mutex<CartState>,
    turn: Notify,
}

/// Optimistic state for every active cart.
#[derive(Clone)]
pub struct CartCoordinator {
    slots: Cache<CartId, Arc<CartSlot>>,
}

impl Default for CartCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl CartCoordinator {
    /// Create an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        let slots = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(IDLE_TIMEOUT)
            .build();
        Self { slots }
    }

    async fn slot(&self, cart_id: &CartId) -> Arc<CartSlot> {
        self.slots
            .get_with(cart_id.clone(), async { Arc::new(CartSlot::default()) })
            .await
    }

    /// Record a freshly loaded cart and return the merged view over it.
    pub async fn observe(&self, cart: &Cart) -> OptimisticView {
        let slot = self.slot(&cart.id).await;
        let mut state = slot.state.lock().await;
        state.engine.observe(cart.snapshot());
        state.remember(cart);
        state.engine.view()
    }

    /// The latest cart and merged view held for `cart_id`, without any I/O.
    pub async fn current(&self, cart_id: &CartId) -> (Option<Cart>, OptimisticView) {
        let slot = self.slot(cart_id).await;
        let state = slot.state.lock().await;
        (state.cart.clone(), state.engine.view())
    }

    /// Submit `op` against `cart_id` and send it with `send` once its key is free.
    ///
    /// The lock is released while `send` runs. A request replaced while
    /// queued returns without calling `send`.
    ///
    /// # Errors
    ///
    /// Returns the error from `send`; the failed request is dropped from the
    /// view.
    #[instrument(skip(self, send), fields(cart_id = %cart_id, op = op.name()))]
    pub async fn run<F, Fut>(
        &self,
        cart_id: &CartId,
        op: CartOp,
        send: F,
    ) -> Result<CartOutcome, ShopifyError>
    where
        F: FnOnce(CartOp) -> Fut,
        Fut: Future<Output = Result<Cart, ShopifyError>>,
    {
        let slot = self.slot(cart_id).await;

        let immediate = op.clone();
        let submission = slot.state.lock().await.engine.submit(op);
        let mut pending = PendingRequest::new(Arc::clone(&slot), submission.id);
        if !submission.superseded.is_empty() {
            debug!(
                request = %submission.id,
                superseded = submission.superseded.len(),
                "Replaced queued cart requests"
            );
            slot.turn.notify_waiters();
        }

        let op = match submission.dispatch {
            Dispatch::Now => Some(immediate),
            Dispatch::Queued => {
                debug!(request = %submission.id, "Cart request queued");
                wait_for_turn(&slot, submission.id).await
            }
        };

        let Some(op) = op else {
            debug!(request = %submission.id, "Cart request superseded before sending");
            let mut state = slot.state.lock().await;
            state.engine.fail(submission.id);
            pending.finish();
            return Ok(CartOutcome {
                cart: state.cart.clone(),
                view: state.engine.view(),
                settlement: None,
            });
        };

        let result = send(op).await;

        let mut state = slot.state.lock().await;
        let outcome = match result {
            Ok(cart) => {
                let settlement = state.engine.settle(submission.id, cart.snapshot());
                state.remember(&cart);
                debug!(request = %submission.id, ?settlement, "Cart request settled");
                Ok(CartOutcome {
                    cart: state.cart.clone(),
                    view: state.engine.view(),
                    settlement: Some(settlement),
                })
            }
            Err(e) => {
                warn!(request = %submission.id, error = %e, "Cart request failed");
                state.engine.fail(submission.id);
                Err(e)
            }
        };
        pending.finish();
        drop(state);
        slot.turn.notify_waiters();

        outcome
    }
}

/// A submitted request whose `run` has not finished yet.
///
/// If the handler is dropped first (client went away), the request is failed
/// on drop so its key does not stay in flight forever.
struct PendingRequest {
    slot: Arc<CartSlot>,
    id: RequestId,
    finished: bool,
}

impl PendingRequest {
    const fn new(slot: Arc<CartSlot>, id: RequestId) -> Self {
        Self {
            slot,
            id,
            finished: false,
        }
    }

    const fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let id = self.id;
        if let Ok(mut state) = self.slot.state.try_lock() {
            abandon(&mut state, id);
            drop(state);
            self.slot.turn.notify_waiters();
            return;
        }

        // The lock is busy; finish the cleanup once it is free.
        let slot = Arc::clone(&self.slot);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    abandon(&mut *slot.state.lock().await, id);
                    slot.turn.notify_waiters();
                });
            }
            Err(_) => warn!(request = %id, "Abandoned cart request left pending"),
        }
    }
}

fn abandon(state: &mut CartState, id: RequestId) {
    if state.engine.fail(id) {
        debug!(request = %id, "Dropped abandoned cart request");
    }
}

/// Wait until `id` may be sent. Returns `None` if it was superseded.
async fn wait_for_turn(slot: &CartSlot, id: RequestId) -> Option<CartOp> {
    loop {
        let notified = slot.turn.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let begin = slot.state.lock().await.engine.try_begin(id);
        match begin {
            Begin::Started(op) => return Some(op),
            // Only this request moves itself in flight.
            Begin::Superseded | Begin::AlreadyStarted => return None,
            Begin::Waiting => notified.await,
        }
    }
}

/// Send a cart operation to the Storefront API.
///
/// # Errors
///
/// Returns an error if the mutation fails or Shopify reports user errors.
pub async fn send_op(
    storefront: &StorefrontClient,
    cart_id: &CartId,
    op: CartOp,
) -> Result<Cart, ShopifyError> {
    match op {
        CartOp::AddLine {
            merchandise_id,
            quantity,
        } => {
            storefront
                .add_to_cart(
                    cart_id,
                    vec![CartLineInput {
                        merchandise_id,
                        quantity,
                    }],
                )
                .await
        }
        CartOp::UpdateQuantity { line_id, quantity } => {
            storefront
                .update_cart_lines(
                    cart_id,
                    vec![CartLineUpdateInput {
                        id: line_id,
                        quantity,
                    }],
                )
                .await
        }
        CartOp::RemoveLine { line_id } => storefront.remove_from_cart(cart_id, vec![line_id]).await,
        CartOp::UpdateDiscountCodes { codes } => {
            storefront.update_discount_codes(cart_id, codes).await
        }
        CartOp::UpdateGiftCardCodes { codes } => {
            storefront.update_gift_card_codes(cart_id, codes).await
        }
        CartOp::UpdateNote { note } => storefront.update_cart_note(cart_id, &note).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::shopify::fixtures::{cart, line};
    use chrono::{TimeZone, Utc};
    use skeleton_core::CartLineId;
    use tokio::sync::oneshot;

    fn line_id(n: u32) -> CartLineId {
        CartLineId::new(format!("gid://shopify/CartLine/{n}"))
    }

    fn at(minute: u32) -> Option<chrono::DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap())
    }

    #[tokio::test]
    async fn test_pending_update_shows_in_view() {
        let coordinator = CartCoordinator::new();
        let server = cart(vec![line(1, 10, 2)], at(0));
        coordinator.observe(&server).await;

        let (release, gate) = oneshot::channel::<()>();
        let task = {
            let coordinator = coordinator.clone();
            let cart_id = server.id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 3,
                        },
                        |_| async move {
                            gate.await.unwrap();
                            Ok(cart(vec![line(1, 10, 3)], at(1)))
                        },
                    )
                    .await
            })
        };

        // Let the request reach the network call.
        tokio::task::yield_now().await;
        let (_, view) = loop {
            let current = coordinator.current(&server.id).await;
            if current.1.is_optimistic {
                break current;
            }
            tokio::task::yield_now().await;
        };
        let pending = view.line(&line_id(1)).unwrap();
        assert_eq!(pending.quantity, 3);
        assert!(pending.is_optimistic);

        release.send(()).unwrap();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.settlement, Some(Settlement::Settled));
        assert!(!outcome.view.is_optimistic);
        assert_eq!(outcome.view.line(&line_id(1)).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_rapid_updates_settle_once_on_last_value() {
        let coordinator = CartCoordinator::new();
        let server = cart(vec![line(1, 10, 1)], at(0));
        coordinator.observe(&server).await;
        let cart_id = server.id.clone();

        let (release_first, first_gate) = oneshot::channel::<()>();
        let first = {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 3,
                        },
                        |_| async move {
                            first_gate.await.unwrap();
                            Ok(cart(vec![line(1, 10, 3)], at(1)))
                        },
                    )
                    .await
            })
        };

        // Wait until the first request is in flight.
        loop {
            if coordinator.current(&cart_id).await.1.is_optimistic {
                break;
            }
            tokio::task::yield_now().await;
        }

        let second = {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 2,
                        },
                        |op| async move {
                            assert_eq!(
                                op,
                                CartOp::UpdateQuantity {
                                    line_id: line_id(1),
                                    quantity: 2
                                }
                            );
                            Ok(cart(vec![line(1, 10, 2)], at(2)))
                        },
                    )
                    .await
            })
        };

        // The queued value is already what the customer sees.
        loop {
            let (_, view) = coordinator.current(&cart_id).await;
            if view.line(&line_id(1)).unwrap().quantity == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }

        release_first.send(()).unwrap();
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        let outcomes = [&first, &second];
        let settled: Vec<_> = outcomes
            .iter()
            .filter(|o| o.settlement == Some(Settlement::Settled))
            .collect();
        assert_eq!(settled.len(), 1);
        assert_eq!(first.settlement, Some(Settlement::Absorbed));
        assert_eq!(second.view.line(&line_id(1)).unwrap().quantity, 2);
        assert!(!second.view.is_optimistic);
        assert_eq!(second.cart.unwrap().total_quantity, 2);
    }

    #[tokio::test]
    async fn test_queued_request_is_superseded() {
        let coordinator = CartCoordinator::new();
        let server = cart(vec![line(1, 10, 1)], at(0));
        coordinator.observe(&server).await;
        let cart_id = server.id.clone();

        let (release, gate) = oneshot::channel::<()>();
        let first = {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 4,
                        },
                        |_| async move {
                            gate.await.unwrap();
                            Ok(cart(vec![line(1, 10, 4)], at(1)))
                        },
                    )
                    .await
            })
        };
        loop {
            if coordinator.current(&cart_id).await.1.is_optimistic {
                break;
            }
            tokio::task::yield_now().await;
        }

        let update = |quantity| {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity,
                        },
                        move |_| async move { Ok(cart(vec![line(1, 10, quantity)], at(2))) },
                    )
                    .await
            })
        };
        let replaced = update(5);
        loop {
            let (_, view) = coordinator.current(&cart_id).await;
            if view.line(&line_id(1)).unwrap().quantity == 5 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let last = update(6);

        let replaced = replaced.await.unwrap().unwrap();
        assert!(replaced.is_superseded());

        release.send(()).unwrap();
        first.await.unwrap().unwrap();
        let last = last.await.unwrap().unwrap();
        assert_eq!(last.settlement, Some(Settlement::Settled));
        assert_eq!(last.view.line(&line_id(1)).unwrap().quantity, 6);
    }

    #[tokio::test]
    async fn test_failed_request_reverts_view() {
        let coordinator = CartCoordinator::new();
        let server = cart(vec![line(1, 10, 2)], at(0));
        coordinator.observe(&server).await;

        let result = coordinator
            .run(&server.id, CartOp::RemoveLine { line_id: line_id(1) }, |_| async {
                Err(ShopifyError::UserError("Line is locked".to_string()))
            })
            .await;
        assert!(matches!(result, Err(ShopifyError::UserError(_))));

        let (held, view) = coordinator.current(&server.id).await;
        assert_eq!(held.unwrap().total_quantity, 2);
        assert_eq!(view.line(&line_id(1)).unwrap().quantity, 2);
        assert!(!view.is_optimistic);
    }

    #[tokio::test]
    async fn test_observe_ignores_older_cart() {
        let coordinator = CartCoordinator::new();
        coordinator
            .observe(&cart(vec![line(1, 10, 5)], at(5)))
            .await;
        let view = coordinator
            .observe(&cart(vec![line(1, 10, 1)], at(1)))
            .await;
        assert_eq!(view.total_quantity, 5);
    }

    #[tokio::test]
    async fn test_cancelled_request_frees_its_line() {
        let coordinator = CartCoordinator::new();
        let server = cart(vec![line(1, 10, 2)], at(0));
        coordinator.observe(&server).await;
        let cart_id = server.id.clone();

        let stuck = {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 3,
                        },
                        |_| std::future::pending::<Result<Cart, ShopifyError>>(),
                    )
                    .await
            })
        };

        // Wait until the request is in flight, then drop the handler.
        loop {
            if coordinator.current(&cart_id).await.1.is_optimistic {
                break;
            }
            tokio::task::yield_now().await;
        }
        stuck.abort();
        assert!(stuck.await.unwrap_err().is_cancelled());

        let (_, view) = coordinator.current(&cart_id).await;
        assert!(!view.is_optimistic);
        assert_eq!(view.line(&line_id(1)).unwrap().quantity, 2);

        let next = tokio::time::timeout(
            Duration::from_secs(2),
            coordinator.run(
                &cart_id,
                CartOp::UpdateQuantity {
                    line_id: line_id(1),
                    quantity: 4,
                },
                |_| async { Ok(cart(vec![line(1, 10, 4)], at(1))) },
            ),
        )
        .await
        .expect("later update for the same line must not wait on a cancelled one")
        .unwrap();

        assert_eq!(next.settlement, Some(Settlement::Settled));
        assert_eq!(next.view.line(&line_id(1)).unwrap().quantity, 4);
        assert!(!next.view.is_optimistic);
    }

    #[tokio::test]
    async fn test_cancelled_queued_request_leaves_the_view() {
        let coordinator = CartCoordinator::new();
        let server = cart(vec![line(1, 10, 1)], at(0));
        coordinator.observe(&server).await;
        let cart_id = server.id.clone();

        let (release, gate) = oneshot::channel::<()>();
        let first = {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 3,
                        },
                        |_| async move {
                            gate.await.unwrap();
                            Ok(cart(vec![line(1, 10, 3)], at(1)))
                        },
                    )
                    .await
            })
        };
        loop {
            if coordinator.current(&cart_id).await.1.is_optimistic {
                break;
            }
            tokio::task::yield_now().await;
        }

        let queued = {
            let coordinator = coordinator.clone();
            let cart_id = cart_id.clone();
            tokio::spawn(async move {
                coordinator
                    .run(
                        &cart_id,
                        CartOp::UpdateQuantity {
                            line_id: line_id(1),
                            quantity: 7,
                        },
                        |_| async { Ok(cart(vec![line(1, 10, 7)], at(2))) },
                    )
                    .await
            })
        };
        loop {
            let (_, view) = coordinator.current(&cart_id).await;
            if view.line(&line_id(1)).unwrap().quantity == 7 {
                break;
            }
            tokio::task::yield_now().await;
        }
        queued.abort();
        assert!(queued.await.unwrap_err().is_cancelled());

        let (_, view) = coordinator.current(&cart_id).await;
        assert_eq!(view.line(&line_id(1)).unwrap().quantity, 3);

        release.send(()).unwrap();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.settlement, Some(Settlement::Settled));
        assert!(!first.view.is_optimistic);
    }
}
