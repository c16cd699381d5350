//! Cart route handlers.
//!
//! The active cart ID lives in the session; the browser also keeps a
//! `hydrogen-cart-data` record (see [`ClientStorage`]) so a cart can be
//! recovered after the session expires. Mutations go through the
//! [`CartCoordinator`](crate::services::CartCoordinator) and respond with the
//! cart fragment for HTMX-style requests (`HX-Request: true`) or a redirect
//! back to `/cart` for plain form posts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use skeleton_core::{
    CartId, CartLineId, CartOp, CartPersistence, CartPersistenceRecord, KeyValueStorage,
    MerchandiseId, OptimisticCart, OptimisticView, RecoveryOffer, recovery_offer,
};
use tower_sessions::Session;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, FormOutcome, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::ClientStorage;
use crate::models::{CartView, session_keys};
use crate::services::{CartOutcome, send_op};
use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartLineInput};
use crate::state::AppState;

/// Header set by the storefront script on fragment requests.
const HX_REQUEST: &str = "hx-request";

/// Event fired on the page after a cart fragment is swapped in.
const CART_UPDATED: &str = "cart-updated";

/// Largest quantity accepted from a form.
const MAX_LINE_QUANTITY: u32 = 999;

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub recovery: Option<RecoveryOffer>,
    pub message: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub message: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub merchandise_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Discount or gift card code form: add `code`, or drop `remove`.
#[derive(Debug, Deserialize)]
pub struct CodeForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub remove: String,
}

/// Cart note form data.
#[derive(Debug, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub note: String,
}

/// `?discount=` on cart permalinks.
#[derive(Debug, Deserialize)]
pub struct PermalinkQuery {
    pub discount: Option<String>,
}

/// `?redirect=` on discount links.
#[derive(Debug, Deserialize)]
pub struct DiscountQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the active cart ID from the session.
async fn active_cart_id(session: &Session) -> Option<CartId> {
    session
        .get::<CartId>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Make `cart_id` the session's active cart.
async fn set_active_cart(session: &Session, cart_id: &CartId) {
    if let Err(e) = session.insert(session_keys::CART_ID, cart_id).await {
        tracing::error!(error = %e, "Failed to save cart ID to session");
    }
}

async fn clear_active_cart(session: &Session) {
    if let Err(e) = session.remove::<CartId>(session_keys::CART_ID).await {
        warn!(error = %e, "Failed to clear cart ID from session");
    }
}

fn is_fragment_request(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn empty_view() -> OptimisticView {
    OptimisticCart::new(None).view()
}

/// Bookmark the cart in the browser. Never fails the request.
fn persist(storage: impl KeyValueStorage, cart_id: &CartId, total_quantity: u32) {
    if !CartPersistence::new(storage).save(cart_id, total_quantity) {
        debug!(cart_id = %cart_id, "Cart record not persisted");
    }
}

/// Load the session's cart and merge in pending requests.
///
/// A cart Shopify no longer knows is dropped from the session. Other failures
/// fall back to the last cart this process saw.
async fn load_cart(state: &AppState, session: &Session) -> (Option<Cart>, OptimisticView) {
    let Some(cart_id) = active_cart_id(session).await else {
        return (None, empty_view());
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => {
            let view = state.carts().observe(&cart).await;
            (Some(cart), view)
        }
        Err(ShopifyError::NotFound(_)) => {
            info!(cart_id = %cart_id, "Active cart no longer exists");
            clear_active_cart(session).await;
            (None, empty_view())
        }
        Err(e) => {
            warn!(cart_id = %cart_id, error = %e, "Failed to fetch cart");
            state.carts().current(&cart_id).await
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Respond to a cart mutation.
///
/// Fragment requests get the re-rendered cart and a `cart-updated` trigger;
/// plain form posts are redirected to the cart page, or shown it with the
/// error message on failure.
fn respond(
    fragment: bool,
    cart: CartView,
    outcome: &FormOutcome,
    recovery: Option<RecoveryOffer>,
) -> Response {
    let message = outcome.message().map(ToString::to_string);

    if fragment {
        return (
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartItemsTemplate { cart, message },
        )
            .into_response();
    }

    if outcome.is_success() {
        Redirect::to("/cart").into_response()
    } else {
        CartShowTemplate {
            cart,
            recovery,
            message,
        }
        .into_response()
    }
}

/// Apply `op` to the session's cart through the coordinator.
async fn run_op(
    state: &AppState,
    cart_id: &CartId,
    op: CartOp,
) -> std::result::Result<CartOutcome, ShopifyError> {
    let storefront = state.storefront();
    state
        .carts()
        .run(cart_id, op, |op| send_op(storefront, cart_id, op))
        .await
}

/// Run a mutation against the active cart and build the response.
async fn mutate(
    state: &AppState,
    session: &Session,
    mut storage: ClientStorage,
    headers: &HeaderMap,
    op: CartOp,
) -> (ClientStorage, Response) {
    let fragment = is_fragment_request(headers);

    let Some(cart_id) = active_cart_id(session).await else {
        let outcome = FormOutcome::Failure {
            message: "Your cart has expired. Please add the item again.".to_string(),
        };
        return (storage, respond(fragment, CartView::empty(), &outcome, None));
    };

    add_breadcrumb("cart", op.name(), Some(&[("cart_id", cart_id.as_str())]));

    match run_op(state, &cart_id, op).await {
        Ok(outcome) => {
            if !outcome.is_superseded() {
                persist(&mut storage, &cart_id, outcome.view.total_quantity);
            }
            let view = CartView::new(outcome.cart.as_ref(), &outcome.view);
            (storage, respond(fragment, view, &FormOutcome::Success, None))
        }
        Err(e) => {
            let outcome = FormOutcome::from_result::<()>(Err(e));
            let (cart, view) = state.carts().current(&cart_id).await;
            let view = CartView::new(cart.as_ref(), &view);
            (storage, respond(fragment, view, &outcome, None))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// Offers to restore a persisted cart when it differs from the active one and
/// still has items.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut storage: ClientStorage,
) -> (ClientStorage, CartShowTemplate) {
    let (cart, view) = load_cart(&state, &session).await;

    let record = CartPersistence::new(&mut storage).read();
    let recovery = recovery_offer(record.as_ref(), cart.as_ref().map(|c| &c.id));

    let template = CartShowTemplate {
        cart: CartView::new(cart.as_ref(), &view),
        recovery,
        message: None,
    };
    (storage, template)
}

/// Get cart count badge (HTMX).
#[instrument(skip_all)]
pub async fn count(State(state): State<AppState>, session: Session) -> CartCountTemplate {
    let (_, view) = load_cart(&state, &session).await;
    CartCountTemplate {
        count: view.total_quantity,
    }
}

/// Add item to cart.
///
/// Creates a new cart if the session has none or Shopify has discarded it.
#[instrument(skip(state, session, storage, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    mut storage: ClientStorage,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> (ClientStorage, Response) {
    let fragment = is_fragment_request(&headers);
    let merchandise_id = MerchandiseId::new(form.merchandise_id);
    let quantity = form.quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY);

    if let Some(cart_id) = active_cart_id(&session).await {
        let op = CartOp::AddLine {
            merchandise_id: merchandise_id.clone(),
            quantity,
        };
        match run_op(&state, &cart_id, op).await {
            Err(ShopifyError::NotFound(_)) => {
                info!(cart_id = %cart_id, "Active cart is gone; starting a new one");
            }
            result => {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let (cart, view) = state.carts().current(&cart_id).await;
                        let view = CartView::new(cart.as_ref(), &view);
                        let outcome = FormOutcome::from_result::<()>(Err(e));
                        return (storage, respond(fragment, view, &outcome, None));
                    }
                };
                if !outcome.is_superseded() {
                    persist(&mut storage, &cart_id, outcome.view.total_quantity);
                }
                let view = CartView::new(outcome.cart.as_ref(), &outcome.view);
                return (storage, respond(fragment, view, &FormOutcome::Success, None));
            }
        }
    }

    let created = state
        .storefront()
        .create_cart(
            vec![CartLineInput {
                merchandise_id,
                quantity,
            }],
            None,
        )
        .await;

    match created {
        Ok(cart) => {
            info!(cart_id = %cart.id, "Created cart");
            set_active_cart(&session, &cart.id).await;
            persist(&mut storage, &cart.id, cart.total_quantity);
            let view = state.carts().observe(&cart).await;
            let view = CartView::new(Some(&cart), &view);
            (storage, respond(fragment, view, &FormOutcome::Success, None))
        }
        Err(e) => {
            let outcome = FormOutcome::from_result::<()>(Err(e));
            (storage, respond(fragment, CartView::empty(), &outcome, None))
        }
    }
}

/// Update cart line quantity. Zero removes the line.
#[instrument(skip(state, session, storage, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    storage: ClientStorage,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> (ClientStorage, Response) {
    let op = CartOp::UpdateQuantity {
        line_id: CartLineId::new(form.line_id),
        quantity: form.quantity.min(MAX_LINE_QUANTITY),
    };
    mutate(&state, &session, storage, &headers, op).await
}

/// Remove item from cart.
#[instrument(skip(state, session, storage, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    storage: ClientStorage,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> (ClientStorage, Response) {
    let op = CartOp::RemoveLine {
        line_id: CartLineId::new(form.line_id),
    };
    mutate(&state, &session, storage, &headers, op).await
}

/// Apply `form` to the current list of codes: drop `remove`, then add `code`.
fn edit_codes(current: &[String], form: &CodeForm) -> Vec<String> {
    let remove = form.remove.trim();
    let add = form.code.trim();

    let mut codes: Vec<String> = current
        .iter()
        .filter(|c| remove.is_empty() || !c.eq_ignore_ascii_case(remove))
        .cloned()
        .collect();

    if !add.is_empty() && !codes.iter().any(|c| c.eq_ignore_ascii_case(add)) {
        codes.push(add.to_string());
    }
    codes
}

/// Add or remove a discount code.
#[instrument(skip(state, session, storage, headers))]
pub async fn discount_codes(
    State(state): State<AppState>,
    session: Session,
    storage: ClientStorage,
    headers: HeaderMap,
    Form(form): Form<CodeForm>,
) -> (ClientStorage, Response) {
    let current = load_cart(&state, &session).await.1.discount_codes;
    let op = CartOp::UpdateDiscountCodes {
        codes: edit_codes(&current, &form),
    };
    mutate(&state, &session, storage, &headers, op).await
}

/// Apply a gift card code.
#[instrument(skip_all)]
pub async fn gift_card_codes(
    State(state): State<AppState>,
    session: Session,
    storage: ClientStorage,
    headers: HeaderMap,
    Form(form): Form<CodeForm>,
) -> (ClientStorage, Response) {
    let current = load_cart(&state, &session).await.1.gift_card_codes;
    let op = CartOp::UpdateGiftCardCodes {
        codes: edit_codes(&current, &form),
    };
    mutate(&state, &session, storage, &headers, op).await
}

/// Set the cart note.
#[instrument(skip_all)]
pub async fn note(
    State(state): State<AppState>,
    session: Session,
    storage: ClientStorage,
    headers: HeaderMap,
    Form(form): Form<NoteForm>,
) -> (ClientStorage, Response) {
    let op = CartOp::UpdateNote {
        note: form.note.trim().to_string(),
    };
    mutate(&state, &session, storage, &headers, op).await
}

/// What `POST /cart/recover` does with the persisted cart.
#[derive(Debug)]
enum Recovery {
    /// The cart still exists; make it the session's cart.
    Adopt(Cart),
    /// Shopify no longer has the cart; forget the record.
    Forget,
    /// The lookup failed for another reason; try again later.
    Keep,
}

/// Decide what to do with `record` given Shopify's answer for its cart.
fn recovery(
    record: &CartPersistenceRecord,
    fetched: std::result::Result<Cart, ShopifyError>,
) -> Recovery {
    match fetched {
        Ok(cart) => Recovery::Adopt(cart),
        Err(ShopifyError::NotFound(_)) => {
            info!(cart_id = %record.cart_id, "Persisted cart no longer exists");
            Recovery::Forget
        }
        Err(e) => {
            warn!(cart_id = %record.cart_id, error = %e, "Failed to recover persisted cart");
            Recovery::Keep
        }
    }
}

/// Update the browser record for `recovery` and return the cart to adopt.
fn apply_recovery(storage: impl KeyValueStorage, decision: Recovery) -> Option<Cart> {
    match decision {
        Recovery::Adopt(cart) => {
            persist(storage, &cart.id, cart.total_quantity);
            Some(cart)
        }
        Recovery::Forget => {
            CartPersistence::new(storage).clear();
            None
        }
        Recovery::Keep => None,
    }
}

/// Adopt the persisted cart as the session's active cart.
///
/// A persisted cart Shopify no longer has is forgotten.
#[instrument(skip_all)]
pub async fn recover(
    State(state): State<AppState>,
    session: Session,
    mut storage: ClientStorage,
) -> (ClientStorage, Redirect) {
    let Some(record) = CartPersistence::new(&mut storage).read() else {
        return (storage, Redirect::to("/cart"));
    };

    let fetched = state.storefront().get_cart(&record.cart_id).await;
    if let Some(cart) = apply_recovery(&mut storage, recovery(&record, fetched)) {
        info!(cart_id = %cart.id, "Recovered persisted cart");
        add_breadcrumb("cart", "recover", Some(&[("cart_id", cart.id.as_str())]));
        set_active_cart(&session, &cart.id).await;
        state.carts().observe(&cart).await;
    }

    (storage, Redirect::to("/cart"))
}

/// Forget the persisted cart.
#[instrument(skip_all)]
pub async fn dismiss_recovery(
    mut storage: ClientStorage,
    headers: HeaderMap,
) -> (ClientStorage, Response) {
    CartPersistence::new(&mut storage).clear();

    let response = if is_fragment_request(&headers) {
        ().into_response()
    } else {
        Redirect::to("/cart").into_response()
    };
    (storage, response)
}

/// Parse permalink lines: `variant:quantity` pairs separated by commas.
///
/// Variants may be numeric IDs or full GIDs; a missing quantity means one.
fn parse_permalink(lines: &str) -> std::result::Result<Vec<CartLineInput>, String> {
    lines
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (variant, quantity) = part.trim().split_once(':').unwrap_or((part.trim(), "1"));
            let quantity: u32 = quantity
                .parse()
                .map_err(|_| format!("Invalid quantity in '{part}'"))?;
            if quantity == 0 || quantity > MAX_LINE_QUANTITY {
                return Err(format!("Invalid quantity in '{part}'"));
            }

            let merchandise_id = if variant.starts_with(skeleton_core::GID_PREFIX) {
                MerchandiseId::new(variant)
            } else if !variant.is_empty() && variant.chars().all(|c| c.is_ascii_digit()) {
                MerchandiseId::from_legacy(variant)
            } else {
                return Err(format!("Invalid variant '{variant}'"));
            };

            Ok(CartLineInput {
                merchandise_id,
                quantity,
            })
        })
        .collect()
}

/// Cart permalink: build a fresh cart from the URL and go to checkout.
///
/// `/cart/{variant}:{qty},{variant}:{qty}?discount=CODE`
#[instrument(skip(state, session, storage))]
pub async fn permalink(
    State(state): State<AppState>,
    session: Session,
    mut storage: ClientStorage,
    Path(lines): Path<String>,
    Query(query): Query<PermalinkQuery>,
) -> Result<(ClientStorage, Redirect)> {
    let lines = parse_permalink(&lines).map_err(AppError::BadRequest)?;
    if lines.is_empty() {
        return Ok((storage, Redirect::to("/cart")));
    }

    let mut cart = state.storefront().create_cart(lines, None).await?;

    if let Some(code) = query.discount.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        match state
            .storefront()
            .update_discount_codes(&cart.id, vec![code.to_string()])
            .await
        {
            Ok(updated) => cart = updated,
            Err(e) => warn!(error = %e, "Failed to apply permalink discount"),
        }
    }

    set_active_cart(&session, &cart.id).await;
    state.carts().observe(&cart).await;
    persist(&mut storage, &cart.id, cart.total_quantity);

    Ok((storage, Redirect::to(&cart.checkout_url)))
}

/// Only same-site paths are allowed as redirect targets.
fn safe_redirect(target: Option<&str>) -> &str {
    target
        .filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.contains('\\'))
        .unwrap_or("/")
}

/// Discount link: apply `code` to the cart (creating one if needed) and
/// redirect.
#[instrument(skip(state, session, storage))]
pub async fn discount(
    State(state): State<AppState>,
    session: Session,
    mut storage: ClientStorage,
    Path(code): Path<String>,
    Query(query): Query<DiscountQuery>,
) -> Result<(ClientStorage, Redirect)> {
    let code = code.trim().to_string();
    let redirect = Redirect::to(safe_redirect(query.redirect.as_deref()));
    if code.is_empty() {
        return Ok((storage, redirect));
    }

    let cart_id = match active_cart_id(&session).await {
        Some(cart_id) => cart_id,
        None => {
            let cart = state.storefront().create_cart(Vec::new(), None).await?;
            set_active_cart(&session, &cart.id).await;
            state.carts().observe(&cart).await;
            cart.id
        }
    };

    let (_, view) = load_cart(&state, &session).await;
    let codes = edit_codes(
        &view.discount_codes,
        &CodeForm {
            code,
            remove: String::new(),
        },
    );

    match run_op(&state, &cart_id, CartOp::UpdateDiscountCodes { codes }).await {
        Ok(outcome) => persist(&mut storage, &cart_id, outcome.view.total_quantity),
        Err(e) => warn!(error = %e, "Failed to apply discount link"),
    }

    Ok((storage, redirect))
}

/// Redirect to Shopify checkout.
#[instrument(skip_all)]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Redirect {
    let (cart, _) = load_cart(&state, &session).await;

    match cart {
        Some(cart) if cart.total_quantity > 0 => Redirect::to(&cart.checkout_url),
        _ => Redirect::to("/cart"),
    }
}
