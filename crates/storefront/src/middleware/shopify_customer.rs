//! Shopify customer authentication extractors.
//!
//! The Customer Account API token obtained at `/account/authorize` is kept in
//! the session. Expired tokens are refreshed on the way in; a customer whose
//! token can't be refreshed is treated as logged out.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::models::session_keys;
use crate::shopify::CustomerAccessToken;
use crate::state::AppState;

/// Extractor that requires a logged-in customer.
///
/// Anonymous visitors are redirected to `/account/login`, which sends them
/// back to the page they asked for afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(
///     State(state): State<AppState>,
///     RequireShopifyCustomer(token): RequireShopifyCustomer,
/// ) -> Result<impl IntoResponse> {
///     let orders = state.customer().get_orders(&token.access_token, 20, None).await?;
///     // ...
/// }
/// ```
pub struct RequireShopifyCustomer(pub CustomerAccessToken);

/// Rejection for [`RequireShopifyCustomer`].
pub enum ShopifyCustomerRejection {
    /// Send the visitor through the hosted login.
    RedirectToLogin { return_to: String },
    /// The session layer is missing.
    SessionUnavailable,
}

impl IntoResponse for ShopifyCustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { return_to } => Redirect::to(&format!(
                "/account/login?return_to={}",
                urlencoding::encode(&return_to)
            ))
            .into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireShopifyCustomer {
    type Rejection = ShopifyCustomerRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(ShopifyCustomerRejection::SessionUnavailable)?;

        current_token(session, state)
            .await
            .map(Self)
            .ok_or_else(|| {
                // Nested routers see a stripped URI; the original is kept aside.
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map_or(&parts.uri, |original| &original.0);
                ShopifyCustomerRejection::RedirectToLogin {
                    return_to: uri
                        .path_and_query()
                        .map_or_else(|| "/account".to_string(), ToString::to_string),
                }
            })
    }
}

/// Load the session's token, refreshing it if it has expired.
async fn current_token(session: &Session, state: &AppState) -> Option<CustomerAccessToken> {
    let token: CustomerAccessToken = session
        .get(session_keys::CUSTOMER_TOKEN)
        .await
        .ok()
        .flatten()?;

    if !token.is_expired() {
        return Some(token);
    }

    let Some(refresh_token) = token.refresh_token.as_deref() else {
        debug!("Customer token expired without a refresh token");
        let _ = clear_shopify_customer_token(session).await;
        return None;
    };

    match state.customer().refresh_token(refresh_token).await {
        Ok(mut refreshed) => {
            if refreshed.id_token.is_none() {
                refreshed.id_token.clone_from(&token.id_token);
            }
            if refreshed.refresh_token.is_none() {
                refreshed.refresh_token.clone_from(&token.refresh_token);
            }
            if let Err(e) = set_shopify_customer_token(session, &refreshed).await {
                warn!(error = %e, "Failed to store refreshed customer token");
            }
            debug!("Refreshed customer token");
            Some(refreshed)
        }
        Err(e) => {
            warn!(error = %e, "Customer token refresh failed");
            let _ = clear_shopify_customer_token(session).await;
            None
        }
    }
}

/// Store the customer's token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_shopify_customer_token(
    session: &Session,
    token: &CustomerAccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CUSTOMER_TOKEN, token).await
}

/// Remove the customer's token from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_shopify_customer_token(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CustomerAccessToken>(session_keys::CUSTOMER_TOKEN)
        .await?;
    Ok(())
}
