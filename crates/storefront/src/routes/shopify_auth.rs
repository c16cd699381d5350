//! Shopify Customer Account OAuth route handlers.
//!
//! Handles the OAuth flow for Shopify Customer Account authentication:
//! - Login: Redirects to Shopify's hosted login with a PKCE challenge
//! - Authorize: Handles the callback and exchanges the code for tokens
//! - Logout: Clears the customer token and redirects to Shopify logout

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user};
use crate::middleware::{clear_shopify_customer_token, set_shopify_customer_token};
use crate::models::session_keys;
use crate::shopify::CustomerAccessToken;
use crate::shopify::customer::{PkceChallenge, random_token};
use crate::state::AppState;

/// Length of the generated `state` and `nonce` values.
const OAUTH_TOKEN_LEN: usize = 32;

/// Query parameters for `/account/login`.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

/// Query parameters from Shopify OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Keep post-login redirects on this site.
fn local_path(target: Option<&str>) -> Option<String> {
    target
        .filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.contains('\\'))
        .map(ToString::to_string)
}

/// Take a one-time value out of the session.
async fn take(session: &Session, key: &str) -> Option<String> {
    session.remove::<String>(key).await.ok().flatten()
}

/// Initiate Shopify Customer Account OAuth login.
///
/// Generates `state`, `nonce` and a PKCE verifier, stores them in the session,
/// and redirects to Shopify's authorization page.
///
/// # Route
///
/// `GET /account/login`
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect> {
    let oauth_state = random_token(OAUTH_TOKEN_LEN);
    let nonce = random_token(OAUTH_TOKEN_LEN);
    let pkce = PkceChallenge::generate();

    session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await?;
    session.insert(session_keys::OAUTH_NONCE, &nonce).await?;
    session
        .insert(session_keys::OAUTH_VERIFIER, &pkce.verifier)
        .await?;
    match local_path(query.return_to.as_deref()) {
        Some(return_to) => session.insert(session_keys::RETURN_TO, return_to).await?,
        None => {
            session.remove::<String>(session_keys::RETURN_TO).await?;
        }
    }

    let redirect_uri = state.config().absolute_url("/account/authorize");
    let auth_url =
        state
            .customer()
            .authorization_url(&redirect_uri, &oauth_state, &nonce, &pkce.challenge);

    Ok(Redirect::to(&auth_url))
}

/// Handle Shopify OAuth callback.
///
/// Validates the state parameter, exchanges the authorization code for tokens,
/// and stores the customer access token in the session.
///
/// # Route
///
/// `GET /account/authorize`
#[instrument(skip_all)]
pub async fn authorize(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        warn!(%error, %description, "Shopify OAuth error");
        return Ok(Redirect::to("/").into_response());
    }

    let stored_state = take(&session, session_keys::OAUTH_STATE).await;
    let verifier = take(&session, session_keys::OAUTH_VERIFIER).await;
    let _ = take(&session, session_keys::OAUTH_NONCE).await;
    let return_to = take(&session, session_keys::RETURN_TO).await;

    let Some(code) = query.code else {
        return Err(AppError::BadRequest("Missing authorization code".to_string()));
    };

    if stored_state.is_none() || stored_state != query.state {
        warn!("Shopify OAuth state mismatch");
        return Err(AppError::BadRequest("Invalid login state".to_string()));
    }

    let Some(verifier) = verifier else {
        return Err(AppError::BadRequest("Login session expired".to_string()));
    };

    let redirect_uri = state.config().absolute_url("/account/authorize");
    let token = state
        .customer()
        .exchange_code(&code, &verifier, &redirect_uri)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to exchange Shopify OAuth code");
            AppError::Unauthorized("Login failed".to_string())
        })?;

    // New identity, new session ID.
    session.cycle_id().await?;
    set_shopify_customer_token(&session, &token).await?;

    info!("Shopify customer authenticated");
    add_breadcrumb("auth", "login", None);

    let target = return_to.unwrap_or_else(|| "/account".to_string());
    Ok(Redirect::to(&target).into_response())
}

/// Logout from Shopify Customer Account.
///
/// Clears the customer token from the session and redirects to Shopify's
/// logout endpoint, which returns the visitor to the home page.
///
/// # Route
///
/// `POST /account/logout`
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    let token: Option<CustomerAccessToken> = session
        .get(session_keys::CUSTOMER_TOKEN)
        .await
        .ok()
        .flatten();

    if let Err(e) = clear_shopify_customer_token(&session).await {
        warn!(error = %e, "Failed to clear customer token");
    }
    clear_sentry_user();

    let Some(token) = token else {
        return Redirect::to("/");
    };

    let post_logout_uri = state.config().absolute_url("/");
    Redirect::to(
        &state
            .customer()
            .logout_url(token.id_token.as_deref(), &post_logout_uri),
    )
}
