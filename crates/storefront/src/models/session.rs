//! Session-stored state.
//!
//! The session holds the customer's Shopify identity and the active cart; the
//! cart persistence record lives in the browser instead (see
//! [`crate::middleware::ClientStorage`]).

/// Session keys.
pub mod keys {
    /// Active Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Customer Account API tokens.
    pub const CUSTOMER_TOKEN: &str = "customer_token";

    /// OAuth `state` parameter (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// `OpenID` Connect nonce (replay protection).
    pub const OAUTH_NONCE: &str = "oauth_nonce";

    /// PKCE code verifier for the pending login.
    pub const OAUTH_VERIFIER: &str = "oauth_verifier";

    /// Path to return to after login.
    pub const RETURN_TO: &str = "return_to";
}
