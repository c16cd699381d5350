//! Cookie-backed client storage.
//!
//! The browser keeps the cart persistence record, like `localStorage` would in
//! a client-rendered storefront. [`ClientStorage`] reads the request's cookies
//! as a [`KeyValueStorage`] and turns writes into `Set-Cookie` headers, so a
//! handler takes it as an extractor and returns it alongside its response.
//!
//! Values are base64url-encoded JSON. A cookie larger than 4096 bytes is
//! rejected with [`StorageError::QuotaExceeded`], matching what browsers
//! accept.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponseParts, ResponseParts};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use skeleton_core::{KeyValueStorage, RETENTION_DAYS, StorageError};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};
use tracing::warn;

use crate::state::AppState;

/// Largest `name=value` pair a browser reliably stores.
pub const COOKIE_QUOTA_BYTES: usize = 4096;

/// Request cookies viewed as a key-value store, plus pending cookie writes.
#[derive(Debug, Clone, Default)]
pub struct ClientStorage {
    values: HashMap<String, String>,
    changes: Vec<Cookie<'static>>,
    secure: bool,
}

impl ClientStorage {
    /// Parse the `Cookie` headers of a request.
    #[must_use]
    pub fn from_headers(headers: &header::HeaderMap, secure: bool) -> Self {
        let values = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect();

        Self {
            values,
            changes: Vec::new(),
            secure,
        }
    }

    /// `Set-Cookie` values queued by writes and removals.
    #[must_use]
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.changes.iter().map(ToString::to_string).collect()
    }

    fn cookie(&self, name: &str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value))
            .path("/")
            .max_age(max_age)
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure)
            .build()
    }

    fn queue(&mut self, cookie: Cookie<'static>) {
        self.changes.retain(|c| c.name() != cookie.name());
        self.changes.push(cookie);
    }
}

impl KeyValueStorage for ClientStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(encoded) = self.values.get(key) else {
            return Ok(None);
        };

        // An undecodable value is handed back untouched; it fails to parse
        // and the caller clears it.
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| encoded.clone());

        Ok(Some(decoded))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let encoded = URL_SAFE_NO_PAD.encode(value);
        let size = key.len() + 1 + encoded.len();
        if size > COOKIE_QUOTA_BYTES {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                size,
                limit: COOKIE_QUOTA_BYTES,
            });
        }

        let cookie = self.cookie(
            key,
            encoded.clone(),
            Duration::days(RETENTION_DAYS),
        );
        self.queue(cookie);
        self.values.insert(key.to_string(), encoded);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let cookie = self.cookie(key, String::new(), Duration::ZERO);
        self.queue(cookie);
        self.values.remove(key);
        Ok(())
    }
}

impl FromRequestParts<AppState> for ClientStorage {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, state.config().is_secure()))
    }
}

impl IntoResponseParts for ClientStorage {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.set_cookie_headers() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "Dropping invalid Set-Cookie header"),
            }
        }
        Ok(res)
    }
}
