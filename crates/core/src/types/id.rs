//! Newtype IDs for Shopify global IDs.
//!
//! Shopify identifies every object with a GID of the form
//! `gid://shopify/<Type>/<id>` (carts carry a `?key=` suffix). Use the
//! `define_gid!` macro to create type-safe wrappers that prevent accidentally
//! passing a cart line ID where a merchandise ID is expected.

/// Prefix shared by all Shopify global IDs.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Macro to define a type-safe Shopify GID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `into_inner()`, `legacy_id()`
/// - `From<String>`, `From<&str>`, `AsRef<str>` and `Display`
///
/// # Example
///
/// ```rust
/// # use skeleton_core::define_gid;
/// define_gid!(OrderId);
/// define_gid!(AddressId);
///
/// let order_id = OrderId::new("gid://shopify/Order/1001");
/// assert_eq!(order_id.legacy_id(), "1001");
///
/// // These are different types, so this won't compile:
/// // let _: AddressId = order_id;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the full GID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The trailing numeric segment of the GID, without any query suffix.
            ///
            /// Returns the whole value when it is not a GID.
            #[must_use]
            pub fn legacy_id(&self) -> &str {
                $crate::types::id::legacy_segment(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Extract the trailing ID segment of a GID.
#[doc(hidden)]
#[must_use]
pub fn legacy_segment(gid: &str) -> &str {
    let without_query = gid.split('?').next().unwrap_or(gid);
    if !without_query.starts_with(GID_PREFIX) {
        return without_query;
    }
    without_query.rsplit('/').next().unwrap_or(without_query)
}

/// Build a GID from a resource type and a legacy numeric ID.
#[must_use]
pub fn to_gid(resource: &str, legacy_id: &str) -> String {
    format!("{GID_PREFIX}{resource}/{legacy_id}")
}

define_gid!(CartId);
define_gid!(CartLineId);
define_gid!(MerchandiseId);
define_gid!(ProductId);
define_gid!(OrderId);
define_gid!(AddressId);

impl OrderId {
    /// Build an order GID from the numeric ID used in account URLs.
    #[must_use]
    pub fn from_legacy(legacy_id: &str) -> Self {
        Self(to_gid("Order", legacy_id))
    }
}

impl AddressId {
    /// Build a customer address GID from the numeric ID used in form actions.
    #[must_use]
    pub fn from_legacy(legacy_id: &str) -> Self {
        Self(to_gid("CustomerAddress", legacy_id))
    }
}

impl MerchandiseId {
    /// Build a variant GID from the numeric ID used in cart permalinks.
    #[must_use]
    pub fn from_legacy(legacy_id: &str) -> Self {
        Self(to_gid("ProductVariant", legacy_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_id_from_gid() {
        let id = OrderId::new("gid://shopify/Order/5501");
        assert_eq!(id.legacy_id(), "5501");
    }

    #[test]
    fn test_legacy_id_strips_cart_key() {
        let id = CartId::new("gid://shopify/Cart/c1-abc123?key=deadbeef");
        assert_eq!(id.legacy_id(), "c1-abc123");
    }

    #[test]
    fn test_legacy_id_of_plain_value() {
        let id = MerchandiseId::new("42");
        assert_eq!(id.legacy_id(), "42");
    }

    #[test]
    fn test_from_legacy_round_trips() {
        let id = OrderId::from_legacy("77");
        assert_eq!(id.as_str(), "gid://shopify/Order/77");
        assert_eq!(id.legacy_id(), "77");

        let address = AddressId::from_legacy("9");
        assert_eq!(address.as_str(), "gid://shopify/CustomerAddress/9");
    }

    #[test]
    fn test_serde_transparent() {
        let id = CartLineId::new("gid://shopify/CartLine/1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"gid://shopify/CartLine/1\"");
    }
}
