//! View models and session state for the storefront.
//!
//! - [`cart`] - The cart view every cart template renders
//! - [`session`] - Keys for data stored in the session

pub mod cart;
pub mod session;

pub use cart::{CartLineView, CartView, DiscountCodeView, GiftCardView};
pub use session::keys as session_keys;
