//! Business logic services for storefront.
//!
//! - [`cart_coordinator`] - Serializes cart mutations per line and keeps the
//!   optimistic view of every active cart

pub mod cart_coordinator;

pub use cart_coordinator::{CartCoordinator, CartOutcome, send_op};
