//! Skeleton Core - Storefront domain library.
//!
//! Shared by the `storefront` binary and the integration tests:
//!
//! - [`types`] - Shopify global IDs, money, and order statuses
//! - [`cart_persistence`] - The `hydrogen-cart-data` client-side cart pointer
//! - [`optimistic`] - Optimistic cart reconciliation with per-key request coalescing
//!
//! # Architecture
//!
//! Nothing here performs network I/O. Storage is reached through the
//! [`cart_persistence::KeyValueStorage`] trait and server responses are fed in
//! as [`optimistic::CartSnapshot`] values, so every rule can be tested without
//! a running storefront.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart_persistence;
pub mod optimistic;
pub mod types;

pub use cart_persistence::{
    CART_STORAGE_KEY, CartPersistence, CartPersistenceRecord, KeyValueStorage, MemoryStorage,
    RETENTION_DAYS, RecoveryOffer, StorageError, recovery_offer,
};
pub use optimistic::{
    Begin, CartOp, CartSnapshot, Dispatch, LineSnapshot, OptimisticCart, OptimisticLine,
    OptimisticView, RequestId, RequestKey, RequestStatus, Settlement, Submission,
};
pub use types::*;
