//! Order state storage.
//!
//! This module provides the authoritative, concurrency-safe map from order
//! identifier to lifecycle state, persisted write-through to a durable log.

pub mod order;

pub use order::{OrderStore, StoreError, StoreOptions};
