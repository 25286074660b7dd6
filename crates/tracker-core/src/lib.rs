//! Core of the order tracker.
//!
//! Hosts the [`OrderStore`], which owns every order's lifecycle state and
//! keeps it consistent with the durable log, and the [`StoreBuilder`], which
//! assembles a store from configuration.

pub mod builder;
pub mod store;

pub use builder::{BuilderError, StoreBuilder};
pub use store::{OrderStore, StoreError, StoreOptions};
