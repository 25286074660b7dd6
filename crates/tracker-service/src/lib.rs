//! HTTP front end of the order tracker.
//!
//! Exposes the router and state so tests can drive the API in process; the
//! `order-tracker` binary builds on this library.

pub mod apis;
pub mod server;

pub use server::{build_router, start_server, AppState};
