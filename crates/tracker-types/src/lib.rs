//! Shared types for the order tracker.
//!
//! Every crate in the workspace speaks in terms of the types defined here:
//! order identity and lifecycle, the HTTP request/response bodies, and the
//! configuration schema used to validate pluggable backends.

/// HTTP response bodies and the API error type.
pub mod api;
/// Order identifiers, lifecycle states and cancellation outcomes.
pub mod order;
/// Self-registration of pluggable implementations.
pub mod registry;
/// Configuration schema validation.
pub mod validation;

pub use api::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use validation::*;
