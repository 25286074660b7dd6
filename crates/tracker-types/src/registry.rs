//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each pluggable backend module provides a `Registry` struct implementing
/// this trait, tying the name used under `[storage.implementations.<name>]`
/// to the factory that builds it.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"file"` for `storage.implementations.file`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
