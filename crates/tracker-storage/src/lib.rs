//! Durable log for the order tracker.
//!
//! The durable log is the I/O boundary of the system: it turns the complete
//! set of orders into a line-oriented record file and back again. It holds no
//! business rules; deciding *when* to save belongs to the order store.
//!
//! Backends are pluggable. `file` is the production backend; `memory` keeps
//! the last saved ledger in process and is used in tests.

use async_trait::async_trait;
use thiserror::Error;
use tracker_types::{ConfigSchema, ImplementationRegistry, OrderLedger, ValidationError};

pub mod format;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during durable log operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A line of the record file could not be parsed. Loading stops at the
	/// first such line rather than skipping it.
	#[error("Corrupt record at line {line_number} ({line:?}): {reason}")]
	CorruptRecord {
		line_number: usize,
		line: String,
		reason: String,
	},
	/// The ledger could not be written.
	#[error("Persistence error: {0}")]
	Persistence(String),
	/// The record file could not be read.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Another process holds the record file.
	#[error("Record file locked: {0}")]
	Locked(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl From<ValidationError> for StorageError {
	fn from(err: ValidationError) -> Self {
		StorageError::Configuration(err.to_string())
	}
}

/// Trait implemented by every durable log backend.
#[async_trait]
pub trait DurableLog: Send + Sync {
	/// Loads every persisted record.
	///
	/// A log that has never been written yields an empty ledger.
	async fn load(&self) -> Result<OrderLedger, StorageError>;

	/// Replaces the persisted contents with `ledger`.
	///
	/// Readers of the backing store observe either the previous contents or
	/// the new ones, never a mix.
	///
	/// A save whose future is dropped after its first poll may still reach
	/// the backing store, but never after a save that was issued later.
	async fn save(&self, ledger: &OrderLedger) -> Result<(), StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Signature every backend factory provides.
pub type LogFactory = fn(&toml::Value) -> Result<Box<dyn DurableLog>, StorageError>;

/// Registry trait for durable log implementations.
pub trait LogRegistry: ImplementationRegistry<Factory = LogFactory> {}

/// Get all registered durable log implementations as `(name, factory)`
/// pairs.
pub fn get_all_implementations() -> Vec<(&'static str, LogFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["file", "memory"]);
	}
}
