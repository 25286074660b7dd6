//! In-memory durable log.
//!
//! Keeps the most recently saved ledger in process memory. Nothing survives
//! a restart, so this backend is meant for tests and throwaway deployments.

use crate::{DurableLog, LogFactory, LogRegistry, StorageError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracker_types::{ConfigSchema, ImplementationRegistry, OrderLedger, Schema, ValidationError};

/// In-memory durable log.
#[derive(Default)]
pub struct MemoryLog {
	/// Last saved ledger.
	ledger: RwLock<OrderLedger>,
	/// Number of completed saves.
	saves: AtomicUsize,
}

impl MemoryLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copy of what is currently "on disk".
	pub async fn persisted(&self) -> OrderLedger {
		self.ledger.read().await.clone()
	}

	pub fn save_count(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl DurableLog for MemoryLog {
	async fn load(&self) -> Result<OrderLedger, StorageError> {
		Ok(self.ledger.read().await.clone())
	}

	async fn save(&self, ledger: &OrderLedger) -> Result<(), StorageError> {
		*self.ledger.write().await = ledger.clone();
		self.saves.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryLogSchema)
	}
}

/// Configuration schema for MemoryLog.
pub struct MemoryLogSchema;

impl ConfigSchema for MemoryLogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No fields; only checks that the section is a table
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory log.
///
/// Configuration parameters:
/// - None
pub fn create_log(config: &toml::Value) -> Result<Box<dyn DurableLog>, StorageError> {
	MemoryLogSchema.validate(config)?;
	Ok(Box::new(MemoryLog::new()))
}

/// Registry for the memory log implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = LogFactory;

	fn factory() -> Self::Factory {
		create_log
	}
}

impl LogRegistry for Registry {}
