//! Builder for constructing an order store from configuration.
//!
//! The primary durable log named in `[storage]` is created through its
//! factory, its table is checked against the backend's schema, and the
//! resulting log is handed to [`OrderStore::open`].

use crate::store::{OrderStore, StoreError, StoreOptions};
use std::collections::HashMap;
use thiserror::Error;
use tracker_config::Config;
use tracker_storage::{DurableLog, StorageError};

/// Errors that can occur during order store construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	/// The log was built but its contents could not be loaded.
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Builder for an [`OrderStore`] with a pluggable durable log.
pub struct StoreBuilder {
	config: Config,
}

impl StoreBuilder {
	/// Creates a new StoreBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the store using the factory registered for the primary log.
	///
	/// Only the primary implementation is instantiated, so secondary
	/// sections never touch their backing files.
	pub async fn build<F>(self, factories: &HashMap<String, F>) -> Result<OrderStore, BuilderError>
	where
		F: Fn(&toml::Value) -> Result<Box<dyn DurableLog>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let log_config = self.config.storage.primary_config().ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' not found in implementations",
				primary
			))
		})?;
		let factory = factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown storage implementation '{}'", primary))
		})?;

		let log = factory(log_config).map_err(|e| {
			tracing::error!(
				component = "storage",
				implementation = %primary,
				error = %e,
				"Failed to create storage implementation"
			);
			BuilderError::Config(format!(
				"Failed to create storage implementation '{}': {}",
				primary, e
			))
		})?;
		log.config_schema().validate(log_config).map_err(|e| {
			BuilderError::Config(format!("Invalid configuration for '{}': {}", primary, e))
		})?;
		tracing::info!(component = "storage", implementation = %primary, "Loaded");

		let options = StoreOptions {
			persist_timeout: self.config.persist_timeout(),
		};
		let store = OrderStore::open(log, options).await?;
		Ok(store)
	}
}
