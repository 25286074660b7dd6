//! Configuration module for the order tracker.
//!
//! Configuration is read from a TOML file. Any `${VAR}` or
//! `${VAR:-default}` occurrence is replaced with the environment variable's
//! value before parsing, and the parsed configuration is validated before it
//! is handed out.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the order tracker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Durable log selection and tuning.
	pub storage: StorageConfig,
	/// HTTP API server.
	#[serde(default)]
	pub api: ApiConfig,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Name reported by the health endpoint and in logs.
	pub id: String,
}

/// Configuration for the durable log.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Upper bound on a single save in milliseconds; `0` disables the bound.
	#[serde(default = "default_persist_timeout_ms")]
	pub persist_timeout_ms: u64,
}

impl StorageConfig {
	/// The save bound as a duration, or `None` when disabled.
	pub fn persist_timeout(&self) -> Option<Duration> {
		(self.persist_timeout_ms > 0).then(|| Duration::from_millis(self.persist_timeout_ms))
	}

	/// Configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

fn default_persist_timeout_ms() -> u64 {
	5_000
}

/// Longest accepted `persist_timeout_ms` (10 minutes).
const MAX_PERSIST_TIMEOUT_MS: u64 = 600_000;

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
		}
	}
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |cap: &regex::Captures<'_>| {
		let var_name = &cap[1];
		match (std::env::var(var_name), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| var_name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(var_name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			var_name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Save bound derived from `storage.persist_timeout_ms`.
	pub fn persist_timeout(&self) -> Option<Duration> {
		self.storage.persist_timeout()
	}

	/// Checks cross-field rules serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if self.storage.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}
		if self.storage.persist_timeout_ms > MAX_PERSIST_TIMEOUT_MS {
			return Err(ConfigError::Validation(format!(
				"Storage persist_timeout_ms cannot exceed {}",
				MAX_PERSIST_TIMEOUT_MS
			)));
		}

		if self.api.host.trim().is_empty() {
			return Err(ConfigError::Validation("API host cannot be empty".into()));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string, resolving environment variables
/// and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
