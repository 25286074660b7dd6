//! File-backed durable log.
//!
//! The whole ledger lives in a single UTF-8 text file that is rewritten on
//! every save. A save writes a sibling temporary file, syncs it and renames
//! it over the record file, so a concurrent reader sees either the old or
//! the new contents.
//!
//! While a `FileLog` is alive it holds an exclusive advisory lock on
//! `<record file>.lock`, which keeps a second process from writing the same
//! file.

use crate::{format, DurableLog, LogFactory, LogRegistry, StorageError};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracker_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderLedger, Schema, ValidationError,
};

/// Record file used when the configuration does not name one.
pub const DEFAULT_PATH: &str = "uuids.txt";

/// File-based durable log.
pub struct FileLog {
	/// Record file.
	path: PathBuf,
	/// Generation handed to the next save.
	next_generation: AtomicU64,
	/// Generation of the newest save that reached disk. Also serializes the
	/// blocking writers.
	written: Arc<Mutex<u64>>,
	/// Keeps the inter-process lock for as long as the log is open.
	_lock: File,
}

impl FileLog {
	/// Opens the log at `path`, creating missing parent directories and
	/// taking the inter-process lock.
	///
	/// The record file itself is not created until the first save.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
		let path = path.into();

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| {
				StorageError::Backend(format!("Cannot create {}: {}", parent.display(), e))
			})?;
		}

		let lock_path = sibling(&path, "lock");
		let lock = OpenOptions::new()
			.create(true)
			.read(true)
			.write(true)
			.truncate(false)
			.open(&lock_path)
			.map_err(|e| {
				StorageError::Backend(format!("Cannot open {}: {}", lock_path.display(), e))
			})?;
		lock.try_lock_exclusive().map_err(|e| {
			StorageError::Locked(format!(
				"{} is in use by another process ({})",
				path.display(),
				e
			))
		})?;

		tracing::debug!(path = %path.display(), "Opened record file");

		Ok(Self {
			path,
			next_generation: AtomicU64::new(1),
			written: Arc::new(Mutex::new(0)),
			_lock: lock,
		})
	}
}

#[async_trait]
impl DurableLog for FileLog {
	async fn load(&self) -> Result<OrderLedger, StorageError> {
		let bytes = match tokio::fs::read(&self.path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::info!(path = %self.path.display(), "No record file yet, starting empty");
				return Ok(OrderLedger::new());
			},
			Err(e) => {
				return Err(StorageError::Backend(format!(
					"Cannot read {}: {}",
					self.path.display(),
					e
				)))
			},
		};

		format::decode_bytes(&bytes)
	}

	async fn save(&self, ledger: &OrderLedger) -> Result<(), StorageError> {
		let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
		let contents = format::encode(ledger);
		let path = self.path.clone();
		let written = Arc::clone(&self.written);

		// The blocking task runs to completion even if this future is dropped
		// (e.g. by a timeout), which is why stale generations are skipped.
		tokio::task::spawn_blocking(move || {
			let mut newest = written
				.lock()
				.map_err(|_| StorageError::Persistence("writer lock poisoned".into()))?;
			if *newest > generation {
				tracing::debug!(generation, newest = *newest, "Skipping superseded write");
				return Ok(());
			}

			replace_contents(&path, contents.as_bytes())?;
			*newest = generation;
			Ok(())
		})
		.await
		.map_err(|e| StorageError::Persistence(format!("Write task failed: {}", e)))?
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileLogSchema)
	}
}

/// Atomically replaces the contents of `path` with `bytes`.
fn replace_contents(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
	let temp_path = sibling(path, "tmp");
	let fail = |action: &str, e: std::io::Error| {
		let _ = fs::remove_file(&temp_path);
		StorageError::Persistence(format!("Failed to {} {}: {}", action, path.display(), e))
	};

	let mut file = File::create(&temp_path).map_err(|e| fail("stage", e))?;
	file.write_all(bytes).map_err(|e| fail("write", e))?;
	file.sync_all().map_err(|e| fail("sync", e))?;
	drop(file);

	fs::rename(&temp_path, path).map_err(|e| fail("replace", e))?;
	Ok(())
}

/// `uuids.txt` + `lock` -> `uuids.txt.lock`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
	let mut name = path.file_name().unwrap_or_default().to_os_string();
	name.push(".");
	name.push(suffix);
	path.with_file_name(name)
}

/// Configuration schema for FileLog.
pub struct FileLogSchema;

impl ConfigSchema for FileLogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(s) if s.trim().is_empty() => Err("path cannot be empty".into()),
					_ => Ok(()),
				}
			})],
		);

		schema.validate(config)
	}
}

/// Factory function to create a file log from configuration.
///
/// Configuration parameters:
/// - `path`: record file (default: `uuids.txt` in the working directory)
pub fn create_log(config: &toml::Value) -> Result<Box<dyn DurableLog>, StorageError> {
	FileLogSchema.validate(config)?;

	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_PATH);

	Ok(Box::new(FileLog::open(path)?))
}

/// Registry for the file log implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = LogFactory;

	fn factory() -> Self::Factory {
		create_log
	}
}

impl LogRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use tempfile::tempdir;
	use tracker_types::{OrderId, OrderState};

	fn sample_ledger() -> OrderLedger {
		let mut ledger = OrderLedger::new();
		ledger.insert(OrderId::generate(), OrderState::Created);
		ledger.insert(OrderId::generate(), OrderState::Cancelled);
		ledger
	}

	#[tokio::test]
	async fn test_load_missing_file_is_empty() {
		let dir = tempdir().unwrap();
		let log = FileLog::open(dir.path().join("uuids.txt")).unwrap();

		assert!(log.load().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_save_then_load() {
		let dir = tempdir().unwrap();
		let log = FileLog::open(dir.path().join("uuids.txt")).unwrap();
		let ledger = sample_ledger();

		log.save(&ledger).await.unwrap();

		assert_eq!(log.load().await.unwrap(), ledger);
	}

	#[tokio::test]
	async fn test_save_writes_line_format_without_leftovers() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("uuids.txt");
		let log = FileLog::open(&path).unwrap();
		let ledger = sample_ledger();

		log.save(&ledger).await.unwrap();

		let contents = std::fs::read_to_string(&path).unwrap();
		assert_eq!(contents, format::encode(&ledger));
		assert_eq!(contents.lines().count(), 2);
		assert!(!dir.path().join("uuids.txt.tmp").exists());
	}

	#[tokio::test]
	async fn test_save_replaces_previous_contents() {
		let dir = tempdir().unwrap();
		let log = FileLog::open(dir.path().join("uuids.txt")).unwrap();

		log.save(&sample_ledger()).await.unwrap();
		let second = sample_ledger();
		log.save(&second).await.unwrap();

		assert_eq!(log.load().await.unwrap(), second);
	}

	#[tokio::test]
	async fn test_corrupt_file_fails_load() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("uuids.txt");
		std::fs::write(&path, "garbage\n").unwrap();
		let log = FileLog::open(&path).unwrap();

		let err = log.load().await.unwrap_err();
		assert!(matches!(
			err,
			StorageError::CorruptRecord { line_number: 1, .. }
		));
	}

	#[tokio::test]
	async fn test_creates_missing_parent_directories() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("nested/data/uuids.txt");
		let log = FileLog::open(&path).unwrap();

		log.save(&sample_ledger()).await.unwrap();
		assert!(path.exists());
	}

	#[test]
	fn test_second_open_is_refused_while_locked() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("uuids.txt");
		let first = FileLog::open(&path).unwrap();

		assert!(matches!(
			FileLog::open(&path),
			Err(StorageError::Locked(_))
		));

		drop(first);
		assert!(FileLog::open(&path).is_ok());
	}

	#[tokio::test]
	async fn test_save_into_missing_directory_is_persistence_error() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("data/uuids.txt");
		let log = FileLog::open(&path).unwrap();
		std::fs::remove_dir_all(dir.path().join("data")).unwrap();

		let err = log.save(&sample_ledger()).await.unwrap_err();
		assert!(matches!(err, StorageError::Persistence(_)));
	}

	#[tokio::test]
	async fn test_abandoned_write_never_lands_after_later_save() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("uuids.txt");
		let log = FileLog::open(&path).unwrap();

		// Keep the writer busy so neither save can finish in time
		let (held_tx, held_rx) = std::sync::mpsc::channel();
		let written = Arc::clone(&log.written);
		let holder = std::thread::spawn(move || {
			let _guard = written.lock().unwrap();
			held_tx.send(()).unwrap();
			std::thread::sleep(Duration::from_millis(200));
		});
		held_rx.recv().unwrap();

		let limit = Duration::from_millis(20);
		assert!(tokio::time::timeout(limit, log.save(&sample_ledger())).await.is_err());
		assert!(tokio::time::timeout(limit, log.save(&OrderLedger::new())).await.is_err());

		holder.join().unwrap();
		tokio::time::sleep(Duration::from_millis(200)).await;

		assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
		assert!(log.load().await.unwrap().is_empty());
	}

	#[test]
	fn test_sibling_paths() {
		let path = Path::new("/var/lib/orders/uuids.txt");
		assert_eq!(sibling(path, "tmp"), Path::new("/var/lib/orders/uuids.txt.tmp"));
		assert_eq!(sibling(path, "lock"), Path::new("/var/lib/orders/uuids.txt.lock"));
	}

	#[test]
	fn test_schema_rejects_empty_path() {
		let mut table = toml::map::Map::new();
		table.insert("path".into(), toml::Value::String("  ".into()));
		assert!(FileLogSchema.validate(&toml::Value::Table(table)).is_err());

		let mut table = toml::map::Map::new();
		table.insert("path".into(), toml::Value::Integer(3));
		assert!(FileLogSchema.validate(&toml::Value::Table(table)).is_err());
	}

	#[test]
	fn test_factory_uses_configured_path() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("orders.txt");
		let mut table = toml::map::Map::new();
		table.insert(
			"path".into(),
			toml::Value::String(path.to_string_lossy().into_owned()),
		);

		assert!(create_log(&toml::Value::Table(table)).is_ok());
		assert!(dir.path().join("orders.txt.lock").exists());
	}
}
