//! The order store.
//!
//! Owns the authoritative identifier → state map and writes it through to
//! the durable log on every mutation. A single async mutex guards both the
//! map and the save, so mutations are totally ordered and a save always
//! completes before the next operation sees the map.
//!
//! If a save fails the mutation is undone before the error is returned:
//! memory never holds a change the caller was told did not happen.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracker_storage::{DurableLog, StorageError};
use tracker_types::{CancelOutcome, OrderId, OrderLedger, OrderState};

/// Errors that can occur during order store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The record file holds a line that cannot be parsed.
	#[error("Corrupt record at line {line_number} ({line:?}): {reason}")]
	CorruptRecord {
		line_number: usize,
		line: String,
		reason: String,
	},
	/// The ledger could not be written; the mutation was rolled back.
	#[error("Persistence error: {0}")]
	Persistence(String),
	/// The write did not finish within the configured bound; the mutation
	/// was rolled back.
	#[error("Persistence timed out after {0:?}")]
	PersistenceTimeout(Duration),
	/// The durable log could not be opened or read.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl StoreError {
	/// `true` for failures to write, as opposed to failures to load.
	pub fn is_persistence(&self) -> bool {
		matches!(
			self,
			StoreError::Persistence(_) | StoreError::PersistenceTimeout(_)
		)
	}
}

impl From<StorageError> for StoreError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::CorruptRecord {
				line_number,
				line,
				reason,
			} => StoreError::CorruptRecord {
				line_number,
				line,
				reason,
			},
			StorageError::Persistence(msg) => StoreError::Persistence(msg),
			other => StoreError::Storage(other.to_string()),
		}
	}
}

/// Tuning for an [`OrderStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
	/// Upper bound on a single save. `None` waits indefinitely.
	pub persist_timeout: Option<Duration>,
}

impl Default for StoreOptions {
	fn default() -> Self {
		Self {
			persist_timeout: Some(Duration::from_secs(5)),
		}
	}
}

/// Concurrency-safe, write-through store of order lifecycle states.
pub struct OrderStore {
	records: Mutex<OrderLedger>,
	log: Box<dyn DurableLog>,
	options: StoreOptions,
}

impl OrderStore {
	/// Loads the existing ledger from `log` and returns a store that owns it.
	///
	/// Fails if any persisted record is corrupt; nothing is skipped.
	pub async fn open(log: Box<dyn DurableLog>, options: StoreOptions) -> Result<Self, StoreError> {
		let records = log.load().await?;
		tracing::info!(orders = records.len(), "Loaded order ledger");

		Ok(Self {
			records: Mutex::new(records),
			log,
			options,
		})
	}

	/// Creates a new order in state `created` and returns its identifier.
	pub async fn create(&self) -> Result<OrderId, StoreError> {
		let mut records = self.records.lock().await;

		let id = loop {
			let candidate = OrderId::generate();
			if !records.contains_key(&candidate) {
				break candidate;
			}
		};
		records.insert(id, OrderState::Created);

		if let Err(e) = self.persist(&records).await {
			records.remove(&id);
			self.supersede_abandoned(&records, &e).await;
			tracing::error!(order_id = %id, error = %e, "Order creation rolled back");
			return Err(e);
		}

		tracing::info!(order_id = %id, "Created order");
		Ok(id)
	}

	/// Cancels the order named by `id`.
	///
	/// Unknown identifiers, including text that is not an identifier at all,
	/// are reported as [`CancelOutcome::NotFound`]. Only a `created` →
	/// `cancelled` transition writes to the log.
	pub async fn cancel(&self, id: &str) -> Result<CancelOutcome, StoreError> {
		let Ok(id) = id.parse::<OrderId>() else {
			tracing::debug!(order_id = id, "Cancel of malformed identifier");
			return Ok(CancelOutcome::NotFound);
		};

		let mut records = self.records.lock().await;
		let outcome = match records.get(&id).copied() {
			None => CancelOutcome::NotFound,
			Some(state) if state.is_terminal() => CancelOutcome::AlreadyCancelled,
			Some(state) => {
				records.insert(id, OrderState::Cancelled);

				if let Err(e) = self.persist(&records).await {
					records.insert(id, state);
					self.supersede_abandoned(&records, &e).await;
					tracing::error!(order_id = %id, error = %e, "Order cancellation rolled back");
					return Err(e);
				}

				tracing::info!(order_id = %id, "Cancelled order");
				CancelOutcome::Cancelled
			},
		};

		if outcome != CancelOutcome::Cancelled {
			tracing::debug!(order_id = %id, outcome = outcome.as_str(), "Cancel had no effect");
		}
		Ok(outcome)
	}

	/// Number of known orders, cancelled ones included.
	pub async fn count(&self) -> usize {
		self.records.lock().await.len()
	}

	/// Current state of one order.
	pub async fn state_of(&self, id: &OrderId) -> Option<OrderState> {
		self.records.lock().await.get(id).copied()
	}

	/// Consistent copy of the whole ledger.
	pub async fn snapshot(&self) -> OrderLedger {
		self.records.lock().await.clone()
	}

	async fn persist(&self, records: &OrderLedger) -> Result<(), StoreError> {
		let save = self.log.save(records);

		match self.options.persist_timeout {
			Some(limit) => tokio::time::timeout(limit, save)
				.await
				.map_err(|_| StoreError::PersistenceTimeout(limit))?
				.map_err(StoreError::from),
			None => save.await.map_err(StoreError::from),
		}
	}

	/// After a timed-out save has been rolled back, issues a save of the
	/// rolled-back ledger.
	///
	/// The timed-out write may still be running inside the log. The newer
	/// save either overwrites it or makes the log skip it, so the abandoned
	/// contents never end up as the last thing written. If this save times
	/// out as well it is still ordered after the abandoned one.
	async fn supersede_abandoned(&self, records: &OrderLedger, err: &StoreError) {
		if !matches!(err, StoreError::PersistenceTimeout(_)) {
			return;
		}

		match self.persist(records).await {
			Ok(()) => tracing::debug!("Rolled-back ledger written"),
			Err(e) => tracing::warn!(error = %e, "Rolled-back ledger write did not complete"),
		}
	}
}
