//! Order identity and lifecycle types.
//!
//! An order is nothing more than an identifier and a lifecycle state. The
//! state only ever moves forward: `created` may become `cancelled`, and
//! `cancelled` is terminal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced when parsing order values from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderParseError {
	#[error("Invalid order identifier '{0}'")]
	InvalidId(String),
	#[error("Unknown order state '{0}'")]
	UnknownState(String),
}

/// Unique identifier of an order.
///
/// Backed by a random (v4) UUID and rendered as lowercase hyphenated text,
/// which can never contain the `:` record delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.hyphenated())
	}
}

impl FromStr for OrderId {
	type Err = OrderParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s)
			.map(Self)
			.map_err(|_| OrderParseError::InvalidId(s.to_string()))
	}
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
	Created,
	Cancelled,
}

impl OrderState {
	/// Returns the textual form used in the record file.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderState::Created => "created",
			OrderState::Cancelled => "cancelled",
		}
	}

	/// `true` once no further transition is possible.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderState::Cancelled)
	}
}

impl fmt::Display for OrderState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderState {
	type Err = OrderParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"created" => Ok(Self::Created),
			"cancelled" => Ok(Self::Cancelled),
			other => Err(OrderParseError::UnknownState(other.to_string())),
		}
	}
}

/// Result of a cancellation request.
///
/// These are ordinary outcomes, not errors: callers are expected to branch
/// on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
	/// The order moved from `created` to `cancelled`.
	Cancelled,
	/// No order with that identifier exists.
	NotFound,
	/// The order was already cancelled; nothing changed.
	AlreadyCancelled,
}

impl CancelOutcome {
	/// Wire status understood by existing clients: `"0"` when the order was
	/// cancelled by this request, `"1"` otherwise.
	pub fn cancel_status(&self) -> &'static str {
		match self {
			CancelOutcome::Cancelled => "0",
			CancelOutcome::NotFound | CancelOutcome::AlreadyCancelled => "1",
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			CancelOutcome::Cancelled => "cancelled",
			CancelOutcome::NotFound => "not_found",
			CancelOutcome::AlreadyCancelled => "already_cancelled",
		}
	}
}

/// Complete set of known orders, ordered by identifier so that persisted
/// output is deterministic.
pub type OrderLedger = BTreeMap<OrderId, OrderState>;
