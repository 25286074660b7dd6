//! API types for the order tracker HTTP interface.
//!
//! Field names follow the JSON contract existing clients already read:
//! `status`, `uuid`, `cancelStatus` and `totalCount`.

use crate::order::{CancelOutcome, OrderId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status line carried by every successful response body.
pub const STATUS_OK: &str = "200 OK";

/// Response for `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
	pub status: String,
	/// Identifier of the newly created order.
	pub uuid: OrderId,
}

impl CreateOrderResponse {
	pub fn new(uuid: OrderId) -> Self {
		Self {
			status: STATUS_OK.to_string(),
			uuid,
		}
	}
}

/// Response for `DELETE /api/orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderResponse {
	pub status: String,
	/// `"0"` if this request cancelled the order, `"1"` otherwise.
	#[serde(rename = "cancelStatus")]
	pub cancel_status: String,
	/// Precise outcome, for callers that need to tell a repeat cancel apart
	/// from an unknown order.
	pub outcome: CancelOutcome,
}

impl From<CancelOutcome> for CancelOrderResponse {
	fn from(outcome: CancelOutcome) -> Self {
		Self {
			status: STATUS_OK.to_string(),
			cancel_status: outcome.cancel_status().to_string(),
			outcome,
		}
	}
}

/// Response for `GET /api/orders/count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
	pub status: String,
	/// Number of known orders, cancelled ones included.
	#[serde(rename = "totalCount")]
	pub total_count: u64,
}

impl CountResponse {
	pub fn new(total_count: u64) -> Self {
		Self {
			status: STATUS_OK.to_string(),
			total_count,
		}
	}
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
	pub ok: bool,
	pub service: String,
	pub version: String,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Unknown operation requested (404)
	NotFound { error_type: String, message: String },
	/// Order state could not be persisted (500)
	InternalServerError { error_type: String, message: String },
	/// Persistence did not complete in time (503)
	ServiceUnavailable { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::NotFound { .. } => 404,
			APIError::InternalServerError { .. } => 500,
			APIError::ServiceUnavailable { .. } => 503,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::NotFound { error_type, message }
			| APIError::InternalServerError { error_type, message }
			| APIError::ServiceUnavailable { error_type, message } => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cancel_response_wire_names() {
		let body = serde_json::to_value(CancelOrderResponse::from(CancelOutcome::NotFound)).unwrap();

		assert_eq!(body["status"], "200 OK");
		assert_eq!(body["cancelStatus"], "1");
		assert_eq!(body["outcome"], "not_found");
	}

	#[test]
	fn test_count_response_wire_names() {
		let body = serde_json::to_value(CountResponse::new(7)).unwrap();
		assert_eq!(body["totalCount"], 7);
	}

	#[test]
	fn test_error_status_codes() {
		let err = APIError::InternalServerError {
			error_type: "PERSISTENCE_FAILED".into(),
			message: "disk full".into(),
		};
		assert_eq!(err.status_code(), 500);
		assert_eq!(err.to_error_response().error, "PERSISTENCE_FAILED");
		assert_eq!(err.to_string(), "Internal Server Error: disk full");

		let err = APIError::NotFound {
			error_type: "METHOD_NOT_FOUND".into(),
			message: "nope".into(),
		};
		assert_eq!(err.status_code(), 404);
	}
}
