//! Order API implementation.
//!
//! Thin translation between the HTTP surface and the order store: each
//! function performs one store call and shapes the result into the response
//! body existing clients expect. Store failures become [`APIError`]s.

use axum::{
	http::Method,
	response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{info, warn};
use tracker_core::{OrderStore, StoreError};
use tracker_types::{
	APIError, CancelOrderResponse, CancelOutcome, CountResponse, CreateOrderResponse,
};

/// Query string of the `/orders?method=...` interface older clients use.
#[derive(Debug, Default, Deserialize)]
pub struct MethodQuery {
	/// `createOrder`, `cancelOrder` or `getCount`.
	pub method: Option<String>,
	/// Order to cancel.
	pub uuid: Option<String>,
}

/// Handles `POST /api/orders`.
pub async fn create_order(store: &OrderStore) -> Result<CreateOrderResponse, APIError> {
	let id = store.create().await.map_err(store_error)?;
	info!(order_id = %id, "Order created via API");
	Ok(CreateOrderResponse::new(id))
}

/// Handles `DELETE /api/orders/{id}`.
///
/// Unknown and already cancelled orders are successful responses with
/// `cancelStatus` `"1"`.
pub async fn cancel_order(id: &str, store: &OrderStore) -> Result<CancelOrderResponse, APIError> {
	let outcome = store.cancel(id).await.map_err(store_error)?;
	if outcome != CancelOutcome::Cancelled {
		info!(order_id = id, outcome = outcome.as_str(), "Order not cancelled");
	}
	Ok(CancelOrderResponse::from(outcome))
}

/// Handles `GET /api/orders/count`.
pub async fn count_orders(store: &OrderStore) -> CountResponse {
	CountResponse::new(store.count().await as u64)
}

/// Handles `/orders?method=...`.
///
/// `createOrder` is accepted with `POST` or `PUT`, `cancelOrder` with
/// `DELETE` and `getCount` with `GET`. Any other combination is a 404.
pub async fn dispatch_method(
	verb: &Method,
	query: &MethodQuery,
	store: &OrderStore,
) -> Result<Response, APIError> {
	let method = query.method.as_deref().unwrap_or_default();

	if method == "createOrder" && (*verb == Method::POST || *verb == Method::PUT) {
		Ok(Json(create_order(store).await?).into_response())
	} else if method == "cancelOrder" && *verb == Method::DELETE {
		let id = query.uuid.as_deref().unwrap_or_default();
		Ok(Json(cancel_order(id, store).await?).into_response())
	} else if method == "getCount" && *verb == Method::GET {
		Ok(Json(count_orders(store).await).into_response())
	} else {
		warn!(verb = %verb, method, "Unknown order method");
		Err(APIError::NotFound {
			error_type: "METHOD_NOT_FOUND".to_string(),
			message: format!("Unable to find method '{}' for {}", method, verb),
		})
	}
}

fn store_error(err: StoreError) -> APIError {
	warn!(error = %err, "Order request failed");
	match err {
		StoreError::PersistenceTimeout(_) => APIError::ServiceUnavailable {
			error_type: "PERSISTENCE_TIMEOUT".to_string(),
			message: err.to_string(),
		},
		StoreError::Persistence(_) => APIError::InternalServerError {
			error_type: "PERSISTENCE_FAILED".to_string(),
			message: err.to_string(),
		},
		StoreError::CorruptRecord { .. } | StoreError::Storage(_) => {
			APIError::InternalServerError {
				error_type: "STORAGE_ERROR".to_string(),
				message: err.to_string(),
			}
		},
	}
}
