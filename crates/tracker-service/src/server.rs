//! HTTP server for the order tracker API.
//!
//! Routes are nested under `/api`; `/health` sits at the root, next to the
//! `/orders?method=...` interface kept for older clients.

use crate::apis;
use axum::{
	extract::{Path, Query, State},
	http::Method,
	response::{Json, Response},
	routing::{any, delete, get, post},
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracker_config::ApiConfig;
use tracker_core::OrderStore;
use tracker_types::{
	APIError, CancelOrderResponse, CountResponse, CreateOrderResponse, HealthResponse,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The single store instance, constructed at startup.
	pub store: Arc<OrderStore>,
	/// Reported by `/health`.
	pub service_id: String,
}

/// Builds the router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(handle_create_order))
				.route("/orders/count", get(handle_count_orders))
				.route("/orders/{id}", delete(handle_cancel_order)),
		)
		.route("/orders", any(handle_order_method))
		.route("/health", get(handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn start_server(
	api_config: ApiConfig,
	state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order tracker API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::warn!("Failed to listen for shutdown signal: {}", e);
			}
			tracing::info!("Shutdown requested");
		})
		.await?;

	Ok(())
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
) -> Result<Json<CreateOrderResponse>, APIError> {
	apis::order::create_order(&state.store).await.map(Json)
}

/// Handles DELETE /api/orders/{id} requests.
async fn handle_cancel_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<CancelOrderResponse>, APIError> {
	apis::order::cancel_order(&id, &state.store).await.map(Json)
}

/// Handles GET /api/orders/count requests.
async fn handle_count_orders(State(state): State<AppState>) -> Json<CountResponse> {
	Json(apis::order::count_orders(&state.store).await)
}

/// Handles /orders?method=... requests.
async fn handle_order_method(
	verb: Method,
	Query(query): Query<apis::order::MethodQuery>,
	State(state): State<AppState>,
) -> Result<Response, APIError> {
	apis::order::dispatch_method(&verb, &query, &state.store).await
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		ok: true,
		service: state.service_id.clone(),
		version: env!("CARGO_PKG_VERSION").to_string(),
	})
}
