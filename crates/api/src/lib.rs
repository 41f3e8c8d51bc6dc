//! HTTP API server for warehouse fulfillment.
//!
//! Exposes the in-process and procedure-backed fulfillment paths as REST
//! endpoints, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warehouse_store::{ProcedureExecutor, ProcedureName, WarehouseStore};

use routes::warehouse::AppState;

/// Creates the shared state serving both fulfillment paths from one store.
pub fn create_state<S>(store: S, procedure: ProcedureName) -> Arc<AppState<S>>
where
    S: WarehouseStore + ProcedureExecutor + Clone + 'static,
{
    Arc::new(AppState::new(store, procedure))
}

/// Creates the Axum application router with all routes and shared state.
///
/// `store_kind` is reported by `/health`.
pub fn create_app<S>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    store_kind: &'static str,
) -> Router
where
    S: WarehouseStore + ProcedureExecutor + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let health_router = Router::new()
        .route("/health", get(routes::health::check))
        .with_state(store_kind);

    Router::new()
        .route("/api/warehouse/manual", post(routes::warehouse::manual::<S>))
        .route("/api/warehouse/proc", post(routes::warehouse::procedure::<S>))
        .with_state(state)
        .merge(health_router)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
