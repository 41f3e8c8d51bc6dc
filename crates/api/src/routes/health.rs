//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Storage backend serving requests, `"postgres"` or `"in-memory"`.
    pub store: &'static str,
}

/// GET /health: reports liveness and the active storage backend.
pub async fn check(State(store): State<&'static str>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store,
    })
}
