//! Stock placement endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{ProductId, WarehouseId};
use fulfillment::{AtomicProcedure, DirectTransaction, FulfillmentRequest, FulfillmentService};
use serde::{Deserialize, Serialize};
use warehouse_store::{ProcedureExecutor, ProcedureName, WarehouseStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: WarehouseStore + ProcedureExecutor> {
    pub direct: FulfillmentService<DirectTransaction<S>>,
    pub procedure: FulfillmentService<AtomicProcedure<S>>,
}

impl<S: WarehouseStore + ProcedureExecutor + Clone> AppState<S> {
    /// Builds both fulfillment paths over the same store.
    pub fn new(store: S, procedure: ProcedureName) -> Self {
        Self {
            direct: FulfillmentService::direct(store.clone()),
            procedure: FulfillmentService::procedure(store, procedure),
        }
    }
}

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWarehouseRequest {
    pub product_id: i32,
    pub warehouse_id: i32,
    pub amount: i32,
}

impl From<AddToWarehouseRequest> for FulfillmentRequest {
    fn from(req: AddToWarehouseRequest) -> Self {
        FulfillmentRequest::new(
            ProductId::new(req.product_id),
            WarehouseId::new(req.warehouse_id),
            req.amount,
        )
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWarehouseResponse {
    pub new_id: i32,
}

// -- Handlers --

/// POST /api/warehouse/manual: fulfill through the in-process transaction.
#[tracing::instrument(skip(state))]
pub async fn manual<S: WarehouseStore + ProcedureExecutor + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddToWarehouseRequest>,
) -> Result<Json<AddToWarehouseResponse>, ApiError> {
    let placement_id = state.direct.fulfill(req.into()).await?;
    Ok(Json(AddToWarehouseResponse {
        new_id: placement_id.as_i32(),
    }))
}

/// POST /api/warehouse/proc: fulfill through the atomic procedure.
#[tracing::instrument(skip(state))]
pub async fn procedure<S: WarehouseStore + ProcedureExecutor + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddToWarehouseRequest>,
) -> Result<Json<AddToWarehouseResponse>, ApiError> {
    let placement_id = state.procedure.fulfill(req.into()).await?;
    Ok(Json(AddToWarehouseResponse {
        new_id: placement_id.as_i32(),
    }))
}
