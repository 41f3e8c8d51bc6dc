//! Fulfillment transaction step.

use chrono::{DateTime, Utc};
use common::StockPlacementId;
use warehouse_store::{FulfillOrder, MatchedOrder, WarehouseStore};

use crate::error::{DuringStage, FulfillmentError};
use crate::request::FulfillmentRequest;
use crate::stage::FulfillmentStage;

/// Marks the matched order fulfilled at `now` and records the stock
/// placement, priced from the matched snapshot.
///
/// Losing the race for the order is reported as `Rejected(Conflict)`.
pub async fn commit<S>(
    store: &S,
    request: &FulfillmentRequest,
    matched: MatchedOrder,
    now: DateTime<Utc>,
) -> Result<StockPlacementId, FulfillmentError>
where
    S: WarehouseStore + ?Sized,
{
    store
        .fulfill_order(FulfillOrder {
            order_id: matched.order_id,
            warehouse_id: request.warehouse_id,
            product_id: request.product_id,
            amount: request.amount,
            snapshot_price: matched.snapshot_price,
            now,
        })
        .await
        .during(FulfillmentStage::Committing)
}
