//! Order matching step.

use chrono::{DateTime, Utc};
use common::RejectionReason;
use warehouse_store::{MatchedOrder, WarehouseStore};

use crate::error::{DuringStage, FulfillmentError};
use crate::request::FulfillmentRequest;
use crate::stage::FulfillmentStage;

/// Selects the oldest unfulfilled order for exactly the requested product and
/// amount, created strictly before `as_of`.
pub async fn match_order<S>(
    store: &S,
    request: &FulfillmentRequest,
    as_of: DateTime<Utc>,
) -> Result<MatchedOrder, FulfillmentError>
where
    S: WarehouseStore + ?Sized,
{
    let matched = store
        .find_fulfillable_order(request.product_id, request.amount, as_of)
        .await
        .during(FulfillmentStage::MatchingOrder)?
        .ok_or(RejectionReason::NoMatchingOrder)?;

    tracing::debug!(
        order_id = %matched.order_id,
        snapshot_price = %matched.snapshot_price,
        "matched order"
    );
    Ok(matched)
}
