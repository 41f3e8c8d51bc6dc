//! Catalog lookup step.

use common::{Money, RejectionReason};
use warehouse_store::WarehouseStore;

use crate::error::{DuringStage, FulfillmentError};
use crate::request::FulfillmentRequest;
use crate::stage::FulfillmentStage;

/// Confirms the product and then the warehouse exist.
///
/// Returns the product's current catalog price. The ledger total is not
/// computed from this price but from the one read by the order matcher.
pub async fn check_catalog<S>(store: &S, request: &FulfillmentRequest) -> Result<Money, FulfillmentError>
where
    S: WarehouseStore + ?Sized,
{
    let price = store
        .product_price(request.product_id)
        .await
        .during(FulfillmentStage::Validating)?
        .ok_or(RejectionReason::UnknownProduct)?;

    if !store
        .warehouse_exists(request.warehouse_id)
        .await
        .during(FulfillmentStage::Validating)?
    {
        return Err(RejectionReason::UnknownWarehouse.into());
    }

    Ok(price)
}
