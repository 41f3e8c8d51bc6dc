//! Fulfillment request.

use common::{ProductId, RejectionReason, WarehouseId};

use crate::error::FulfillmentError;

/// Place `amount` units of a product into a warehouse, fulfilling the
/// matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentRequest {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub amount: i32,
}

impl FulfillmentRequest {
    /// Creates a new request.
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId, amount: i32) -> Self {
        Self {
            product_id,
            warehouse_id,
            amount,
        }
    }

    /// Checks the parts of the request that need no storage access.
    pub fn validate(&self) -> Result<(), FulfillmentError> {
        if self.amount <= 0 {
            return Err(RejectionReason::InvalidAmount.into());
        }
        Ok(())
    }
}
