use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, ProductId, StockPlacementId, WarehouseId};

use crate::{FulfillOrder, MatchedOrder, ProcedureCall, ProcedureName, Result};

/// Storage operations used by the in-process fulfillment workflow.
///
/// All implementations must be thread-safe (Send + Sync). Implementations
/// must never hold in-process state that makes two requests observe each
/// other except through the stored rows.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Returns the unit price of a product, or None if it does not exist.
    async fn product_price(&self, product_id: ProductId) -> Result<Option<Money>>;

    /// Returns true if the warehouse exists.
    async fn warehouse_exists(&self, warehouse_id: WarehouseId) -> Result<bool>;

    /// Finds the oldest unfulfilled order for exactly `amount` units of the
    /// product created strictly before `as_of`.
    ///
    /// The product price is read in the same query and returned as the
    /// snapshot price for the ledger entry.
    async fn find_fulfillable_order(
        &self,
        product_id: ProductId,
        amount: i32,
        as_of: DateTime<Utc>,
    ) -> Result<Option<MatchedOrder>>;

    /// Marks the order fulfilled and appends a stock placement, atomically.
    ///
    /// The order update is conditional on the order still being unfulfilled;
    /// if it no longer is, nothing is persisted and `StoreError::Conflict` is
    /// returned. Any other failure also leaves no trace.
    async fn fulfill_order(&self, fulfillment: FulfillOrder) -> Result<StockPlacementId>;
}

/// Executes the atomic fulfillment procedure.
///
/// The procedure validates, matches and commits in a single store-side
/// operation. Business-rule violations surface as `StoreError::BusinessRule`.
#[async_trait]
pub trait ProcedureExecutor: Send + Sync {
    async fn execute_fulfillment_procedure(
        &self,
        procedure: &ProcedureName,
        call: ProcedureCall,
    ) -> Result<StockPlacementId>;
}
