//! Interchangeable ways of executing a fulfillment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::StockPlacementId;
use warehouse_store::{ProcedureCall, ProcedureExecutor, ProcedureName, WarehouseStore};

use crate::error::{DuringStage, FulfillmentError};
use crate::request::FulfillmentRequest;
use crate::stage::FulfillmentStage;
use crate::{catalog, matcher, transaction};

/// Executes a fulfillment request against storage.
///
/// Implementations must be observably indistinguishable for the same input
/// and stored state. Requests reaching a strategy have already passed
/// [`FulfillmentRequest::validate`].
#[async_trait]
pub trait FulfillmentStrategy: Send + Sync {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn fulfill(
        &self,
        request: FulfillmentRequest,
        now: DateTime<Utc>,
    ) -> Result<StockPlacementId, FulfillmentError>;
}

/// Runs catalog lookup, order matching and the fulfillment transaction as
/// separate steps in process.
#[derive(Debug, Clone)]
pub struct DirectTransaction<S> {
    store: S,
}

impl<S: WarehouseStore> DirectTransaction<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: WarehouseStore> FulfillmentStrategy for DirectTransaction<S> {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn fulfill(
        &self,
        request: FulfillmentRequest,
        now: DateTime<Utc>,
    ) -> Result<StockPlacementId, FulfillmentError> {
        let catalog_price = catalog::check_catalog(&self.store, &request).await?;
        tracing::debug!(%catalog_price, "catalog checks passed");

        let matched = matcher::match_order(&self.store, &request, now).await?;
        transaction::commit(&self.store, &request, matched, now).await
    }
}

/// Delegates the whole validate-match-commit sequence to a named
/// store-side procedure.
#[derive(Debug, Clone)]
pub struct AtomicProcedure<P> {
    executor: P,
    procedure: ProcedureName,
}

impl<P: ProcedureExecutor> AtomicProcedure<P> {
    pub fn new(executor: P, procedure: ProcedureName) -> Self {
        Self {
            executor,
            procedure,
        }
    }

    /// Uses the procedure installed by the bundled migrations.
    pub fn with_default_procedure(executor: P) -> Self {
        Self::new(executor, ProcedureName::default())
    }

    /// Returns the procedure this strategy calls.
    pub fn procedure(&self) -> &ProcedureName {
        &self.procedure
    }
}

#[async_trait]
impl<P: ProcedureExecutor> FulfillmentStrategy for AtomicProcedure<P> {
    fn name(&self) -> &'static str {
        "procedure"
    }

    async fn fulfill(
        &self,
        request: FulfillmentRequest,
        now: DateTime<Utc>,
    ) -> Result<StockPlacementId, FulfillmentError> {
        self.executor
            .execute_fulfillment_procedure(
                &self.procedure,
                ProcedureCall {
                    product_id: request.product_id,
                    warehouse_id: request.warehouse_id,
                    amount: request.amount,
                    created_at: now,
                },
            )
            .await
            .during(FulfillmentStage::Committing)
    }
}
