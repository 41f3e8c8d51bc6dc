//! Fulfillment service providing a single entry point per strategy.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::StockPlacementId;
use warehouse_store::{ProcedureExecutor, ProcedureName, WarehouseStore};

use crate::error::FulfillmentError;
use crate::request::FulfillmentRequest;
use crate::strategy::{AtomicProcedure, DirectTransaction, FulfillmentStrategy};

/// Service for fulfilling orders by placing stock into a warehouse.
///
/// Validates the request, delegates to the configured strategy and records
/// the outcome in logs and metrics. Holds no per-request state, so one
/// instance can serve concurrent requests.
pub struct FulfillmentService<F: FulfillmentStrategy> {
    strategy: F,
}

impl<S: WarehouseStore> FulfillmentService<DirectTransaction<S>> {
    /// Creates a service running the multi-step transaction in process.
    pub fn direct(store: S) -> Self {
        Self::new(DirectTransaction::new(store))
    }
}

impl<P: ProcedureExecutor> FulfillmentService<AtomicProcedure<P>> {
    /// Creates a service calling the named atomic procedure.
    pub fn procedure(executor: P, procedure: ProcedureName) -> Self {
        Self::new(AtomicProcedure::new(executor, procedure))
    }
}

impl<F: FulfillmentStrategy> FulfillmentService<F> {
    /// Creates a new fulfillment service with the given strategy.
    pub fn new(strategy: F) -> Self {
        Self { strategy }
    }

    /// Returns a reference to the underlying strategy.
    pub fn strategy(&self) -> &F {
        &self.strategy
    }

    /// Fulfills the oldest matching order as of now.
    pub async fn fulfill(
        &self,
        request: FulfillmentRequest,
    ) -> Result<StockPlacementId, FulfillmentError> {
        self.fulfill_at(request, Utc::now()).await
    }

    /// Fulfills the oldest matching order as of `now`.
    ///
    /// `now` is both the matching cutoff and the timestamp written to the
    /// order and the stock placement.
    #[tracing::instrument(skip(self), fields(strategy = self.strategy.name()))]
    pub async fn fulfill_at(
        &self,
        request: FulfillmentRequest,
        now: DateTime<Utc>,
    ) -> Result<StockPlacementId, FulfillmentError> {
        let strategy = self.strategy.name();
        metrics::counter!("fulfillment_requests_total", "strategy" => strategy).increment(1);
        let started = Instant::now();

        let result = match request.validate() {
            Ok(()) => self.strategy.fulfill(request, now).await,
            Err(e) => Err(e),
        };

        metrics::histogram!("fulfillment_duration_seconds", "strategy" => strategy)
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(placement_id) => {
                metrics::counter!("fulfillment_succeeded_total", "strategy" => strategy)
                    .increment(1);
                tracing::info!(%placement_id, "order fulfilled");
            }
            Err(FulfillmentError::Rejected(reason)) => {
                metrics::counter!(
                    "fulfillment_rejected_total",
                    "strategy" => strategy,
                    "reason" => reason.code()
                )
                .increment(1);
                tracing::warn!(%reason, "fulfillment rejected");
            }
            Err(err @ FulfillmentError::Failed { stage, .. }) => {
                metrics::counter!("fulfillment_failed_total", "strategy" => strategy).increment(1);
                tracing::error!(%stage, error = %err, "fulfillment failed");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use common::{Money, ProductId, RejectionReason, WarehouseId};
    use warehouse_store::InMemoryWarehouseStore;

    use super::*;
    use crate::stage::FulfillmentStage;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn invalid_amount_never_reaches_the_store() {
        let store = InMemoryWarehouseStore::new();
        // Any storage access would fail.
        store.set_unavailable(true);
        let service = FulfillmentService::direct(store);

        let err = service
            .fulfill_at(FulfillmentRequest::new(ProductId::new(1), WarehouseId::new(1), 0), t0())
            .await
            .unwrap_err();
        assert_eq!(err.rejection_reason(), Some(RejectionReason::InvalidAmount));
    }

    #[tokio::test]
    async fn direct_happy_path() {
        let store = InMemoryWarehouseStore::new();
        let product = store.add_product("Widget", Money::from_cents(250)).await;
        let warehouse = store.add_warehouse("Main").await;
        let order = store.add_order(product, 2, t0()).await;
        let service = FulfillmentService::direct(store.clone());
        let now = t0() + Duration::minutes(1);

        let id = service
            .fulfill_at(FulfillmentRequest::new(product, warehouse, 2), now)
            .await
            .unwrap();

        let placement = &store.placements().await[0];
        assert_eq!(placement.id, id);
        assert_eq!(placement.price, Money::from_cents(500));
        assert_eq!(store.order(order).await.unwrap().fulfilled_at, Some(now));
    }

    #[tokio::test]
    async fn procedure_happy_path() {
        let store = InMemoryWarehouseStore::new();
        let product = store.add_product("Widget", Money::from_cents(250)).await;
        let warehouse = store.add_warehouse("Main").await;
        store.add_order(product, 2, t0()).await;
        let service = FulfillmentService::procedure(store.clone(), ProcedureName::default());

        let id = service
            .fulfill_at(FulfillmentRequest::new(product, warehouse, 2), t0() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(store.placements().await[0].id, id);
        assert_eq!(service.strategy().name(), "procedure");
    }

    #[tokio::test]
    async fn unknown_procedure_fails() {
        let store = InMemoryWarehouseStore::new();
        let product = store.add_product("Widget", Money::from_cents(250)).await;
        let warehouse = store.add_warehouse("Main").await;
        store.add_order(product, 2, t0()).await;
        let service = FulfillmentService::procedure(
            store.clone(),
            ProcedureName::parse("add_product_to_warehouse_v9").unwrap(),
        );

        let err = service
            .fulfill_at(FulfillmentRequest::new(product, warehouse, 2), t0() + Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::Failed {
                stage: FulfillmentStage::Committing,
                ..
            }
        ));
        assert_eq!(store.placement_count().await, 0);
    }
}
