use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, RejectionReason, StockPlacementId, WarehouseId};
use tokio::sync::RwLock;

use crate::{
    FulfillOrder, MatchedOrder, Order, ProcedureCall, ProcedureName, Product, Result,
    StockPlacement, StoreError, Warehouse,
    model::select_oldest_fulfillable,
    store::{ProcedureExecutor, WarehouseStore},
};

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    orders: BTreeMap<OrderId, Order>,
    placements: Vec<StockPlacement>,
    last_product_id: i32,
    last_warehouse_id: i32,
    last_order_id: i32,
    last_placement_id: i32,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_on_insert: AtomicBool,
}

/// Writes staged against the tables and applied only by `commit`.
///
/// Dropping a unit without committing discards every staged write.
struct UnitOfWork<'a> {
    tables: &'a mut Tables,
    faults: &'a Faults,
    fulfilled: Vec<(OrderId, DateTime<Utc>)>,
    placements: Vec<StockPlacement>,
}

impl<'a> UnitOfWork<'a> {
    fn begin(tables: &'a mut Tables, faults: &'a Faults) -> Self {
        Self {
            tables,
            faults,
            fulfilled: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Conditional update: only an unfulfilled order can be marked.
    fn mark_fulfilled(&mut self, order_id: OrderId, now: DateTime<Utc>) -> Result<()> {
        let unfulfilled = self
            .tables
            .orders
            .get(&order_id)
            .is_some_and(|order| !order.is_fulfilled())
            && !self.fulfilled.iter().any(|(id, _)| *id == order_id);

        if !unfulfilled {
            return Err(StoreError::Conflict { order_id });
        }

        self.fulfilled.push((order_id, now));
        Ok(())
    }

    fn insert_placement(&mut self, fulfillment: &FulfillOrder) -> Result<StockPlacementId> {
        if self.faults.fail_on_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "stock placement insert failed".to_string(),
            ));
        }
        if !self.tables.warehouses.contains_key(&fulfillment.warehouse_id) {
            return Err(StoreError::Integrity(format!(
                "warehouse {} does not exist",
                fulfillment.warehouse_id
            )));
        }
        if !self.tables.products.contains_key(&fulfillment.product_id) {
            return Err(StoreError::Integrity(format!(
                "product {} does not exist",
                fulfillment.product_id
            )));
        }
        if !self.tables.orders.contains_key(&fulfillment.order_id) {
            return Err(StoreError::Integrity(format!(
                "order {} does not exist",
                fulfillment.order_id
            )));
        }

        let price = fulfillment.total_price()?;

        // Consumed even if the unit is never committed, like a sequence.
        self.tables.last_placement_id += 1;
        let id = StockPlacementId::new(self.tables.last_placement_id);

        self.placements.push(StockPlacement {
            id,
            warehouse_id: fulfillment.warehouse_id,
            product_id: fulfillment.product_id,
            order_id: fulfillment.order_id,
            amount: fulfillment.amount,
            price,
            created_at: fulfillment.now,
        });
        Ok(id)
    }

    fn commit(self) {
        for (order_id, now) in self.fulfilled {
            if let Some(order) = self.tables.orders.get_mut(&order_id) {
                order.fulfilled_at = Some(now);
            }
        }
        self.tables.placements.extend(self.placements);
    }
}

/// In-memory warehouse store for tests and local runs.
///
/// Provides the same interface and atomicity guarantees as the PostgreSQL
/// implementation, plus seeding, inspection and fault injection helpers.
#[derive(Clone, Default)]
pub struct InMemoryWarehouseStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
}

impl InMemoryWarehouseStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the catalog.
    pub async fn add_product(&self, name: impl Into<String>, price: Money) -> ProductId {
        let mut tables = self.tables.write().await;
        tables.last_product_id += 1;
        let id = ProductId::new(tables.last_product_id);
        tables.products.insert(
            id,
            Product {
                id,
                name: name.into(),
                price,
            },
        );
        id
    }

    /// Changes a product's unit price. Returns false if it does not exist.
    pub async fn set_product_price(&self, product_id: ProductId, price: Money) -> bool {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&product_id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    /// Adds a warehouse.
    pub async fn add_warehouse(&self, name: impl Into<String>) -> WarehouseId {
        let mut tables = self.tables.write().await;
        tables.last_warehouse_id += 1;
        let id = WarehouseId::new(tables.last_warehouse_id);
        tables.warehouses.insert(
            id,
            Warehouse {
                id,
                name: name.into(),
            },
        );
        id
    }

    /// Adds an unfulfilled order.
    pub async fn add_order(
        &self,
        product_id: ProductId,
        amount: i32,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        let mut tables = self.tables.write().await;
        tables.last_order_id += 1;
        let id = OrderId::new(tables.last_order_id);
        tables.orders.insert(
            id,
            Order {
                id,
                product_id,
                amount,
                created_at,
                fulfilled_at: None,
            },
        );
        id
    }

    /// Returns a copy of an order.
    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.tables.read().await.orders.get(&order_id).cloned()
    }

    /// Returns all stock placements in insertion order.
    pub async fn placements(&self) -> Vec<StockPlacement> {
        self.tables.read().await.placements.clone()
    }

    /// Returns the number of stock placements recorded.
    pub async fn placement_count(&self) -> usize {
        self.tables.read().await.placements.len()
    }

    /// Makes every storage call fail until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the ledger insert fail after the order update has been staged.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.faults.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn product_price(&self, product_id: ProductId) -> Result<Option<Money>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.products.get(&product_id).map(|p| p.price))
    }

    async fn warehouse_exists(&self, warehouse_id: WarehouseId) -> Result<bool> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.warehouses.contains_key(&warehouse_id))
    }

    async fn find_fulfillable_order(
        &self,
        product_id: ProductId,
        amount: i32,
        as_of: DateTime<Utc>,
    ) -> Result<Option<MatchedOrder>> {
        self.check_available()?;
        let tables = self.tables.read().await;

        let Some(product) = tables.products.get(&product_id) else {
            return Ok(None);
        };

        Ok(
            select_oldest_fulfillable(tables.orders.values(), product_id, amount, as_of).map(
                |order| MatchedOrder {
                    order_id: order.id,
                    snapshot_price: product.price,
                },
            ),
        )
    }

    #[tracing::instrument(skip(self))]
    async fn fulfill_order(&self, fulfillment: FulfillOrder) -> Result<StockPlacementId> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        let mut unit = UnitOfWork::begin(&mut tables, &self.faults);
        unit.mark_fulfilled(fulfillment.order_id, fulfillment.now)?;
        let placement_id = unit.insert_placement(&fulfillment)?;
        unit.commit();

        Ok(placement_id)
    }
}

#[async_trait]
impl ProcedureExecutor for InMemoryWarehouseStore {
    #[tracing::instrument(skip(self))]
    async fn execute_fulfillment_procedure(
        &self,
        procedure: &ProcedureName,
        call: ProcedureCall,
    ) -> Result<StockPlacementId> {
        if procedure.as_str() != ProcedureName::DEFAULT {
            return Err(StoreError::UnknownProcedure(procedure.to_string()));
        }
        self.check_available()?;

        // One write lock for the whole sequence stands in for the
        // database-side atomic call.
        let mut tables = self.tables.write().await;

        if call.amount <= 0 {
            return Err(StoreError::BusinessRule(RejectionReason::InvalidAmount));
        }
        let snapshot_price = tables
            .products
            .get(&call.product_id)
            .map(|p| p.price)
            .ok_or(StoreError::BusinessRule(RejectionReason::UnknownProduct))?;
        if !tables.warehouses.contains_key(&call.warehouse_id) {
            return Err(StoreError::BusinessRule(RejectionReason::UnknownWarehouse));
        }
        let order_id = select_oldest_fulfillable(
            tables.orders.values(),
            call.product_id,
            call.amount,
            call.created_at,
        )
        .map(|order| order.id)
        .ok_or(StoreError::BusinessRule(RejectionReason::NoMatchingOrder))?;

        let fulfillment = FulfillOrder {
            order_id,
            warehouse_id: call.warehouse_id,
            product_id: call.product_id,
            amount: call.amount,
            snapshot_price,
            now: call.created_at,
        };

        let mut unit = UnitOfWork::begin(&mut tables, &self.faults);
        unit.mark_fulfilled(order_id, fulfillment.now)
            .map_err(|_| StoreError::BusinessRule(RejectionReason::Conflict))?;
        let placement_id = unit.insert_placement(&fulfillment)?;
        unit.commit();

        Ok(placement_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    struct Fixture {
        store: InMemoryWarehouseStore,
        product: ProductId,
        warehouse: WarehouseId,
        order: OrderId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryWarehouseStore::new();
        let product = store.add_product("Widget", Money::from_cents(1250)).await;
        let warehouse = store.add_warehouse("Main").await;
        let order = store.add_order(product, 4, t0()).await;
        Fixture {
            store,
            product,
            warehouse,
            order,
        }
    }

    fn fulfillment(f: &Fixture, now: DateTime<Utc>) -> FulfillOrder {
        FulfillOrder {
            order_id: f.order,
            warehouse_id: f.warehouse,
            product_id: f.product,
            amount: 4,
            snapshot_price: Money::from_cents(1250),
            now,
        }
    }

    #[tokio::test]
    async fn catalog_lookups() {
        let f = fixture().await;

        assert_eq!(
            f.store.product_price(f.product).await.unwrap(),
            Some(Money::from_cents(1250))
        );
        assert_eq!(f.store.product_price(ProductId::new(99)).await.unwrap(), None);
        assert!(f.store.warehouse_exists(f.warehouse).await.unwrap());
        assert!(!f.store.warehouse_exists(WarehouseId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn find_returns_snapshot_price() {
        let f = fixture().await;
        let now = t0() + Duration::minutes(1);

        let matched = f
            .store
            .find_fulfillable_order(f.product, 4, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(matched.order_id, f.order);
        assert_eq!(matched.snapshot_price, Money::from_cents(1250));
    }

    #[tokio::test]
    async fn find_for_unknown_product_is_none() {
        let f = fixture().await;
        let result = f
            .store
            .find_fulfillable_order(ProductId::new(99), 4, t0() + Duration::minutes(1))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fulfill_marks_order_and_appends_placement() {
        let f = fixture().await;
        let now = t0() + Duration::minutes(5);

        let id = f.store.fulfill_order(fulfillment(&f, now)).await.unwrap();

        let order = f.store.order(f.order).await.unwrap();
        assert_eq!(order.fulfilled_at, Some(now));

        let placements = f.store.placements().await;
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].id, id);
        assert_eq!(placements[0].order_id, f.order);
        assert_eq!(placements[0].price, Money::from_cents(5000));
        assert_eq!(placements[0].created_at, now);
    }

    #[tokio::test]
    async fn second_fulfill_conflicts() {
        let f = fixture().await;
        let now = t0() + Duration::minutes(5);

        f.store.fulfill_order(fulfillment(&f, now)).await.unwrap();
        let result = f
            .store
            .fulfill_order(fulfillment(&f, now + Duration::seconds(1)))
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { order_id }) if order_id == f.order));
        assert_eq!(f.store.placement_count().await, 1);
        assert_eq!(f.store.order(f.order).await.unwrap().fulfilled_at, Some(now));
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_order_update() {
        let f = fixture().await;
        f.store.set_fail_on_insert(true);

        let result = f
            .store
            .fulfill_order(fulfillment(&f, t0() + Duration::minutes(5)))
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(!f.store.order(f.order).await.unwrap().is_fulfilled());
        assert_eq!(f.store.placement_count().await, 0);
    }

    #[tokio::test]
    async fn dangling_warehouse_rolls_back_order_update() {
        let f = fixture().await;
        let mut bad = fulfillment(&f, t0() + Duration::minutes(5));
        bad.warehouse_id = WarehouseId::new(404);

        let result = f.store.fulfill_order(bad).await;

        assert!(matches!(result, Err(StoreError::Integrity(_))));
        assert!(!f.store.order(f.order).await.unwrap().is_fulfilled());
    }

    #[tokio::test]
    async fn total_price_overflow_rolls_back_order_update() {
        let store = InMemoryWarehouseStore::new();
        let price = Money::new(rust_decimal_macros::dec!(99999999999999999999999.99));
        let product = store.add_product("Bullion", price).await;
        let warehouse = store.add_warehouse("Vault").await;
        let order = store.add_order(product, 2_000_000_000, t0()).await;
        let now = t0() + Duration::minutes(1);

        let direct = store
            .fulfill_order(FulfillOrder {
                order_id: order,
                warehouse_id: warehouse,
                product_id: product,
                amount: 2_000_000_000,
                snapshot_price: price,
                now,
            })
            .await;
        assert!(matches!(direct, Err(StoreError::Integrity(_))));

        let procedure = store
            .execute_fulfillment_procedure(
                &ProcedureName::default(),
                ProcedureCall {
                    product_id: product,
                    warehouse_id: warehouse,
                    amount: 2_000_000_000,
                    created_at: now,
                },
            )
            .await;
        assert!(matches!(procedure, Err(StoreError::Integrity(_))));

        assert!(!store.order(order).await.unwrap().is_fulfilled());
        assert_eq!(store.placement_count().await, 0);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let f = fixture().await;
        f.store.set_unavailable(true);

        assert!(matches!(
            f.store.product_price(f.product).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            f.store.warehouse_exists(f.warehouse).await,
            Err(StoreError::Unavailable(_))
        ));

        f.store.set_unavailable(false);
        assert!(f.store.warehouse_exists(f.warehouse).await.unwrap());
    }

    #[tokio::test]
    async fn procedure_fulfills_oldest_order() {
        let f = fixture().await;
        let newer = f.store.add_order(f.product, 4, t0() + Duration::minutes(1)).await;
        let now = t0() + Duration::minutes(2);

        let id = f
            .store
            .execute_fulfillment_procedure(
                &ProcedureName::default(),
                ProcedureCall {
                    product_id: f.product,
                    warehouse_id: f.warehouse,
                    amount: 4,
                    created_at: now,
                },
            )
            .await
            .unwrap();

        assert_eq!(f.store.placements().await[0].id, id);
        assert!(f.store.order(f.order).await.unwrap().is_fulfilled());
        assert!(!f.store.order(newer).await.unwrap().is_fulfilled());
    }

    #[tokio::test]
    async fn procedure_signals_business_rules() {
        let f = fixture().await;
        let now = t0() + Duration::minutes(2);
        let call = |product_id, warehouse_id, amount| ProcedureCall {
            product_id,
            warehouse_id,
            amount,
            created_at: now,
        };
        let procedure = ProcedureName::default();

        let cases = [
            (call(f.product, f.warehouse, 0), RejectionReason::InvalidAmount),
            (call(ProductId::new(99), f.warehouse, 4), RejectionReason::UnknownProduct),
            (call(f.product, WarehouseId::new(99), 4), RejectionReason::UnknownWarehouse),
            (call(f.product, f.warehouse, 7), RejectionReason::NoMatchingOrder),
        ];

        for (input, expected) in cases {
            let result = f.store.execute_fulfillment_procedure(&procedure, input).await;
            assert!(
                matches!(result, Err(StoreError::BusinessRule(reason)) if reason == expected),
                "expected {expected}, got {result:?}"
            );
        }
        assert_eq!(f.store.placement_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_procedure_name() {
        let f = fixture().await;
        let procedure = ProcedureName::parse("some_other_procedure").unwrap();

        let result = f
            .store
            .execute_fulfillment_procedure(
                &procedure,
                ProcedureCall {
                    product_id: f.product,
                    warehouse_id: f.warehouse,
                    amount: 4,
                    created_at: t0() + Duration::minutes(2),
                },
            )
            .await;

        assert!(matches!(result, Err(StoreError::UnknownProcedure(_))));
    }
}
