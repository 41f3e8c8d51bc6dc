use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, RejectionReason, StockPlacementId, WarehouseId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::{
    FulfillOrder, MatchedOrder, ProcedureCall, ProcedureName, Result, StoreError,
    store::{ProcedureExecutor, WarehouseStore},
};

/// SQLSTATE raised by `RAISE EXCEPTION` without an explicit code.
const BUSINESS_RULE_SQLSTATE: &str = "P0001";

/// PostgreSQL-backed warehouse store implementation.
#[derive(Clone)]
pub struct PostgresWarehouseStore {
    pool: PgPool,
}

impl PostgresWarehouseStore {
    /// Creates a new PostgreSQL warehouse store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations, including the fulfillment procedure.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_match(row: PgRow) -> Result<MatchedOrder> {
        Ok(MatchedOrder {
            order_id: OrderId::new(row.try_get("id")?),
            snapshot_price: Money::new(row.try_get::<Decimal, _>("price")?),
        })
    }

    fn procedure_error(procedure: &ProcedureName, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.code().as_deref() == Some(BUSINESS_RULE_SQLSTATE)
            && let Ok(reason) = db_err.message().parse::<RejectionReason>()
        {
            return StoreError::BusinessRule(reason);
        }
        tracing::error!(%procedure, error = %err, "fulfillment procedure failed");
        StoreError::Database(err)
    }
}

#[async_trait]
impl WarehouseStore for PostgresWarehouseStore {
    async fn product_price(&self, product_id: ProductId) -> Result<Option<Money>> {
        let price: Option<Decimal> = sqlx::query_scalar("SELECT price FROM products WHERE id = $1")
            .bind(product_id.as_i32())
            .fetch_optional(&self.pool)
            .await?;

        Ok(price.map(Money::new))
    }

    async fn warehouse_exists(&self, warehouse_id: WarehouseId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM warehouses WHERE id = $1)")
                .bind(warehouse_id.as_i32())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_fulfillable_order(
        &self,
        product_id: ProductId,
        amount: i32,
        as_of: DateTime<Utc>,
    ) -> Result<Option<MatchedOrder>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT o.id, p.price
            FROM orders o
            JOIN products p ON p.id = o.product_id
            WHERE o.product_id = $1
              AND o.amount = $2
              AND o.fulfilled_at IS NULL
              AND o.created_at < $3
            ORDER BY o.created_at ASC, o.id ASC
            LIMIT 1
            "#,
        )
        .bind(product_id.as_i32())
        .bind(amount)
        .bind(as_of)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_match).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fulfill_order(&self, fulfillment: FulfillOrder) -> Result<StockPlacementId> {
        let total_price = fulfillment.total_price()?;

        // Rolled back on drop unless committed below.
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET fulfilled_at = $1
            WHERE id = $2 AND fulfilled_at IS NULL
            "#,
        )
        .bind(fulfillment.now)
        .bind(fulfillment.order_id.as_i32())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                order_id: fulfillment.order_id,
            });
        }

        let placement_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO stock_placements (warehouse_id, product_id, order_id, amount, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(fulfillment.warehouse_id.as_i32())
        .bind(fulfillment.product_id.as_i32())
        .bind(fulfillment.order_id.as_i32())
        .bind(fulfillment.amount)
        .bind(total_price.as_decimal())
        .bind(fulfillment.now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(StockPlacementId::new(placement_id))
    }
}

#[async_trait]
impl ProcedureExecutor for PostgresWarehouseStore {
    #[tracing::instrument(skip(self))]
    async fn execute_fulfillment_procedure(
        &self,
        procedure: &ProcedureName,
        call: ProcedureCall,
    ) -> Result<StockPlacementId> {
        let sql = format!("SELECT {procedure}($1, $2, $3, $4)");

        let new_id: Option<i32> = sqlx::query_scalar(&sql)
            .bind(call.product_id.as_i32())
            .bind(call.warehouse_id.as_i32())
            .bind(call.amount)
            .bind(call.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::procedure_error(procedure, e))?;

        new_id
            .map(StockPlacementId::new)
            .ok_or_else(|| StoreError::MissingIdentifier(procedure.to_string()))
    }
}
