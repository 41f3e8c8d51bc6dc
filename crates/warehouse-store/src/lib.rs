//! Storage for warehouse fulfillment.
//!
//! Provides catalog lookups, oldest-first order matching and the atomic
//! fulfillment transaction behind the [`WarehouseStore`] trait, plus the
//! [`ProcedureExecutor`] trait for the single-call database procedure.
//! Both traits are implemented in memory and on PostgreSQL.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod procedure;
pub mod store;

pub use common::{Money, OrderId, ProductId, RejectionReason, StockPlacementId, WarehouseId};
pub use error::{Result, StoreError};
pub use memory::InMemoryWarehouseStore;
pub use model::{
    FulfillOrder, MatchedOrder, Order, ProcedureCall, Product, StockPlacement, Warehouse,
};
pub use postgres::PostgresWarehouseStore;
pub use procedure::ProcedureName;
pub use store::{ProcedureExecutor, WarehouseStore};
