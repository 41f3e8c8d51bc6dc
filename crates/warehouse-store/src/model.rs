//! Rows read and written by the fulfillment workflow.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, StockPlacementId, WarehouseId};

use crate::{Result, StoreError};

/// A catalog product. Only its price matters to fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
}

/// A warehouse. Existence is the only property checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
}

/// A customer order for a single product.
///
/// An order with `fulfilled_at` set is terminal and is never written again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns true once a stock placement has been recorded for this order.
    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled_at.is_some()
    }

    /// Returns true if this order may satisfy a placement of `amount` units of
    /// `product_id` requested at `as_of`.
    ///
    /// Orders created at exactly `as_of` are not eligible.
    pub fn is_fulfillable_by(&self, product_id: ProductId, amount: i32, as_of: DateTime<Utc>) -> bool {
        self.product_id == product_id
            && self.amount == amount
            && !self.is_fulfilled()
            && self.created_at < as_of
    }
}

/// Picks the order a placement should fulfill: the oldest eligible one,
/// lowest id first on equal timestamps.
pub fn select_oldest_fulfillable<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    product_id: ProductId,
    amount: i32,
    as_of: DateTime<Utc>,
) -> Option<&'a Order> {
    orders
        .into_iter()
        .filter(|order| order.is_fulfillable_by(product_id, amount, as_of))
        .min_by_key(|order| (order.created_at, order.id))
}

/// Ledger entry recording that an order was satisfied from a warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockPlacement {
    pub id: StockPlacementId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub amount: i32,
    /// Total price: amount times the unit price captured at match time.
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

/// The order chosen by the matcher, with the product price read alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedOrder {
    pub order_id: OrderId,
    pub snapshot_price: Money,
}

/// Input to the fulfillment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillOrder {
    pub order_id: OrderId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub amount: i32,
    pub snapshot_price: Money,
    pub now: DateTime<Utc>,
}

impl FulfillOrder {
    /// Total recorded on the ledger entry.
    ///
    /// Fails with [`StoreError::Integrity`] when the total does not fit a
    /// decimal, so the placement is never written.
    pub fn total_price(&self) -> Result<Money> {
        self.snapshot_price
            .checked_times(self.amount)
            .ok_or_else(|| StoreError::Integrity("total price overflow".to_string()))
    }
}

/// Arguments passed to the atomic fulfillment procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcedureCall {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}
