//! Shared identifiers and value objects for the warehouse fulfillment system.

pub mod money;
pub mod rejection;
pub mod types;

pub use money::Money;
pub use rejection::{RejectionReason, UnknownRejectionCode};
pub use types::{OrderId, ProductId, StockPlacementId, WarehouseId};
