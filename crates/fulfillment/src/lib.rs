//! Order fulfillment for the warehouse.
//!
//! A fulfillment places stock into a warehouse and, in one atomic unit,
//! marks the oldest matching unfulfilled order as fulfilled and records a
//! stock placement priced from a snapshot of the product price. This crate
//! provides:
//! - the catalog lookup, order matching and commit steps
//! - the `FulfillmentStrategy` trait with in-process (`DirectTransaction`)
//!   and store-side (`AtomicProcedure`) implementations
//! - `FulfillmentService`, the facade callers use

pub mod catalog;
pub mod error;
pub mod matcher;
pub mod request;
pub mod service;
pub mod stage;
pub mod strategy;
pub mod transaction;

pub use common::{RejectionReason, StockPlacementId};
pub use error::FulfillmentError;
pub use request::FulfillmentRequest;
pub use service::FulfillmentService;
pub use stage::FulfillmentStage;
pub use strategy::{AtomicProcedure, DirectTransaction, FulfillmentStrategy};
