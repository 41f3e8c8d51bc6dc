use common::{OrderId, RejectionReason};
use thiserror::Error;

/// Errors that can occur when interacting with the warehouse store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was no longer unfulfilled when the conditional update ran.
    /// Another request fulfilled it first.
    #[error("Order {order_id} was already fulfilled by a concurrent request")]
    Conflict { order_id: OrderId },

    /// The atomic procedure refused the request for a business reason.
    #[error("Business rule violated: {0}")]
    BusinessRule(RejectionReason),

    /// The atomic procedure completed without returning a new identifier.
    #[error("Procedure {0} did not return a new identifier")]
    MissingIdentifier(String),

    /// No procedure with this name is known to the store.
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// The procedure name is not a plain SQL identifier.
    #[error("Invalid procedure name: {0:?}")]
    InvalidProcedureName(String),

    /// A write referenced a row that does not exist.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for warehouse store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
