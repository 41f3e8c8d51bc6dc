//! Fulfillment error types.

use common::RejectionReason;
use thiserror::Error;
use warehouse_store::StoreError;

use crate::stage::FulfillmentStage;

/// Why a fulfillment request did not produce a stock placement.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The caller can correct the request. Never retried internally.
    #[error("Request rejected: {}", .0.message())]
    Rejected(RejectionReason),

    /// Infrastructure failure. Nothing was persisted.
    #[error("Fulfillment failed while {stage}: {source}")]
    Failed {
        stage: FulfillmentStage,
        #[source]
        source: StoreError,
    },
}

impl FulfillmentError {
    /// Classifies a store error raised during `stage`.
    ///
    /// Lost races and business-rule violations are rejections; everything
    /// else is an infrastructure failure.
    pub fn from_store(stage: FulfillmentStage, err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => FulfillmentError::Rejected(RejectionReason::Conflict),
            StoreError::BusinessRule(reason) => FulfillmentError::Rejected(reason),
            source => FulfillmentError::Failed { stage, source },
        }
    }

    /// Returns the rejection reason, if this is a rejection.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            FulfillmentError::Rejected(reason) => Some(*reason),
            FulfillmentError::Failed { .. } => None,
        }
    }

    /// Returns true if the request lost a race for its order. The caller may
    /// retry from order matching.
    pub fn is_conflict(&self) -> bool {
        matches!(self, FulfillmentError::Rejected(RejectionReason::Conflict))
    }
}

impl From<RejectionReason> for FulfillmentError {
    fn from(reason: RejectionReason) -> Self {
        FulfillmentError::Rejected(reason)
    }
}

/// Attaches the current stage to store results.
pub(crate) trait DuringStage<T> {
    fn during(self, stage: FulfillmentStage) -> Result<T, FulfillmentError>;
}

impl<T> DuringStage<T> for Result<T, StoreError> {
    fn during(self, stage: FulfillmentStage) -> Result<T, FulfillmentError> {
        self.map_err(|e| FulfillmentError::from_store(stage, e))
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;

    use super::*;

    #[test]
    fn conflict_is_a_rejection() {
        let err = FulfillmentError::from_store(
            FulfillmentStage::Committing,
            StoreError::Conflict {
                order_id: OrderId::new(3),
            },
        );
        assert!(err.is_conflict());
        assert_eq!(err.rejection_reason(), Some(RejectionReason::Conflict));
    }

    #[test]
    fn business_rule_keeps_its_reason() {
        let err = FulfillmentError::from_store(
            FulfillmentStage::Committing,
            StoreError::BusinessRule(RejectionReason::UnknownWarehouse),
        );
        assert_eq!(err.rejection_reason(), Some(RejectionReason::UnknownWarehouse));
        assert!(!err.is_conflict());
    }

    #[test]
    fn infrastructure_errors_fail_with_stage() {
        let err = FulfillmentError::from_store(
            FulfillmentStage::MatchingOrder,
            StoreError::Unavailable("connection refused".to_string()),
        );
        assert!(matches!(
            err,
            FulfillmentError::Failed {
                stage: FulfillmentStage::MatchingOrder,
                source: StoreError::Unavailable(_)
            }
        ));
        assert_eq!(
            err.to_string(),
            "Fulfillment failed while matching order: Store unavailable: connection refused"
        );
    }

    #[test]
    fn rejection_message() {
        let err = FulfillmentError::from(RejectionReason::NoMatchingOrder);
        assert_eq!(err.to_string(), "Request rejected: No matching order to fulfill");
    }
}
