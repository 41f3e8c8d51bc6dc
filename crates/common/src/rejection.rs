//! Caller-correctable reasons a fulfillment request can be turned down.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a fulfillment request was rejected.
///
/// The set is closed: the atomic database procedure signals exactly these
/// codes, and the HTTP layer reports them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    InvalidAmount,
    UnknownProduct,
    UnknownWarehouse,
    NoMatchingOrder,
    Conflict,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 5] = [
        RejectionReason::InvalidAmount,
        RejectionReason::UnknownProduct,
        RejectionReason::UnknownWarehouse,
        RejectionReason::NoMatchingOrder,
        RejectionReason::Conflict,
    ];

    /// Returns the wire code, e.g. `"no-matching-order"`.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidAmount => "invalid-amount",
            RejectionReason::UnknownProduct => "unknown-product",
            RejectionReason::UnknownWarehouse => "unknown-warehouse",
            RejectionReason::NoMatchingOrder => "no-matching-order",
            RejectionReason::Conflict => "conflict",
        }
    }

    /// Returns a human-readable explanation.
    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::InvalidAmount => "Amount must be greater than zero",
            RejectionReason::UnknownProduct => "Product does not exist",
            RejectionReason::UnknownWarehouse => "Warehouse does not exist",
            RejectionReason::NoMatchingOrder => "No matching order to fulfill",
            RejectionReason::Conflict => "Order was fulfilled by a concurrent request",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Returned when a string is not one of the rejection codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown rejection code: {0}")]
pub struct UnknownRejectionCode(pub String);

impl std::str::FromStr for RejectionReason {
    type Err = UnknownRejectionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        RejectionReason::ALL
            .into_iter()
            .find(|reason| reason.code() == code)
            .ok_or_else(|| UnknownRejectionCode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_code() {
        for reason in RejectionReason::ALL {
            assert_eq!(reason.code().parse::<RejectionReason>(), Ok(reason));
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            " conflict\n".parse::<RejectionReason>(),
            Ok(RejectionReason::Conflict)
        );
    }

    #[test]
    fn test_parse_unknown_code() {
        let err = "out-of-stock".parse::<RejectionReason>().unwrap_err();
        assert_eq!(err, UnknownRejectionCode("out-of-stock".to_string()));
    }

    #[test]
    fn test_serialization_uses_codes() {
        let json = serde_json::to_string(&RejectionReason::NoMatchingOrder).unwrap();
        assert_eq!(json, "\"no-matching-order\"");
    }
}
