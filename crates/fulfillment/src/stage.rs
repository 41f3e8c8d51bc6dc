//! Phases a fulfillment request moves through.

/// Non-terminal phase of a fulfillment request.
///
/// A request runs `Validating → MatchingOrder → Committing` and ends in
/// success, rejection or failure. Failures record the phase they happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FulfillmentStage {
    /// Amount, product and warehouse checks.
    Validating,
    /// Selecting the order to fulfill.
    MatchingOrder,
    /// Running the atomic write (or the atomic procedure).
    Committing,
}

impl std::fmt::Display for FulfillmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStage::Validating => write!(f, "validating"),
            FulfillmentStage::MatchingOrder => write!(f, "matching order"),
            FulfillmentStage::Committing => write!(f, "committing"),
        }
    }
}
