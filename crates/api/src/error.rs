//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::RejectionReason;
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request was turned down for a caller-correctable reason.
    Rejected(RejectionReason),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Rejected(reason) => (
                rejection_status(reason),
                serde_json::json!({ "error": reason.message(), "reason": reason.code() }),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": msg }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn rejection_status(reason: RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::Conflict => StatusCode::CONFLICT,
        RejectionReason::InvalidAmount
        | RejectionReason::UnknownProduct
        | RejectionReason::UnknownWarehouse
        | RejectionReason::NoMatchingOrder => StatusCode::BAD_REQUEST,
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::Rejected(reason) => ApiError::Rejected(reason),
            failed @ FulfillmentError::Failed { .. } => ApiError::Internal(failed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_409() {
        let response = ApiError::Rejected(RejectionReason::Conflict).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_rejections_map_to_400() {
        for reason in RejectionReason::ALL
            .into_iter()
            .filter(|r| *r != RejectionReason::Conflict)
        {
            let response = ApiError::Rejected(reason).into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{reason}");
        }
    }

    #[test]
    fn internal_maps_to_500() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
