//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::CommerceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed IDs, unparsable amounts).
    BadRequest(String),
    /// Domain logic error.
    Commerce(CommerceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Commerce(err) => commerce_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn commerce_error_to_response(err: CommerceError) -> (StatusCode, String) {
    let status = match &err {
        CommerceError::NotFound { .. } => StatusCode::NOT_FOUND,
        CommerceError::Forbidden(_) => StatusCode::FORBIDDEN,
        CommerceError::EmptyCart
        | CommerceError::InvalidQuantity
        | CommerceError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
        CommerceError::InsufficientStock { .. } | CommerceError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
        CommerceError::Gateway(_) => StatusCode::BAD_GATEWAY,
        CommerceError::GatewayVerificationFailed(_) => StatusCode::BAD_REQUEST,
        CommerceError::TrackingCollision(_) | CommerceError::Internal(_) => {
            tracing::error!(error = %err, "internal server error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        ApiError::Commerce(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    fn status_of(err: CommerceError) -> StatusCode {
        commerce_error_to_response(err).0
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_of(CommerceError::not_found("order", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(CommerceError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CommerceError::InvalidQuantity),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CommerceError::AmountMismatch {
                expected: Money::from_cents(100),
                claimed: Money::from_cents(50),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CommerceError::InsufficientStock {
                product_id: "SOCK-001".into(),
                requested: 2,
                available: 1,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CommerceError::Forbidden("not yours".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CommerceError::Gateway("timeout".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }
}
