//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::{CheckoutError, ErrorKind};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The checkout failed.
    Checkout(CheckoutError),
}

/// HTTP status for a checkout failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PaymentDeclined => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::DependencyUnreachable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::DependencyError => StatusCode::BAD_GATEWAY,
        ErrorKind::CurrencyMismatch | ErrorKind::InvalidValue => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Checkout(err) => {
                let status = status_for(err.kind());
                if status.is_server_error() {
                    tracing::error!(error = %err, step = %err.step(), "checkout failed");
                }
                (
                    status,
                    serde_json::json!({
                        "error": err.to_string(),
                        "kind": err.kind().as_str(),
                        "step": err.step().as_str(),
                    }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

#[cfg(test)]
mod tests {
    use saga::{CheckoutStep, ServiceError};

    use super::*;

    #[test]
    fn test_kind_to_status() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::PaymentDeclined),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_for(ErrorKind::DependencyUnreachable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(ErrorKind::Cancelled), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(ErrorKind::CurrencyMismatch),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_response_status() {
        let err = ApiError::from(CheckoutError::Service {
            step: CheckoutStep::Charged,
            source: ServiceError::PaymentDeclined("card expired".to_string()),
        });
        assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);

        let err = ApiError::BadRequest("user_id is required".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
