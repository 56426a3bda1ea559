//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use fulfillment::{FieldError, FulfillmentError};
use serde::Serialize;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path, query or body input.
    BadRequest(String),
    /// Failure reported by the coordinator.
    Fulfillment(FulfillmentError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ErrorResponse {
    fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: error.into(),
            message: message.into(),
            timestamp: Utc::now(),
            field_errors: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::BadRequest(msg) => {
                ErrorResponse::new(StatusCode::BAD_REQUEST, "Bad Request", msg)
            }
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        metrics::counter!("api_error_responses_total", "status" => status.as_u16().to_string())
            .increment(1);
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> ErrorResponse {
    match err {
        FulfillmentError::OrderNotFound { .. } => {
            ErrorResponse::new(StatusCode::NOT_FOUND, "Not Found", err.to_string())
        }
        FulfillmentError::Validation(fields) => {
            let mut body = ErrorResponse::new(
                StatusCode::BAD_REQUEST,
                "Validation Failed",
                "Validation failed",
            );
            body.field_errors = fields;
            body
        }
        FulfillmentError::ProductNotFound(_)
        | FulfillmentError::InsufficientStock { .. }
        | FulfillmentError::InvalidStatusTransition { .. }
        | FulfillmentError::NotCancellable(_) => {
            ErrorResponse::new(StatusCode::BAD_REQUEST, err.code(), err.to_string())
        }
        FulfillmentError::Store(_) => {
            tracing::error!(error = %err, "internal server error");
            ErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                INTERNAL_MESSAGE,
            )
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}
