use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned when the `counter` form field is missing or not an integer.
pub const INVALID_COUNTER_BODY: &str = "count value is not a valid number\n";

/// Application-wide error types with appropriate HTTP status codes.
///
/// Only `InvalidCounter` and `ShuttingDown` can reach a client in practice;
/// the remaining variants surface during startup and are mapped to process
/// exit codes in `main`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid counter value {0:?}")]
    InvalidCounter(String),

    #[error("Publish pool is shutting down")]
    ShuttingDown,

    #[error("Failed to create Kafka producer: {0}")]
    Producer(#[from] rdkafka::error::KafkaError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidCounter(_) => {
                tracing::warn!(error = %self, "Rejected /producer request");
                let mut response = (StatusCode::BAD_REQUEST, INVALID_COUNTER_BODY).into_response();
                response.headers_mut().insert(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                );
                response
            }
            AppError::ShuttingDown => {
                tracing::warn!("Rejected /producer request during shutdown");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service is shutting down\n",
                )
                    .into_response()
            }
            // Never expose internal details to clients
            AppError::Producer(_) | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error\n",
                )
                    .into_response()
            }
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
