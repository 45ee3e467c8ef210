//! Error to HTTP response mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use koperasi_core::{CoreError, ErrorKind};
use koperasi_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Result type for handlers; errors render through [`error_response`].
pub type ApiResult<T> = Result<T, ApiError>;

/// A domain error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(&self.0)
    }
}

/// Classifies a domain error as an application error.
#[must_use]
pub fn app_error(err: &CoreError) -> AppError {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::Validation => AppError::Validation(message),
        ErrorKind::State => AppError::State(message),
        ErrorKind::InsufficientFunds => AppError::InsufficientFunds(message),
        ErrorKind::ConcurrencyConflict => AppError::Conflict(message),
        ErrorKind::NotFound => AppError::NotFound(message),
        ErrorKind::Forbidden => AppError::Forbidden(message),
        ErrorKind::Infrastructure if matches!(err, CoreError::Database(_)) => {
            AppError::Database(message)
        }
        ErrorKind::Infrastructure => AppError::Internal(message),
    }
}

/// Builds the JSON error response for a domain error.
///
/// The body carries the specific `error` code (e.g. `LOAN_PAID`), the coarse
/// `category`, and whether the whole operation may be retried.
pub fn error_response(err: &CoreError) -> Response {
    let app = app_error(err);

    match err.kind() {
        ErrorKind::Infrastructure => error!(error = %err, "request failed"),
        ErrorKind::ConcurrencyConflict => warn!(error = %err, "request lost a race"),
        _ => {}
    }

    // Store details stay in the log.
    let message = match &app {
        AppError::Database(_) | AppError::Internal(_) => "An error occurred".to_string(),
        _ => err.to_string(),
    };

    (
        status_of(&app),
        Json(json!({
            "error": err.error_code(),
            "category": app.error_code(),
            "message": message,
            "retryable": app.is_retryable(),
        })),
    )
        .into_response()
}

/// Builds the JSON error response for an application error raised outside
/// the domain, such as a failed token check.
pub fn app_error_response(err: &AppError) -> Response {
    (
        status_of(err),
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

fn status_of(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
