use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::fxql::{ErrorKind, FxqlError};

/// Every failure the HTTP boundary can report.
///
/// All variants render as `{message, code, position?}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Fxql(#[from] FxqlError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    fn status_and_error(self) -> (StatusCode, FxqlError) {
        match self {
            AppError::Fxql(err) => (StatusCode::BAD_REQUEST, err),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                FxqlError::new(ErrorKind::InvalidSyntax, msg, None),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                FxqlError::new(ErrorKind::RateLimitExceeded, "Rate limit exceeded", None),
            ),
            AppError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    FxqlError::new(ErrorKind::ServerError, "Internal server error", None),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, err) = self.status_and_error();
        (status, Json(err.body())).into_response()
    }
}
