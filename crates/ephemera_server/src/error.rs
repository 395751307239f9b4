//! HTTP error mapping for API handlers.

use crate::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Handler error carrying the core [`AppError`] and its HTTP status.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::BadRequest(_) | AppError::EmptyDocument => StatusCode::BAD_REQUEST,
            AppError::CapacityExceeded | AppError::NameSpaceExhausted => {
                StatusCode::INSUFFICIENT_STORAGE
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::Storage(err) => {
                tracing::error!("Storage error: {}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}
