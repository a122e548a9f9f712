use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the résumé endpoint.
/// Implements `IntoResponse` so handlers can return `Result<T, AppError>`.
/// Bodies carry a fixed message only; details go to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid page or page size: {0}")]
    InvalidParameter(String),

    #[error("Resume not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound("store reported missing resource".into()),
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message placed in the `error` field of the response body.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::InvalidParameter(_) => "Invalid page or page size",
            AppError::NotFound(_) => "Resume not found",
            AppError::Store(_) | AppError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InvalidParameter(detail) => tracing::error!("Invalid page or page size: {detail}"),
            AppError::NotFound(detail) => tracing::error!("Resume not found - {detail}"),
            AppError::Store(e) => tracing::error!("Error retrieving resume: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
