//! Error taxonomy shared by services and handlers.
//!
//! Every failing operation leaves no side effects: writes happen inside a
//! transaction that is dropped (rolled back) when an error propagates.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range input (slot collision, non-positive bid, ...)
    #[error("{0}")]
    Validation(String),

    /// Unknown id reference
    #[error("{0}")]
    NotFound(String),

    /// Operation not legal in the entity's current lifecycle state.
    /// Callers should refresh the entity before retrying.
    #[error("{0}")]
    InvalidState(String),

    /// Close requested on an auction without bids; the auction stays open
    #[error("auction {0} has no bids, no winner can be determined")]
    EmptyAuction(i32),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Result type for chit fund operations
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::EmptyAuction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::EmptyAuction(_) => "empty_auction",
            Self::Database(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal server error".to_string()
            }
            other => {
                tracing::warn!(kind = other.kind(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            kind: self.kind().to_string(),
        });

        (self.status_code(), body).into_response()
    }
}
