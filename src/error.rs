// region:    --- Imports
use crate::bidding::validation::BidRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

// endregion: --- Imports

// region:    --- Gallery Error
/// Error type shared by commands, queries and HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidBid(#[from] BidRejection),

    #[error("Invalid field")]
    InvalidField(String),

    #[error("Missing or malformed caller identity")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Message broker error: {0}")]
    Broker(String),
}

pub type GalleryResult<T> = Result<T, GalleryError>;

/// A stored or submitted string that names no variant of a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl GalleryError {
    /// Stable machine-readable code returned alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            GalleryError::NotFound { .. } => "NOT_FOUND",
            GalleryError::Validation(_) => "VALIDATION_ERROR",
            GalleryError::InvalidBid(rejection) => rejection.code(),
            GalleryError::InvalidField(_) => "INVALID_FIELD",
            GalleryError::Unauthorized => "UNAUTHORIZED",
            GalleryError::Forbidden(_) => "FORBIDDEN",
            GalleryError::Conflict(_) => "CONFLICT",
            GalleryError::Database(sqlx::Error::RowNotFound) => "NOT_FOUND",
            GalleryError::Config(_)
            | GalleryError::Database(_)
            | GalleryError::Serialization(_)
            | GalleryError::Broker(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GalleryError::NotFound { .. } => StatusCode::NOT_FOUND,
            GalleryError::Validation(_)
            | GalleryError::InvalidBid(_)
            | GalleryError::InvalidField(_) => StatusCode::BAD_REQUEST,
            GalleryError::Unauthorized => StatusCode::UNAUTHORIZED,
            GalleryError::Forbidden(_) => StatusCode::FORBIDDEN,
            GalleryError::Conflict(_) => StatusCode::CONFLICT,
            GalleryError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            GalleryError::Config(_)
            | GalleryError::Database(_)
            | GalleryError::Serialization(_)
            | GalleryError::Broker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            GalleryError::Database(sqlx::Error::RowNotFound) => "Resource not found".to_string(),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("{:<12} --> {}", "Handler", self);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "error": message,
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}
// endregion: --- Gallery Error

// endregion: --- Tests
