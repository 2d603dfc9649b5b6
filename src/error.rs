use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// One rejected request field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid data")]
    InvalidData(Vec<FieldError>),
    #[error("User already exists")]
    UserExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid token")]
    InvalidToken,
    #[error("No sentence provided")]
    NoSentence,
    #[error("Could not extract both amount and tag")]
    ExtractionFailed,
    #[error("Invalid month, expected YYYY-MM")]
    InvalidMonth,
    #[error("{0}")]
    BadRequest(String),
    #[error("Error retrieving transactions")]
    RetrievalFailed,
    #[error("Error processing sentence: {0}")]
    Processing(anyhow::Error),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidData(_)
            | ApiError::UserExists
            | ApiError::UserNotFound
            | ApiError::InvalidPassword
            | ApiError::NoSentence
            | ApiError::ExtractionFailed
            | ApiError::InvalidMonth
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::RetrievalFailed | ApiError::Processing(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Expense routes answer with `error`, user routes with `message`.
    fn body(&self) -> serde_json::Value {
        match self {
            ApiError::InvalidData(errors) => json!({ "message": self.to_string(), "errors": errors }),
            ApiError::NoSentence
            | ApiError::ExtractionFailed
            | ApiError::InvalidMonth
            | ApiError::BadRequest(_)
            | ApiError::Processing(_) => json!({ "error": self.to_string() }),
            _ => json!({ "message": self.to_string() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
