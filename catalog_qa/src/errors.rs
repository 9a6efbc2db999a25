use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Request-scoped failure taxonomy. No variant is fatal to the process.
#[derive(Error, Debug)]
pub enum QaError {
    #[error("Retrieval backend unreachable: {0}")]
    Connection(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Corrupt cache entry: {0}")]
    CacheCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for QaError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            QaError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            QaError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

pub type QaResult<T> = Result<T, QaError>;
