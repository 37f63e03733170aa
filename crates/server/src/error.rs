// crates/server/src/error.rs
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use peekaboo_core::{ProgramError, SettingsError};
use peekaboo_db::DbError;
use serde::Serialize;
use thiserror::Error;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Export error: {0}")]
    Program(#[from] ProgramError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::NotFound(what) => {
                tracing::warn!(what = %what, "Not found");
                (StatusCode::NOT_FOUND, ErrorResponse::new(what.clone()))
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(msg.clone()))
            }
            ApiError::Database(db_err) => match db_err {
                DbError::NotFound(msg) => {
                    tracing::warn!(message = %msg, "Not found");
                    (StatusCode::NOT_FOUND, ErrorResponse::new(msg.clone()))
                }
                DbError::Validation(msg) => {
                    tracing::warn!(message = %msg, "Validation failed");
                    (StatusCode::BAD_REQUEST, ErrorResponse::new(msg.clone()))
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::with_details("Database error", db_err.to_string()),
                    )
                }
            },
            ApiError::Settings(settings_err) => match settings_err {
                SettingsError::Invalid { field, message } => {
                    tracing::warn!(field = %field, message = %message, "Invalid settings");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Invalid settings", settings_err.to_string()),
                    )
                }
                _ => {
                    tracing::error!(error = %settings_err, "Settings error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::with_details("Settings error", settings_err.to_string()),
                    )
                }
            },
            ApiError::Program(program_err) => {
                tracing::error!(error = %program_err, "Export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Export failed", program_err.to_string()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Internal server error", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` body extractor whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_not_found_returns_404() {
        let error = ApiError::NotFound("Session not found".to_string());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Session not found");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn test_db_not_found_returns_404() {
        let error = ApiError::Database(DbError::NotFound("Backup file not found: x.db".to_string()));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.contains("x.db"));
    }

    #[tokio::test]
    async fn test_db_validation_returns_400() {
        let error = ApiError::Database(DbError::Validation("Week and day are required".to_string()));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Week and day are required");
    }

    #[tokio::test]
    async fn test_db_io_returns_500_with_details() {
        let error = ApiError::Database(DbError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Database error");
        assert!(body.details.unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_invalid_settings_returns_400() {
        let error = ApiError::Settings(SettingsError::invalid("max_backups", "must be at least 1"));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Invalid settings");
        assert!(body.details.unwrap().contains("max_backups"));
    }

    #[tokio::test]
    async fn test_program_error_returns_500() {
        let error = ApiError::Program(ProgramError::InvalidTrainingTime("nine".to_string()));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.details.unwrap().contains("nine"));
    }

    #[tokio::test]
    async fn test_bad_request_returns_400() {
        let error = ApiError::BadRequest("No file provided".to_string());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "No file provided");
    }
}
