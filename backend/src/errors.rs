// backend/src/errors.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use deadpool_diesel::PoolError as DeadpoolDieselPoolError;
use diesel::result::Error as DieselError;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    // --- Authentication/Authorization Errors ---
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),

    #[error("Email Taken")]
    EmailTaken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    // --- Database Errors ---
    #[error("Database query error: {0}")]
    DatabaseQueryError(String),

    #[error("Database pool error: {0}")]
    DbPoolError(String),

    #[error("Database interaction error (deadpool): {0}")]
    DbInteractError(String),

    #[error("Database migration error: {0}")]
    DbMigrationError(String),

    // --- Request/Input Errors ---
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("UUID Error: {0}")]
    UuidError(String),

    // --- External Service Errors ---
    #[error("LLM Client Error: {0}")]
    LlmClientError(String),

    #[error("LLM Generation Error: {0}")]
    GenerationError(String),

    #[error("LLM Embedding Error: {0}")]
    EmbeddingError(String),

    #[error("Vector DB Error: {0}")]
    VectorDbError(String),

    #[error("HTTP Request Error: {0}")]
    HttpRequestError(String),

    #[error("API Rate Limit Exceeded")]
    RateLimited,

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    // --- General/Internal Errors ---
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("Serialization Error: {0}")]
    SerializationError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

// --- IntoResponse Implementation ---
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // 4xx Client Errors
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "Email is already registered".to_string(),
            ),
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid input: {msg}"))
            }
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::UuidError(e) => {
                error!("UUID error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid identifier format".to_string(),
                )
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "API rate limit exceeded. Please try again later.".to_string(),
            ),

            // 5xx Server Errors
            AppError::DatabaseQueryError(e) => {
                error!("Database query error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::DbPoolError(e) => {
                error!("Database pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database connection error".to_string(),
                )
            }
            AppError::DbInteractError(e) => {
                error!("Database interaction error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database task execution error".to_string(),
                )
            }
            AppError::DbMigrationError(e) => {
                error!("Database migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database schema error".to_string(),
                )
            }
            AppError::PasswordHashingFailed(e) => {
                error!("Password hashing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal security error".to_string(),
                )
            }
            AppError::ConfigError(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AppError::IoError(e) => {
                error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "File system or network error".to_string(),
                )
            }
            AppError::SerializationError(e) => {
                error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Data formatting error".to_string(),
                )
            }
            AppError::LlmClientError(msg) => {
                error!("LLM Client Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI service client error".to_string(),
                )
            }
            AppError::GenerationError(msg) => {
                error!("LLM Generation Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI generation failed".to_string(),
                )
            }
            AppError::EmbeddingError(msg) => {
                error!("LLM Embedding Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI embedding failed".to_string(),
                )
            }
            AppError::VectorDbError(e) => {
                error!("Vector DB error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Vector database operation failed".to_string(),
                )
            }
            AppError::HttpRequestError(e) => {
                error!("HTTP Request Error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to communicate with external service".to_string(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                error!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI service temporarily unavailable".to_string(),
                )
            }

            // Catch-all Internal Server Error MUST be last
            AppError::InternalServerError(e) => {
                error!("Internal Server Error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

// --- Convenience Result Type ---
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// --- From implementations for library errors ---

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::PasswordHashingFailed(err.to_string())
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        AppError::DatabaseQueryError(err.to_string())
    }
}

impl From<DeadpoolDieselPoolError> for AppError {
    fn from(err: DeadpoolDieselPoolError) -> Self {
        AppError::DbPoolError(err.to_string())
    }
}

impl From<deadpool_diesel::InteractError> for AppError {
    fn from(err: deadpool_diesel::InteractError) -> Self {
        AppError::DbInteractError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpRequestError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::UuidError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<crate::auth::AuthError> for AppError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::WrongCredentials => AppError::InvalidCredentials,
            crate::auth::AuthError::EmailTaken => AppError::EmailTaken,
            crate::auth::AuthError::HashingError => {
                AppError::PasswordHashingFailed("Password hashing failed".to_string())
            }
            crate::auth::AuthError::UserNotFound => AppError::UserNotFound,
            crate::auth::AuthError::DatabaseError(s) => AppError::DatabaseQueryError(s),
            crate::auth::AuthError::PoolError(e) => AppError::DbPoolError(e.to_string()),
            crate::auth::AuthError::InteractError(s) => AppError::DbInteractError(s),
        }
    }
}

// --- Test Module ---
#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::Response;
    use serde_json::Value;
    use uuid::Uuid;

    // Helper to extract JSON body from response
    async fn get_body_json(response: Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body_bytes).expect("Failed to parse JSON body")
    }

    #[tokio::test]
    async fn test_internal_server_error_response() {
        let error = AppError::InternalServerError("Something went very wrong".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_database_error_response() {
        let db_error = DieselError::RollbackTransaction;
        let error = AppError::from(db_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Database error");
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let error = AppError::NotFound("Character not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Character not found");
    }

    #[tokio::test]
    async fn test_forbidden_response() {
        let error = AppError::Forbidden;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let error = AppError::Unauthorized("Token has expired".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Token has expired");
    }

    #[tokio::test]
    async fn test_email_taken_response() {
        let error = AppError::EmailTaken;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Email is already registered");
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let error = AppError::ValidationError("Invalid JSON from AI".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Invalid JSON from AI");
    }

    #[tokio::test]
    async fn test_service_unavailable_response() {
        let error = AppError::ServiceUnavailable("provider down".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "AI service temporarily unavailable");
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let error = AppError::RateLimited;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_uuid_error_response() {
        let inner_error = Uuid::try_parse("invalid-uuid").unwrap_err();
        let error = AppError::from(inner_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Invalid identifier format");
    }
}
