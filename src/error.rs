// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::fmt::Display;

/// HTTP API error. Every variant renders as `{"error": kind, "message": text}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { error: String, message: String },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound { error: String, message: String },

    // 4xx rejections produced while reading the request (size limit, content type)
    Rejected { status: StatusCode, message: String },

    // 500 Internal Server Error; `error` carries the raw cause
    InternalServerError { error: String, message: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Rejected { status, .. } => *status,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short error kind for the `error` field
    pub fn kind(&self) -> &str {
        match self {
            ApiError::BadRequest { error, .. } => error,
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::NotFound { error, .. } => error,
            ApiError::Rejected { status, .. } => status.canonical_reason().unwrap_or("Bad Request"),
            ApiError::InternalServerError { error, .. } => error,
        }
    }

    /// Get client-facing message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound { message, .. } => message,
            ApiError::Rejected { message, .. } => message,
            ApiError::InternalServerError { message, .. } => message,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.kind(),
            "message": self.message(),
        })
    }
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            error: error.into(),
            message: message.into(),
        }
    }

    /// 500 carrying the raw cause; logs at error level
    pub fn internal(cause: impl Display, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("{}: {}", message, cause);
        ApiError::InternalServerError {
            error: cause.to_string(),
            message,
        }
    }

    pub fn user_not_found() -> Self {
        Self::not_found("User not found", "The user with the specified ID does not exist.")
    }

    /// Same response whether the project is absent or owned by someone else
    pub fn project_not_found() -> Self {
        Self::not_found(
            "Project not found",
            "The project with the specified ID does not exist or does not belong to you.",
        )
    }

    pub fn invalid_project_id() -> Self {
        Self::bad_request("Invalid project ID", "The provided project ID is not valid.")
    }

    pub fn user_exists() -> Self {
        Self::bad_request("Something went wrong", "User already exists")
    }

    pub fn missing_email() -> Self {
        Self::bad_request(
            "Missing email",
            "User email is required but not found in Firebase record.",
        )
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
