use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;

#[derive(Debug)]
pub enum ApiError {
    /// Login failure. One variant for unknown user, wrong password, and
    /// disabled account, so login never confirms whether a username exists.
    InvalidCredentials,

    /// Registration failure that DOES confirm a username exists.
    UsernameTaken,

    PasswordMismatch,

    WeakPassword,

    /// Reset-init failure that confirms a username does NOT exist.
    UserNotFound,

    IncorrectAnswer,

    Unauthenticated,

    Forbidden,

    /// A reset step was reached without an active reset flow; the client is
    /// bounced back to the start of the flow.
    FlowNotInitialized,

    NotFound(String),

    ValidationError(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),

    ExternalApiError { service: String, message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidCredentials => write!(f, "Invalid username or password"),
            ApiError::UsernameTaken => write!(f, "Username already exists"),
            ApiError::PasswordMismatch => write!(f, "Passwords do not match"),
            ApiError::WeakPassword => write!(f, "Password does not meet complexity requirements"),
            ApiError::UserNotFound => write!(f, "User not recognized"),
            ApiError::IncorrectAnswer => write!(f, "Incorrect answer"),
            ApiError::Unauthenticated => write!(f, "Authentication required"),
            ApiError::Forbidden => write!(f, "Insufficient privileges"),
            ApiError::FlowNotInitialized => write!(f, "Reset improperly initialized"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password.".to_string(),
            ),
            ApiError::UsernameTaken => {
                (StatusCode::CONFLICT, "Username already exists.".to_string())
            }
            ApiError::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "Passwords do not match.".to_string(),
            ),
            ApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password does not meet complexity requirements.".to_string(),
            ),
            ApiError::UserNotFound => {
                (StatusCode::NOT_FOUND, "User not recognized.".to_string())
            }
            ApiError::IncorrectAnswer => {
                (StatusCode::BAD_REQUEST, "Incorrect answer.".to_string())
            }
            ApiError::Unauthenticated => {
                // Notice plus redirect hint: API clients read the status,
                // browser shims follow the Location.
                let body = ApiResponse::<()>::error("Authentication required.");
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::LOCATION, "/login")],
                    Json(body),
                )
                    .into_response();
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Insufficient privileges.".to_string(),
            ),
            ApiError::FlowNotInitialized => {
                let body = ApiResponse::<()>::error("Reset improperly initialized.");
                return (
                    StatusCode::SEE_OTHER,
                    [(header::LOCATION, "/reset")],
                    Json(body),
                )
                    .into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::ExternalApiError { service, message } => {
                tracing::warn!("{} error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{} is unreachable", service),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn fetch_error(msg: impl Into<String>) -> Self {
        ApiError::ExternalApiError {
            service: "Upstream".to_string(),
            message: msg.into(),
        }
    }
}
