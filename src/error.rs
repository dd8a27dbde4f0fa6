// HTTP API Error Types
use axum::{response::IntoResponse, http::StatusCode, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized - carries a stable machine-readable code per auth failure kind
    Unauthorized { code: &'static str, message: String },

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity (field-level validation failures)
    UnprocessableEntity {
        message: String,
        details: HashMap<String, String>,
    },

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity { .. } => 422,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized { message, .. } => message,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized { code, .. } => code,
            ApiError::Forbidden(_) => "PERMISSION_DENIED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity { .. } => "VALIDATION_ERROR",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UnprocessableEntity { message, details } => {
                json!({
                    "status": self.status_code(),
                    "error": self.error_code(),
                    "message": message,
                    "details": details,
                })
            }
            _ => {
                json!({
                    "status": self.status_code(),
                    "error": self.error_code(),
                    "message": self.message(),
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized { code: "UNAUTHORIZED", message: message.into() }
    }

    pub fn unauthorized_with_code(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Unauthorized { code, message: message.into() }
    }

    /// No identity could be resolved for a protected route
    pub fn authentication_required() -> Self {
        ApiError::Unauthorized {
            code: "AUTHENTICATION_REQUIRED",
            message: "Authentication required.".to_string(),
        }
    }

    /// A resolved identity lacks every acceptable role for the route
    pub fn permission_denied() -> Self {
        ApiError::Forbidden("You do not have permission to access this resource.".to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(format!("{} not found", resource.into()))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(
        message: impl Into<String>,
        details: HashMap<String, String>,
    ) -> Self {
        ApiError::UnprocessableEntity { message: message.into(), details }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert domain error types to ApiError

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::ConfigMissing(_) => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database not configured")
            }
            crate::database::manager::DatabaseError::Migration(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return a generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::auth::token::TokenError> for ApiError {
    fn from(err: crate::auth::token::TokenError) -> Self {
        use crate::auth::token::TokenError;
        // Routine outcomes: log quietly, never at error severity
        tracing::debug!("Access token rejected: {}", err);
        match err {
            TokenError::Expired => {
                ApiError::unauthorized_with_code("TOKEN_EXPIRED", "Token has expired.")
            }
            TokenError::Malformed(_) => {
                ApiError::unauthorized_with_code("TOKEN_MALFORMED", "Token is malformed.")
            }
            TokenError::Invalid(_) => {
                ApiError::unauthorized_with_code("TOKEN_INVALID", "Token is invalid.")
            }
            TokenError::MissingSecret => {
                tracing::error!("JWT secret not configured");
                ApiError::internal_server_error("Authentication is not configured")
            }
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        use crate::auth::AuthError;
        match err {
            AuthError::InvalidCredentials => {
                ApiError::unauthorized_with_code("INVALID_CREDENTIALS", "Invalid credentials.")
            }
            AuthError::AccountInactive => {
                ApiError::unauthorized_with_code("ACCOUNT_INACTIVE", "Account is inactive.")
            }
            AuthError::InvalidRefreshToken => {
                ApiError::unauthorized_with_code("INVALID_REFRESH_TOKEN", "Invalid refresh token.")
            }
            AuthError::RefreshTokenRevokedOrExpired => ApiError::unauthorized_with_code(
                "REFRESH_TOKEN_REVOKED",
                "Token has been revoked or expired.",
            ),
            AuthError::UserNotFound => {
                ApiError::unauthorized_with_code("USER_NOT_FOUND", "User no longer exists.")
            }
            AuthError::EmailTaken => {
                let mut details = HashMap::new();
                details.insert("email".to_string(), "This email is already in use.".to_string());
                ApiError::unprocessable_entity("Validation Error", details)
            }
            AuthError::Token(token_err) => token_err.into(),
            AuthError::Hash(msg) => {
                tracing::error!("Password hashing error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            AuthError::Database(sqlx_err) => {
                tracing::error!("Auth store error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::services::user_service::UserError> for ApiError {
    fn from(err: crate::services::user_service::UserError) -> Self {
        use crate::services::user_service::UserError;
        match err {
            UserError::NotFound => ApiError::not_found("User"),
            UserError::OwnAccount(msg) => ApiError::forbidden(msg),
            UserError::EmailTaken => {
                let mut details = HashMap::new();
                details.insert("email".to_string(), "This email is already in use.".to_string());
                ApiError::unprocessable_entity("Validation Error", details)
            }
            UserError::Hash(msg) => {
                tracing::error!("Password hashing error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            UserError::Database(sqlx_err) => {
                tracing::error!("User store error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::services::category_service::CategoryError> for ApiError {
    fn from(err: crate::services::category_service::CategoryError) -> Self {
        use crate::services::category_service::CategoryError;
        match err {
            CategoryError::NotFound => ApiError::not_found("Category"),
            CategoryError::SlugTaken(slug) => {
                ApiError::conflict(format!("A category with slug '{}' already exists", slug))
            }
            CategoryError::Database(sqlx_err) => {
                tracing::error!("Category store error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::services::tag_service::TagError> for ApiError {
    fn from(err: crate::services::tag_service::TagError) -> Self {
        use crate::services::tag_service::TagError;
        match err {
            TagError::NotFound => ApiError::not_found("Tag"),
            TagError::SlugTaken(slug) => {
                ApiError::conflict(format!("A tag with slug '{}' already exists", slug))
            }
            TagError::Database(sqlx_err) => {
                tracing::error!("Tag store error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay out of the body unless debug mode is on
        let mut body = self.to_json();
        if status == StatusCode::INTERNAL_SERVER_ERROR && !crate::config::config().api.debug_errors {
            body["message"] = json!("An error occurred while processing your request");
        }

        (status, Json(body)).into_response()
    }
}
