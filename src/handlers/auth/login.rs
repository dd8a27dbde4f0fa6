use axum::{http::HeaderMap, Json};
use serde::Deserialize;

use super::device_info_from_headers;
use crate::auth::{AuthService, SessionTokens};
use crate::handlers::validation::{is_valid_email, meets_password_minimum, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login - authenticate and open a session
pub async fn login_post(
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<SessionTokens> {
    let mut errors = FieldErrors::new();

    match payload.email.as_deref() {
        None | Some("") => errors.add("email", "Email address is required."),
        Some(email) if !is_valid_email(email) => {
            errors.add("email", "Please provide a valid email address.")
        }
        _ => {}
    }

    match payload.password.as_deref() {
        None | Some("") => errors.add("password", "Password is required."),
        Some(password) if !meets_password_minimum(password) => {
            errors.add("password", "Password must be at least 8 characters.")
        }
        _ => {}
    }

    errors.into_result()?;

    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    let device = device_info_from_headers(&headers);

    let service = AuthService::new().await?;
    let tokens = service.login(&email, &password, device).await?;

    Ok(ApiResponse::success(tokens, "Login successful"))
}
