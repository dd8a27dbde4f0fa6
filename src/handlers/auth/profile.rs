use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::service::ProfileChanges;
use crate::auth::AuthService;
use crate::database::models::{RefreshToken, User};
use crate::handlers::validation::{is_strong_password, is_valid_email, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub user: User,
    pub sessions: Vec<RefreshToken>,
}

/// GET /auth/profile - current user plus active sessions
pub async fn profile_get(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<ProfileData> {
    let service = AuthService::new().await?;
    let (user, sessions) = service.profile(user.id).await?;

    Ok(ApiResponse::success(
        ProfileData { user, sessions },
        "Profile retrieved successfully",
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// PUT /auth/profile - partial update of the current user's own account
pub async fn profile_put(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<User> {
    let mut errors = FieldErrors::new();

    if let Some(name) = payload.name.as_deref() {
        if name.is_empty() {
            errors.add("name", "Name must be a valid string.");
        } else if name.len() > 255 {
            errors.add("name", "Name cannot exceed 255 characters.");
        }
    }

    if let Some(email) = payload.email.as_deref() {
        if !is_valid_email(email) {
            errors.add("email", "Please provide a valid email address.");
        }
    }

    if let Some(password) = payload.password.as_deref() {
        if !is_strong_password(password) {
            errors.add(
                "password",
                "Password must be at least 8 characters with mixed case and numbers.",
            );
        }
        if payload.password_confirmation.as_deref() != Some(password) {
            errors.add("password", "Password confirmation does not match.");
        }
    }

    errors.into_result()?;

    let service = AuthService::new().await?;
    let updated = service
        .update_profile(
            user.id,
            ProfileChanges {
                name: payload.name,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(ApiResponse::success(updated, "Profile updated successfully"))
}
