use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::AuthService;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// POST /auth/logout - close the current session.
///
/// Deleting the refresh token is all this does; the presented access token
/// keeps working until its short natural expiry.
pub async fn logout_post(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Option<Json<LogoutRequest>>,
) -> ApiResult<()> {
    let refresh_token = payload.and_then(|Json(p)| p.refresh_token);

    let service = AuthService::new().await?;
    service.logout(user.id, refresh_token.as_deref()).await?;

    Ok(ApiResponse::message_only("Logged out successfully"))
}

/// POST /auth/logout-all - revoke every session for this user
pub async fn logout_all_post(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<()> {
    let service = AuthService::new().await?;
    service.logout_all(user.id).await?;

    Ok(ApiResponse::message_only("Logged out from all devices successfully"))
}
