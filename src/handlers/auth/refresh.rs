use axum::Json;
use serde::Deserialize;

use crate::auth::{AuthService, RefreshedTokens};
use crate::handlers::validation::FieldErrors;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// POST /auth/refresh - redeem a refresh token for a new pair
pub async fn refresh_post(Json(payload): Json<RefreshRequest>) -> ApiResult<RefreshedTokens> {
    let mut errors = FieldErrors::new();
    if payload.refresh_token.as_deref().unwrap_or("").is_empty() {
        errors.add("refresh_token", "Refresh token is required.");
    }
    errors.into_result()?;

    let raw = payload.refresh_token.unwrap_or_default();

    let service = AuthService::new().await?;
    let tokens = service.refresh(&raw).await?;

    Ok(ApiResponse::success(tokens, "Token refreshed successfully"))
}
