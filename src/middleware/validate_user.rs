use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;

/// Live user record for the authenticated request, re-read from the store
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware that validates the identity from JWT claims against the live
/// users table. Catches accounts that were deactivated, soft-deleted, or
/// globally logged out (token_version bump) after the access token was
/// issued; signature + expiry alone cannot see any of those.
pub async fn validate_user_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(ApiError::authentication_required)?;

    let pool = DatabaseManager::pool().await?;

    let sql = format!(
        "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
        User::COLUMNS
    );
    let user: Option<User> = sqlx::query_as(&sql)
        .bind(auth_user.user_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error validating user {}: {}", auth_user.user_id, e);
            ApiError::internal_server_error("Failed to validate user")
        })?;

    let user = user.ok_or_else(|| {
        tracing::debug!("Rejected token for missing user {}", auth_user.user_id);
        ApiError::unauthorized_with_code("USER_NOT_FOUND", "User no longer exists.")
    })?;

    if !user.is_active {
        tracing::debug!("Rejected token for inactive user {}", user.id);
        return Err(ApiError::unauthorized_with_code(
            "ACCOUNT_INACTIVE",
            "Account is inactive.",
        ));
    }

    // Stale generation counter means logout-all ran after issuance
    if user.token_version != auth_user.token_version {
        tracing::debug!("Rejected stale token for user {}", user.id);
        return Err(ApiError::unauthorized_with_code(
            "TOKEN_REVOKED",
            "Token has been revoked.",
        ));
    }

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
