use axum::{extract::Request, middleware::Next, response::Response};

use super::validate_user::CurrentUser;
use crate::database::models::{Role, User};
use crate::error::ApiError;

/// Authorization gate: allow iff the resolved identity carries one of the
/// acceptable roles. Fails closed - no identity is rejected as
/// `AUTHENTICATION_REQUIRED` before any role comparison happens, distinct
/// from the `PERMISSION_DENIED` raised on a role mismatch.
pub fn authorize(identity: Option<&User>, required_roles: &[Role]) -> Result<(), ApiError> {
    let user = identity.ok_or_else(ApiError::authentication_required)?;

    if required_roles.contains(&user.role) {
        Ok(())
    } else {
        tracing::debug!(
            "Denied user {} ({}) - requires one of {:?}",
            user.id,
            user.role,
            required_roles
        );
        Err(ApiError::permission_denied())
    }
}

/// Middleware wrapper over `authorize` for a route group
pub async fn check_role(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request.extensions().get::<CurrentUser>().map(|c| &c.0);
    authorize(identity, allowed)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Gate Test".to_string(),
            email: "gate@example.com".to_string(),
            password_hash: String::new(),
            role,
            is_active: true,
            token_version: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn allows_matching_role() {
        let admin = user_with_role(Role::Admin);
        assert!(authorize(Some(&admin), &[Role::Admin]).is_ok());
        assert!(authorize(Some(&admin), &[Role::Admin, Role::Editor]).is_ok());
    }

    #[test]
    fn editor_is_denied_admin_routes() {
        let editor = user_with_role(Role::Editor);
        let err = authorize(Some(&editor), &[Role::Admin]).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
    }

    #[test]
    fn missing_identity_is_rejected_before_role_comparison() {
        let err = authorize(None, &[Role::Admin]).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), "AUTHENTICATION_REQUIRED");

        // Fails closed even when the role set could never match
        let err = authorize(None, &[]).unwrap_err();
        assert_eq!(err.error_code(), "AUTHENTICATION_REQUIRED");
    }
}
