use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::models::{Role, User};
use crate::handlers::validation::{is_strong_password, is_valid_email, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::user_service::{NewUser, UserChanges, UserStatistics};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Include tombstoned accounts (for restore/purge workflows)
    #[serde(default)]
    pub include_deleted: bool,
}

/// GET /api/users
pub async fn index(Query(query): Query<ListQuery>) -> ApiResult<Vec<User>> {
    let service = UserService::new().await?;
    let users = service.list(query.include_deleted).await?;
    Ok(ApiResponse::success(users, "Users retrieved successfully"))
}

/// GET /api/users/:id
pub async fn show(Path(id): Path<Uuid>) -> ApiResult<User> {
    let service = UserService::new().await?;
    let user = service.get(id).await?;
    Ok(ApiResponse::success(user, "User retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// POST /api/users
pub async fn store(Json(payload): Json<CreateUserRequest>) -> ApiResult<User> {
    let mut errors = FieldErrors::new();

    match payload.name.as_deref() {
        None | Some("") => errors.add("name", "Name is required."),
        Some(name) if name.len() > 255 => errors.add("name", "Name cannot exceed 255 characters."),
        _ => {}
    }

    match payload.email.as_deref() {
        None | Some("") => errors.add("email", "Email address is required."),
        Some(email) if !is_valid_email(email) => {
            errors.add("email", "Please provide a valid email address.")
        }
        _ => {}
    }

    match payload.password.as_deref() {
        None | Some("") => errors.add("password", "Password is required."),
        Some(password) if !is_strong_password(password) => errors.add(
            "password",
            "Password must be at least 8 characters with mixed case and numbers.",
        ),
        _ => {}
    }

    let role = match payload.role.as_deref() {
        None => Role::Viewer,
        Some(value) => Role::from_str(value).unwrap_or_else(|_| {
            errors.add("role", "The selected role is invalid. Allowed values: ADMIN, EDITOR, VIEWER.");
            Role::Viewer
        }),
    };

    errors.into_result()?;

    let service = UserService::new().await?;
    let user = service
        .create(NewUser {
            name: payload.name.unwrap_or_default(),
            email: payload.email.unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
            role,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;

    Ok(ApiResponse::created(user, "User created successfully"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// PUT /api/users/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
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
    }

    let role = match payload.role.as_deref() {
        None => None,
        Some(value) => match Role::from_str(value) {
            Ok(role) => Some(role),
            Err(_) => {
                errors.add("role", "The selected role is invalid. Allowed values: ADMIN, EDITOR, VIEWER.");
                None
            }
        },
    };

    errors.into_result()?;

    let service = UserService::new().await?;
    let user = service
        .update(
            id,
            UserChanges {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(ApiResponse::success(user, "User updated successfully"))
}

/// DELETE /api/users/:id (soft delete)
pub async fn destroy(
    Extension(CurrentUser(acting)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let service = UserService::new().await?;
    service.delete(acting.id, id).await?;
    Ok(ApiResponse::message_only("User deleted successfully"))
}

/// POST /api/users/:id/restore
pub async fn restore(Path(id): Path<Uuid>) -> ApiResult<User> {
    let service = UserService::new().await?;
    let user = service.restore(id).await?;
    Ok(ApiResponse::success(user, "User restored successfully"))
}

/// DELETE /api/users/:id/force (permanent)
pub async fn force_destroy(
    Extension(CurrentUser(acting)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let service = UserService::new().await?;
    service.force_delete(acting.id, id).await?;
    Ok(ApiResponse::message_only("User permanently deleted"))
}

/// POST /api/users/:id/toggle-status
pub async fn toggle_status(
    Extension(CurrentUser(acting)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    let service = UserService::new().await?;
    let user = service.toggle_status(acting.id, id).await?;
    Ok(ApiResponse::success(user, "User status updated successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Option<String>,
}

/// PUT /api/users/:id/role
pub async fn change_role(
    Extension(CurrentUser(acting)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<User> {
    let mut errors = FieldErrors::new();

    let role = match payload.role.as_deref() {
        None | Some("") => {
            errors.add("role", "Role field is required.");
            None
        }
        // Promotion targets are staff roles only
        Some("ADMIN") => Some(Role::Admin),
        Some("EDITOR") => Some(Role::Editor),
        Some(_) => {
            errors.add("role", "The selected role is invalid. Allowed values: ADMIN, EDITOR.");
            None
        }
    };

    errors.into_result()?;
    let role = role.ok_or_else(|| crate::error::ApiError::bad_request("Role field is required."))?;

    let service = UserService::new().await?;
    let user = service.change_role(acting.id, id, role).await?;
    Ok(ApiResponse::success(user, "User role changed successfully"))
}

/// GET /api/users/statistics
pub async fn statistics() -> ApiResult<UserStatistics> {
    let service = UserService::new().await?;
    let stats = service.statistics().await?;
    Ok(ApiResponse::success(stats, "Statistics retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub user_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, serde::Serialize)]
pub struct BulkDeleteData {
    pub deleted_count: u64,
}

/// POST /api/users/bulk-delete
pub async fn bulk_delete(
    Extension(CurrentUser(acting)): Extension<CurrentUser>,
    Json(payload): Json<BulkDeleteRequest>,
) -> ApiResult<BulkDeleteData> {
    let mut errors = FieldErrors::new();
    let user_ids = payload.user_ids.unwrap_or_default();
    if user_ids.is_empty() {
        errors.add("user_ids", "At least one user ID is required.");
    }
    errors.into_result()?;

    let service = UserService::new().await?;
    let deleted_count = service.bulk_delete(acting.id, &user_ids).await?;

    Ok(ApiResponse::success(
        BulkDeleteData { deleted_count },
        format!("{} user(s) deleted successfully", deleted_count),
    ))
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub user_ids: Option<Vec<Uuid>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, serde::Serialize)]
pub struct BulkStatusData {
    pub updated_count: u64,
}

/// POST /api/users/bulk-update-status
pub async fn bulk_update_status(
    Extension(CurrentUser(acting)): Extension<CurrentUser>,
    Json(payload): Json<BulkStatusRequest>,
) -> ApiResult<BulkStatusData> {
    let mut errors = FieldErrors::new();
    let user_ids = payload.user_ids.unwrap_or_default();
    if user_ids.is_empty() {
        errors.add("user_ids", "At least one user ID is required.");
    }
    if payload.is_active.is_none() {
        errors.add("is_active", "Active status is required.");
    }
    errors.into_result()?;
    let is_active = payload
        .is_active
        .ok_or_else(|| crate::error::ApiError::bad_request("Active status is required."))?;

    let service = UserService::new().await?;
    let updated_count = service
        .bulk_update_status(acting.id, &user_ids, is_active)
        .await?;

    Ok(ApiResponse::success(
        BulkStatusData { updated_count },
        format!("{} user(s) updated successfully", updated_count),
    ))
}
