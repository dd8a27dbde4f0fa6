use axum::{extract::Path, Json};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::models::{Category, CategoryType};
use crate::handlers::validation::FieldErrors;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::category_service::{CategoryChanges, NewCategory};
use crate::services::CategoryService;

/// GET /api/categories
pub async fn index() -> ApiResult<Vec<Category>> {
    let service = CategoryService::new().await?;
    let categories = service.list().await?;
    Ok(ApiResponse::success(categories, "Categories retrieved successfully"))
}

/// GET /api/categories/:id
pub async fn show(Path(id): Path<Uuid>) -> ApiResult<Category> {
    let service = CategoryService::new().await?;
    let category = service.get(id).await?;
    Ok(ApiResponse::success(category, "Category retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn validate_name(errors: &mut FieldErrors, name: Option<&str>, required: bool) {
    match name {
        None | Some("") if required => errors.add("name", "Name is required."),
        Some(name) if name.len() > 255 => errors.add("name", "Name cannot exceed 255 characters."),
        _ => {}
    }
}

fn parse_type(errors: &mut FieldErrors, value: Option<&str>, required: bool) -> Option<CategoryType> {
    match value {
        None | Some("") => {
            if required {
                errors.add("type", "Type is required. Allowed values: article, video.");
            }
            None
        }
        Some(value) => match CategoryType::from_str(value) {
            Ok(t) => Some(t),
            Err(_) => {
                errors.add("type", "The selected type is invalid. Allowed values: article, video.");
                None
            }
        },
    }
}

/// POST /api/categories
pub async fn store(Json(payload): Json<CategoryRequest>) -> ApiResult<Category> {
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, payload.name.as_deref(), true);
    let category_type = parse_type(&mut errors, payload.category_type.as_deref(), true);
    errors.into_result()?;
    let category_type = category_type
        .ok_or_else(|| crate::error::ApiError::bad_request("Type is required."))?;

    let service = CategoryService::new().await?;
    let category = service
        .create(NewCategory {
            name: payload.name.unwrap_or_default(),
            slug: payload.slug.filter(|s| !s.is_empty()),
            description: payload.description,
            category_type,
            sort_order: payload.sort_order.unwrap_or(0),
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;

    Ok(ApiResponse::created(category, "Category created successfully"))
}

/// PUT /api/categories/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> ApiResult<Category> {
    let mut errors = FieldErrors::new();
    validate_name(&mut errors, payload.name.as_deref(), false);
    let category_type = parse_type(&mut errors, payload.category_type.as_deref(), false);
    errors.into_result()?;

    let service = CategoryService::new().await?;
    let category = service
        .update(
            id,
            CategoryChanges {
                name: payload.name.filter(|s| !s.is_empty()),
                slug: payload.slug.filter(|s| !s.is_empty()),
                description: payload.description,
                category_type,
                sort_order: payload.sort_order,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(ApiResponse::success(category, "Category updated successfully"))
}

/// DELETE /api/categories/:id
pub async fn destroy(Path(id): Path<Uuid>) -> ApiResult<()> {
    let service = CategoryService::new().await?;
    service.delete(id).await?;
    Ok(ApiResponse::message_only("Category deleted successfully"))
}

/// POST /api/categories/:id/toggle-status
pub async fn toggle_status(Path(id): Path<Uuid>) -> ApiResult<Category> {
    let service = CategoryService::new().await?;
    let category = service.toggle_status(id).await?;
    Ok(ApiResponse::success(category, "Category status updated successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ReorderItem {
    pub id: Uuid,
    pub order: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub categories: Option<Vec<ReorderItem>>,
}

/// PUT /api/categories/reorder
pub async fn reorder(Json(payload): Json<ReorderRequest>) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    let items = payload.categories.unwrap_or_default();
    if items.is_empty() {
        errors.add("categories", "Categories array is required.");
    }
    if items.iter().any(|item| item.order < 0) {
        errors.add("categories", "Order must be zero or greater for each category.");
    }
    errors.into_result()?;

    let orders: Vec<(Uuid, i32)> = items.into_iter().map(|item| (item.id, item.order)).collect();

    let service = CategoryService::new().await?;
    service.reorder(&orders).await?;

    Ok(ApiResponse::message_only("Categories reordered successfully"))
}
