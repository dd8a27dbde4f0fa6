use axum::{extract::Path, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Tag;
use crate::handlers::validation::{is_valid_hex_color, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tag_service::{NewTag, TagChanges};
use crate::services::TagService;

/// GET /api/tags
pub async fn index() -> ApiResult<Vec<Tag>> {
    let service = TagService::new().await?;
    let tags = service.list().await?;
    Ok(ApiResponse::success(tags, "Tags retrieved successfully"))
}

/// GET /api/tags/:id
pub async fn show(Path(id): Path<Uuid>) -> ApiResult<Tag> {
    let service = TagService::new().await?;
    let tag = service.get(id).await?;
    Ok(ApiResponse::success(tag, "Tag retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
}

fn validate_tag(errors: &mut FieldErrors, payload: &TagRequest, name_required: bool) {
    match payload.name.as_deref() {
        None | Some("") if name_required => errors.add("name", "Name is required."),
        Some(name) if name.len() > 100 => errors.add("name", "Name cannot exceed 100 characters."),
        _ => {}
    }

    if let Some(color) = payload.color.as_deref() {
        if !color.is_empty() && !is_valid_hex_color(color) {
            errors.add("color", "Color must be a hex value like #3B82F6.");
        }
    }
}

/// POST /api/tags
pub async fn store(Json(payload): Json<TagRequest>) -> ApiResult<Tag> {
    let mut errors = FieldErrors::new();
    validate_tag(&mut errors, &payload, true);
    errors.into_result()?;

    let service = TagService::new().await?;
    let tag = service
        .create(NewTag {
            name: payload.name.unwrap_or_default(),
            slug: payload.slug.filter(|s| !s.is_empty()),
            color: payload.color.filter(|c| !c.is_empty()),
        })
        .await?;

    Ok(ApiResponse::created(tag, "Tag created successfully"))
}

/// PUT /api/tags/:id
pub async fn update(Path(id): Path<Uuid>, Json(payload): Json<TagRequest>) -> ApiResult<Tag> {
    let mut errors = FieldErrors::new();
    validate_tag(&mut errors, &payload, false);
    errors.into_result()?;

    let service = TagService::new().await?;
    let tag = service
        .update(
            id,
            TagChanges {
                name: payload.name.filter(|s| !s.is_empty()),
                slug: payload.slug.filter(|s| !s.is_empty()),
                color: payload.color.filter(|c| !c.is_empty()),
            },
        )
        .await?;

    Ok(ApiResponse::success(tag, "Tag updated successfully"))
}

/// DELETE /api/tags/:id
pub async fn destroy(Path(id): Path<Uuid>) -> ApiResult<()> {
    let service = TagService::new().await?;
    service.delete(id).await?;
    Ok(ApiResponse::message_only("Tag deleted successfully"))
}
