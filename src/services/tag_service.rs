use sqlx::PgPool;
use uuid::Uuid;

use super::slugify;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Tag;

/// Fallback badge color for new tags
const DEFAULT_TAG_COLOR: &str = "#3B82F6";

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("Tag not found")]
    NotFound,

    #[error("Slug already in use: {0}")]
    SlugTaken(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct NewTag {
    pub name: String,
    pub slug: Option<String>,
    pub color: Option<String>,
}

/// Partial tag update; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct TagChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
}

pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, TagError> {
        let sql = format!("SELECT {} FROM tags ORDER BY name ASC", Tag::COLUMNS);
        let tags = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(tags)
    }

    pub async fn get(&self, id: Uuid) -> Result<Tag, TagError> {
        let sql = format!("SELECT {} FROM tags WHERE id = $1", Tag::COLUMNS);
        let tag: Option<Tag> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        tag.ok_or(TagError::NotFound)
    }

    pub async fn create(&self, new_tag: NewTag) -> Result<Tag, TagError> {
        let slug = new_tag.slug.unwrap_or_else(|| slugify(&new_tag.name));
        let color = new_tag.color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string());

        let sql = format!(
            "INSERT INTO tags (name, slug, color) VALUES ($1, $2, $3) RETURNING {}",
            Tag::COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&new_tag.name)
            .bind(&slug)
            .bind(&color)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_unique_slug(e, &slug))
    }

    pub async fn update(&self, id: Uuid, changes: TagChanges) -> Result<Tag, TagError> {
        let tag = self.get(id).await?;

        // Regenerate the slug when the name changes and no explicit slug came in
        let slug = match (&changes.slug, &changes.name) {
            (Some(slug), _) => slug.clone(),
            (None, Some(name)) if *name != tag.name => slugify(name),
            _ => tag.slug,
        };
        let name = changes.name.unwrap_or(tag.name);
        let color = changes.color.unwrap_or(tag.color);

        let sql = format!(
            "UPDATE tags SET name = $1, slug = $2, color = $3, updated_at = now() \
             WHERE id = $4 RETURNING {}",
            Tag::COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&name)
            .bind(&slug)
            .bind(&color)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_unique_slug(e, &slug))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), TagError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TagError::NotFound);
        }
        Ok(())
    }

    fn map_unique_slug(e: sqlx::Error, slug: &str) -> TagError {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TagError::SlugTaken(slug.to_string())
            }
            _ => TagError::Database(e),
        }
    }
}
