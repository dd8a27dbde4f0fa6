use sqlx::PgPool;
use uuid::Uuid;

use super::slugify;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Category, CategoryType};

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    NotFound,

    #[error("Slug already in use: {0}")]
    SlugTaken(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_type: CategoryType,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Partial category update; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_type: Option<CategoryType>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all categories in display order
    pub async fn list(&self) -> Result<Vec<Category>, CategoryError> {
        let sql = format!(
            "SELECT {} FROM categories ORDER BY sort_order ASC, created_at ASC",
            Category::COLUMNS
        );
        let categories = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(categories)
    }

    pub async fn get(&self, id: Uuid) -> Result<Category, CategoryError> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", Category::COLUMNS);
        let category: Option<Category> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        category.ok_or(CategoryError::NotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, CategoryError> {
        let sql = format!("SELECT {} FROM categories WHERE slug = $1", Category::COLUMNS);
        let category: Option<Category> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        category.ok_or(CategoryError::NotFound)
    }

    pub async fn create(&self, new_category: NewCategory) -> Result<Category, CategoryError> {
        let slug = new_category
            .slug
            .unwrap_or_else(|| slugify(&new_category.name));

        let sql = format!(
            "INSERT INTO categories (name, slug, description, category_type, sort_order, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            Category::COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&new_category.name)
            .bind(&slug)
            .bind(&new_category.description)
            .bind(new_category.category_type)
            .bind(new_category.sort_order)
            .bind(new_category.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_unique_slug(e, &slug))
    }

    pub async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Category, CategoryError> {
        let category = self.get(id).await?;

        // Regenerate the slug when the name changes and no explicit slug came in
        let slug = match (&changes.slug, &changes.name) {
            (Some(slug), _) => slug.clone(),
            (None, Some(name)) if *name != category.name => slugify(name),
            _ => category.slug,
        };
        let name = changes.name.unwrap_or(category.name);
        let description = changes.description.or(category.description);
        let category_type = changes.category_type.unwrap_or(category.category_type);
        let sort_order = changes.sort_order.unwrap_or(category.sort_order);
        let is_active = changes.is_active.unwrap_or(category.is_active);

        let sql = format!(
            "UPDATE categories SET name = $1, slug = $2, description = $3, category_type = $4, \
                    sort_order = $5, is_active = $6, updated_at = now() \
             WHERE id = $7 RETURNING {}",
            Category::COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&name)
            .bind(&slug)
            .bind(&description)
            .bind(category_type)
            .bind(sort_order)
            .bind(is_active)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_unique_slug(e, &slug))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CategoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CategoryError::NotFound);
        }
        Ok(())
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Category, CategoryError> {
        let sql = format!(
            "UPDATE categories SET is_active = NOT is_active, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            Category::COLUMNS
        );
        let category: Option<Category> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        category.ok_or(CategoryError::NotFound)
    }

    /// Apply a new display order to the given categories in one transaction
    pub async fn reorder(&self, orders: &[(Uuid, i32)]) -> Result<(), CategoryError> {
        let mut tx = self.pool.begin().await?;

        for (id, sort_order) in orders {
            sqlx::query("UPDATE categories SET sort_order = $1, updated_at = now() WHERE id = $2")
                .bind(sort_order)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    fn map_unique_slug(e: sqlx::Error, slug: &str) -> CategoryError {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CategoryError::SlugTaken(slug.to_string())
            }
            _ => CategoryError::Database(e),
        }
    }
}
