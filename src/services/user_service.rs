use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password;
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Role, User};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    OwnAccount(String),

    #[error("Email already in use")]
    EmailTaken,

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Fields for a new account created by an admin
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
}

/// Partial account update; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RoleCounts {
    pub admin: i64,
    pub editor: i64,
    pub viewer: i64,
}

#[derive(Debug, Serialize)]
pub struct UserStatistics {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub users_by_role: RoleCounts,
    pub recently_created: i64,
    pub soft_deleted: i64,
}

/// Account administration: CRUD plus the tombstone lifecycle
/// (soft delete, restore, permanent purge).
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List accounts, newest first. Tombstoned rows are excluded unless
    /// explicitly requested.
    pub async fn list(&self, include_deleted: bool) -> Result<Vec<User>, UserError> {
        let sql = if include_deleted {
            format!("SELECT {} FROM users ORDER BY created_at DESC", User::COLUMNS)
        } else {
            format!(
                "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY created_at DESC",
                User::COLUMNS
            )
        };
        let users = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, UserError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            User::COLUMNS
        );
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or(UserError::NotFound)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, UserError> {
        let password_hash =
            password::hash_password(&new_user.password, config::config().security.bcrypt_cost)
                .map_err(|e| UserError::Hash(e.to_string()))?;

        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            User::COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&password_hash)
            .bind(new_user.role)
            .bind(new_user.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_unique_email)
    }

    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, UserError> {
        let user = self.get(id).await?;

        let name = changes.name.unwrap_or(user.name);
        let email = changes.email.unwrap_or(user.email);
        let role = changes.role.unwrap_or(user.role);
        let is_active = changes.is_active.unwrap_or(user.is_active);
        let password_hash = match changes.password {
            Some(password) => {
                password::hash_password(&password, config::config().security.bcrypt_cost)
                    .map_err(|e| UserError::Hash(e.to_string()))?
            }
            None => user.password_hash,
        };

        let sql = format!(
            "UPDATE users SET name = $1, email = $2, password_hash = $3, role = $4, \
                    is_active = $5, updated_at = now() \
             WHERE id = $6 RETURNING {}",
            User::COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&name)
            .bind(&email)
            .bind(&password_hash)
            .bind(role)
            .bind(is_active)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_unique_email)
    }

    /// Soft delete: set the tombstone, keep the row for restore
    pub async fn delete(&self, acting_user_id: Uuid, id: Uuid) -> Result<(), UserError> {
        if acting_user_id == id {
            return Err(UserError::OwnAccount(
                "You cannot delete your own account".to_string(),
            ));
        }

        let result =
            sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    /// Clear the tombstone on a soft-deleted account
    pub async fn restore(&self, id: Uuid) -> Result<User, UserError> {
        let sql = format!(
            "UPDATE users SET deleted_at = NULL, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NOT NULL RETURNING {}",
            User::COLUMNS
        );
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or(UserError::NotFound)
    }

    /// Permanently remove an account, tombstoned or not. Cascades to the
    /// account's refresh tokens.
    pub async fn force_delete(&self, acting_user_id: Uuid, id: Uuid) -> Result<(), UserError> {
        if acting_user_id == id {
            return Err(UserError::OwnAccount(
                "You cannot delete your own account".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    pub async fn toggle_status(&self, acting_user_id: Uuid, id: Uuid) -> Result<User, UserError> {
        if acting_user_id == id {
            return Err(UserError::OwnAccount(
                "You cannot deactivate your own account".to_string(),
            ));
        }

        let sql = format!(
            "UPDATE users SET is_active = NOT is_active, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            User::COLUMNS
        );
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or(UserError::NotFound)
    }

    pub async fn change_role(
        &self,
        acting_user_id: Uuid,
        id: Uuid,
        role: Role,
    ) -> Result<User, UserError> {
        if acting_user_id == id {
            return Err(UserError::OwnAccount(
                "You cannot change your own role".to_string(),
            ));
        }

        let sql = format!(
            "UPDATE users SET role = $1, updated_at = now() \
             WHERE id = $2 AND deleted_at IS NULL RETURNING {}",
            User::COLUMNS
        );
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(role)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or(UserError::NotFound)
    }

    pub async fn statistics(&self) -> Result<UserStatistics, UserError> {
        let row: (i64, i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
                count(*) FILTER (WHERE deleted_at IS NULL), \
                count(*) FILTER (WHERE deleted_at IS NULL AND is_active), \
                count(*) FILTER (WHERE deleted_at IS NULL AND NOT is_active), \
                count(*) FILTER (WHERE deleted_at IS NULL AND role = 'ADMIN'), \
                count(*) FILTER (WHERE deleted_at IS NULL AND role = 'EDITOR'), \
                count(*) FILTER (WHERE deleted_at IS NULL AND role = 'VIEWER'), \
                count(*) FILTER (WHERE deleted_at IS NULL AND created_at >= now() - interval '7 days'), \
                count(*) FILTER (WHERE deleted_at IS NOT NULL) \
             FROM users",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStatistics {
            total_users: row.0,
            active_users: row.1,
            inactive_users: row.2,
            users_by_role: RoleCounts { admin: row.3, editor: row.4, viewer: row.5 },
            recently_created: row.6,
            soft_deleted: row.7,
        })
    }

    /// Soft delete several accounts at once, skipping the acting user's own
    pub async fn bulk_delete(
        &self,
        acting_user_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, UserError> {
        let ids: Vec<Uuid> = user_ids.iter().copied().filter(|id| *id != acting_user_id).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE users SET deleted_at = now() WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(&ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Activate or deactivate several accounts, skipping the acting user's own
    pub async fn bulk_update_status(
        &self,
        acting_user_id: Uuid,
        user_ids: &[Uuid],
        is_active: bool,
    ) -> Result<u64, UserError> {
        let ids: Vec<Uuid> = user_ids.iter().copied().filter(|id| *id != acting_user_id).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE users SET is_active = $1, updated_at = now() \
             WHERE id = ANY($2) AND deleted_at IS NULL",
        )
        .bind(is_active)
        .bind(&ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Create the initial admin account when the users table is empty and the
    /// bootstrap environment variables are present
    pub async fn bootstrap_admin(&self) -> Result<Option<User>, UserError> {
        let (Ok(email), Ok(bootstrap_password)) = (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) else {
            return Ok(None);
        };

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        if count.0 > 0 {
            return Ok(None);
        }

        let admin = self
            .create(NewUser {
                name: "Administrator".to_string(),
                email,
                password: bootstrap_password,
                role: Role::Admin,
                is_active: true,
            })
            .await?;

        tracing::info!("Bootstrapped initial admin account {}", admin.email);
        Ok(Some(admin))
    }

    fn map_unique_email(e: sqlx::Error) -> UserError {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => UserError::EmailTaken,
            _ => UserError::Database(e),
        }
    }
}
