use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{password, token, AuthError};
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{RefreshToken, User};

/// Random alphanumeric characters in a raw refresh token (~380 bits of entropy)
const REFRESH_TOKEN_LENGTH: usize = 64;

/// Diagnostic metadata recorded with each session
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Token pair handed out at login. The raw refresh token appears here once
/// and is never recoverable afterwards.
#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Token pair handed out at refresh
#[derive(Debug, Serialize)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Session manager: owns login, refresh-token rotation, and revocation.
///
/// All shared mutable state lives in the users and refresh_tokens tables;
/// every mutation goes through single-statement atomic operations or a
/// short transaction, never through in-process caches.
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Authenticate with email + password and open a new session.
    ///
    /// Unknown email and wrong password are deliberately indistinguishable
    /// to the caller.
    pub async fn login(
        &self,
        email: &str,
        password_input: &str,
        device: DeviceInfo,
    ) -> Result<SessionTokens, AuthError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL", User::COLUMNS);
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let user = user.ok_or(AuthError::InvalidCredentials)?;

        let password_matches = password::verify_password(password_input, &user.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !password_matches {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let security = &config::config().security;
        let access_token = token::issue(
            &user,
            security.jwt_secret.as_bytes(),
            security.access_token_ttl_secs,
        )?;

        let raw_refresh = generate_refresh_token();
        let expires_at = Utc::now() + Duration::days(security.refresh_token_ttl_days);
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, token_version, expires_at, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(hash_refresh_token(&raw_refresh))
        .bind(user.token_version)
        .bind(expires_at)
        .bind(&device.ip_address)
        .bind(&device.user_agent)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Opened session for user {}", user.id);

        Ok(SessionTokens {
            access_token,
            refresh_token: raw_refresh,
            token_type: "Bearer",
            expires_in: security.access_token_ttl_secs,
            user,
        })
    }

    /// Redeem a refresh token for a new token pair (single-use rotation).
    ///
    /// The consumed row is locked `FOR UPDATE` inside one transaction, so of
    /// two concurrent redemptions exactly one wins; the loser finds the row
    /// gone and gets `InvalidRefreshToken`. The replacement is inserted
    /// before the consumed row is deleted and both changes land on commit,
    /// so a crash mid-rotation rolls back to the old token rather than
    /// leaving the user with none.
    pub async fn refresh(&self, raw_refresh: &str) -> Result<RefreshedTokens, AuthError> {
        let token_hash = hash_refresh_token(raw_refresh);

        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM refresh_tokens WHERE token_hash = $1 FOR UPDATE", RefreshToken::COLUMNS);
        let consumed: Option<RefreshToken> = sqlx::query_as(&sql)
            .bind(&token_hash)
            .fetch_optional(&mut *tx)
            .await?;

        let consumed = consumed.ok_or(AuthError::InvalidRefreshToken)?;

        let sql = format!("SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL", User::COLUMNS);
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(consumed.user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let user = user.ok_or(AuthError::UserNotFound)?;

        if !consumed.is_valid(user.token_version, Utc::now()) {
            return Err(AuthError::RefreshTokenRevokedOrExpired);
        }

        let security = &config::config().security;
        let access_token = token::issue(
            &user,
            security.jwt_secret.as_bytes(),
            security.access_token_ttl_secs,
        )?;

        let raw_replacement = generate_refresh_token();
        let expires_at = Utc::now() + Duration::days(security.refresh_token_ttl_days);
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, token_version, expires_at, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(hash_refresh_token(&raw_replacement))
        .bind(user.token_version)
        .bind(expires_at)
        .bind(&consumed.ip_address)
        .bind(&consumed.user_agent)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(consumed.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Rotated refresh token for user {}", user.id);

        Ok(RefreshedTokens {
            access_token,
            refresh_token: raw_replacement,
            token_type: "Bearer",
            expires_in: security.access_token_ttl_secs,
        })
    }

    /// Close one session by deleting its refresh token. Idempotent: deleting
    /// a token that no longer exists is not an error. The outstanding access
    /// token stays valid until its natural expiry.
    pub async fn logout(&self, user_id: Uuid, raw_refresh: Option<&str>) -> Result<(), AuthError> {
        if let Some(raw) = raw_refresh {
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(hash_refresh_token(raw))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Revoke every session: bump token_version (invalidating outstanding
    /// access tokens on their next live check) and drop all refresh tokens.
    pub async fn logout_all(&self, user_id: Uuid) -> Result<(), AuthError> {
        let mut tx = self.pool.begin().await?;

        // Single-statement increment; concurrent readers either see the old
        // value (and their tokens die at the next comparison) or the new one
        sqlx::query("UPDATE users SET token_version = token_version + 1, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Revoked all sessions for user {}", user_id);
        Ok(())
    }

    /// Current user plus their active sessions
    pub async fn profile(&self, user_id: Uuid) -> Result<(User, Vec<RefreshToken>), AuthError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL", User::COLUMNS);
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let user = user.ok_or(AuthError::UserNotFound)?;

        let sql = format!(
            "SELECT {} FROM refresh_tokens WHERE user_id = $1 ORDER BY created_at DESC",
            RefreshToken::COLUMNS
        );
        let sessions: Vec<RefreshToken> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok((user, sessions))
    }

    /// Apply a partial profile update to the current user
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, AuthError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL", User::COLUMNS);
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let user = user.ok_or(AuthError::UserNotFound)?;

        let name = changes.name.unwrap_or(user.name);
        let email = changes.email.unwrap_or(user.email);
        let password_hash = match changes.password {
            Some(password) => {
                password::hash_password(&password, config::config().security.bcrypt_cost)
                    .map_err(|e| AuthError::Hash(e.to_string()))?
            }
            None => user.password_hash,
        };

        let sql = format!(
            "UPDATE users SET name = $1, email = $2, password_hash = $3, updated_at = now() \
             WHERE id = $4 RETURNING {}",
            User::COLUMNS
        );
        let updated: User = sqlx::query_as(&sql)
            .bind(&name)
            .bind(&email)
            .bind(&password_hash)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
                _ => AuthError::Database(e),
            })?;

        Ok(updated)
    }
}

/// Generate a cryptographically random raw refresh-token value
fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// One-way hash applied before a refresh token touches storage
fn hash_refresh_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
