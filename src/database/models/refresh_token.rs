use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Server-tracked half of a session. Only the SHA-256 hash of the raw token
/// value is persisted; the raw value is handed to the caller exactly once.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Snapshot of the owner's token_version at issuance
    #[serde(skip_serializing)]
    pub token_version: i32,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Column list matching the `FromRow` fields
    pub const COLUMNS: &'static str =
        "id, user_id, token_hash, token_version, expires_at, ip_address, user_agent, created_at";

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A refresh token is valid iff it has not expired and its version
    /// snapshot still matches the owner's live token_version.
    pub fn is_valid(&self, current_token_version: i32, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.token_version == current_token_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in_secs: i64, token_version: i32) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "deadbeef".to_string(),
            token_version,
            expires_at: now + Duration::seconds(expires_in_secs),
            ip_address: None,
            user_agent: None,
            created_at: now,
        }
    }

    #[test]
    fn valid_when_fresh_and_version_matches() {
        let rt = token(3600, 0);
        assert!(rt.is_valid(0, Utc::now()));
    }

    #[test]
    fn invalid_when_expired_even_if_version_matches() {
        let rt = token(-1, 0);
        assert!(rt.is_expired(Utc::now()));
        assert!(!rt.is_valid(0, Utc::now()));
    }

    #[test]
    fn invalid_when_version_behind_even_if_fresh() {
        let rt = token(3600, 0);
        assert!(!rt.is_valid(1, Utc::now()));
    }

    #[test]
    fn hash_and_version_stay_out_of_json() {
        let rt = token(3600, 0);
        let json = serde_json::to_value(&rt).unwrap();
        assert!(json.get("token_hash").is_none());
        assert!(json.get("token_version").is_none());
        assert!(json.get("expires_at").is_some());
    }
}
