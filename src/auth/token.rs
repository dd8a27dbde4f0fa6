use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Role, User};

/// Claims carried by a signed access token. Self-contained: verification
/// alone never touches the stores. Callers wanting live-revocation semantics
/// must compare `token_version` against the current user record themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    pub role: Role,
    /// Owner's token_version at issuance; stale values mean the token was revoked
    pub token_version: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    Invalid(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("JWT secret not configured")]
    MissingSecret,
}

/// Encode a signed access token for the user (HS256)
pub fn issue(user: &User, secret: &[u8], ttl_secs: i64) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        role: user.role,
        token_version: user.token_version,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| TokenError::Invalid(e.to_string()))
}

/// Verify signature and expiry, returning the decoded claims
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let validation = Validation::default();
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::Json(_)
            | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => {
                TokenError::Malformed(e.to_string())
            }
            _ => TokenError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"unit-test-secret";

    fn test_user(token_version: i32) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Editor,
            is_active: true,
            token_version,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let user = test_user(3);
        let token = issue(&user, SECRET, 900).unwrap();
        let claims = verify(&token, SECRET).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.token_version, 3);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let user = test_user(0);
        // Past the default verification leeway
        let token = issue(&user, SECRET, -3600).unwrap();
        assert!(matches!(verify(&token, SECRET), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_is_rejected_as_invalid() {
        let user = test_user(0);
        let token = issue(&user, SECRET, 900).unwrap();
        assert!(matches!(
            verify(&token, b"some-other-secret"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_rejected_as_invalid() {
        assert!(matches!(
            verify("not-a-jwt-at-all", SECRET),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn missing_claims_are_rejected_as_malformed() {
        // Sign a structurally valid JWT that lacks the role/token_version claims
        #[derive(Serialize)]
        struct Partial {
            sub: Uuid,
            iat: i64,
            exp: i64,
        }
        let now = Utc::now().timestamp();
        let partial = Partial { sub: Uuid::new_v4(), iat: now, exp: now + 900 };
        let token = encode(&Header::default(), &partial, &EncodingKey::from_secret(SECRET)).unwrap();

        assert!(matches!(verify(&token, SECRET), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn empty_secret_never_signs_or_verifies() {
        let user = test_user(0);
        assert!(matches!(issue(&user, b"", 900), Err(TokenError::MissingSecret)));
        assert!(matches!(verify("x.y.z", b""), Err(TokenError::MissingSecret)));
    }
}
