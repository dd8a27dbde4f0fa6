// Authentication and session lifecycle: access-token codec, password
// hashing, and the session manager that owns refresh-token rotation.

pub mod password;
pub mod service;
pub mod token;

pub use service::{AuthService, DeviceInfo, RefreshedTokens, SessionTokens};
pub use token::Claims;

use thiserror::Error;

/// Session-lifecycle failures. Everything except `Hash` and `Database` is a
/// routine outcome surfaced to the caller as a 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token has been revoked or expired")]
    RefreshTokenRevokedOrExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("This email is already in use")]
    EmailTaken,

    #[error(transparent)]
    Token(#[from] token::TokenError),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
