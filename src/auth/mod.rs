//! Bearer-token authentication: JWT issuance/verification, password
//! hashing, and a process-local cache of already-authenticated tokens.

pub mod cache;
pub mod check;
pub mod jwt;
pub mod password;

pub use cache::{CachedAuth, TokenCache};
pub use check::AuthCheck;
pub use jwt::{Token, TokenResponse};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing, invalid, or expired token")]
    InvalidToken,
    #[error("wrong login or password")]
    WrongCredentials,
    #[error("failed to encode token")]
    TokenEncoding,
    #[error("failed to hash or verify password")]
    Hashing,
}

impl From<AuthError> for crate::errors::AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::WrongCredentials => crate::errors::AppError::Unauthorized,
            AuthError::TokenEncoding | AuthError::Hashing => {
                crate::errors::AppError::Internal(anyhow::anyhow!(err))
            }
        }
    }
}
