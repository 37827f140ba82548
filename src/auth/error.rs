use thiserror::Error;

use super::{jwt::TokenError, password::PasswordError};
use crate::users::repo::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email and wrong password are deliberately the same variant.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        }
    }
}
