use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::{
    broadcast::BroadcastError, password::PasswordHasherError, storage::StorageError,
    token::TokenError,
};

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),
    /// 缺少或格式错误的凭证
    #[error("authentication failed: {0}")]
    Authentication(String),
}

impl ApplicationError {
    pub fn authentication(message: impl Into<String>) -> Self {
        ApplicationError::Authentication(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Repository(value)
    }
}
