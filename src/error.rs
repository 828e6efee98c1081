use thiserror::Error;

use crate::account::auth::AuthError;
use crate::storage::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,
    #[error("duplicate key: {0}")]
    DuplicateKey(&'static str),
    #[error("unauthorized")]
    Unauthorized,
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("credential error: {0}")]
    Credential(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::DuplicateKey(key) => ServiceError::DuplicateKey(key),
            StoreError::Unavailable(e) | StoreError::Corrupt(e) => ServiceError::BackendUnavailable(e),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidPassword => ServiceError::Unauthorized,
            other => ServiceError::Credential(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
