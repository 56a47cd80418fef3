//! Error types for member management.

use thiserror::Error;

use crate::entities::InvalidMemberId;
use crate::validation::ValidationErrors;

/// Failures reported by a [`MemberStore`](crate::repositories::MemberStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("member not found")]
    NotFound,

    #[error("duplicate value for unique field `{field}`")]
    DuplicateKey { field: String },

    #[error("store error: {0}")]
    Backend(String),
}

/// Failures surfaced by the member service.
#[derive(Debug, Error, Clone)]
pub enum MemberError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid member id `{0}`")]
    InvalidId(String),

    #[error("member not found")]
    NotFound,

    #[error("a member with this {0} already exists")]
    DuplicateKey(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for MemberError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => MemberError::NotFound,
            StoreError::DuplicateKey { field } => MemberError::DuplicateKey(field),
            StoreError::Backend(message) => MemberError::Store(message),
        }
    }
}

impl From<InvalidMemberId> for MemberError {
    fn from(error: InvalidMemberId) -> Self {
        MemberError::InvalidId(error.0)
    }
}

impl From<serde_json::Error> for MemberError {
    fn from(error: serde_json::Error) -> Self {
        MemberError::Internal(error.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub type MemberResult<T> = Result<T, MemberError>;
