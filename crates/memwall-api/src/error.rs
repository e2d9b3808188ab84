use memwall_db::StoreError;
use thiserror::Error;

/// Errors returned by the wall services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Passed through from the store unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Caller input that can never succeed (blank post, unknown role or emoji).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An operation that must hand back a record found none.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, ServiceError>;
