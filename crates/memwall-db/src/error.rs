use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The table name is not registered with this store.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A writer panicked while holding a table lock.
    #[error("Table lock poisoned: {0}")]
    LockPoisoned(String),

    /// The id counter reached its maximum; no further ids can be assigned.
    #[error("Id counter exhausted")]
    IdsExhausted,

    /// A record handed to the store did not serialize to a JSON object.
    #[error("Invalid record for table {0}")]
    InvalidRecord(String),

    /// A stored row could not be converted to or from its typed model.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
