use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, CardError>;

/// Failure taxonomy shared by the card engine and the report generator.
///
/// Business-rule violations carry enough context to render a client-visible
/// message; infrastructure failures are wrapped so callers can propagate them
/// with `?` without inspecting the backend.
#[derive(Error, Debug)]
pub enum CardError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("credit limit exceeded")]
    CreditLimitExceeded,
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("card not eligible for activation: {have}/{need} purchases")]
    ActivationThreshold { have: usize, need: usize },
    #[error("version conflict on card {0}")]
    VersionConflict(Uuid),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for CardError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
