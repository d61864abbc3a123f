//! Database error taxonomy
//!
//! Every public operation of the table access layer, the query builder and
//! the task operations returns `DbResult<T>`. Nothing panics across that
//! boundary; callers decide whether to log, display or ignore a failure.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors produced by the database layer
#[derive(Error, Debug)]
pub enum DbError {
    /// No document has been written under the database key yet
    #[error("Database not initialized")]
    NotInitialized,

    /// Table name outside the fixed set
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    /// No record with the given id
    #[error("Record not found: {id} in table '{table}'")]
    RecordNotFound { table: String, id: String },

    /// Import payload could not be parsed as a database document
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The stored document exists but cannot be parsed
    #[error("Stored database document is corrupted: {0}")]
    CorruptDocument(String),

    /// A record handed to the access layer is not usable
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A snapshot is already held under the backup key
    #[error("A transaction is already in progress")]
    TransactionInProgress,

    /// Backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DbError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DbError::NotInitialized => "not_initialized",
            DbError::UnknownTable(_) => "unknown_table",
            DbError::RecordNotFound { .. } => "record_not_found",
            DbError::MalformedPayload(_) => "malformed_payload",
            DbError::CorruptDocument(_) => "corrupt_document",
            DbError::InvalidRecord(_) => "invalid_record",
            DbError::TransactionInProgress => "transaction_in_progress",
            DbError::Storage(_) => "storage",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::RecordNotFound { .. })
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
