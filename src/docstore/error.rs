use thiserror::Error;

/// Errors raised by document store implementations, transactions and batches
#[derive(Debug, Error)]
pub enum DocStoreError {
    /// Collection or document path is malformed
    #[error("Invalid document path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Document data is not a JSON object
    #[error("Document data must be a JSON object, got {found}")]
    InvalidData { found: &'static str },

    /// Update targeted a document that does not exist
    #[error("No document to update: {path}")]
    NotFound { path: String },

    /// A transaction tried to read after buffering a write
    #[error("Transaction reads must happen before writes (read of {path})")]
    ReadAfterWrite { path: String },

    /// A document read by a transaction changed before commit
    #[error("Commit rejected: {path} changed since it was read")]
    Contention { path: String },

    /// Every transaction attempt hit contention
    #[error("Transaction aborted after {attempts} attempts")]
    TransactionAborted { attempts: u32 },

    /// Batch exceeds the write limit
    #[error("Batch holds {len} writes, limit is {limit}")]
    BatchTooLarge { len: usize, limit: usize },

    /// Caller supplied an unusable option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DocStoreError {
    /// Create an invalid path error
    pub fn invalid_path(path: &str, reason: &'static str) -> Self {
        DocStoreError::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }

    /// Create a not found error
    pub fn not_found(path: impl ToString) -> Self {
        DocStoreError::NotFound {
            path: path.to_string(),
        }
    }

    pub fn read_after_write(path: impl ToString) -> Self {
        DocStoreError::ReadAfterWrite {
            path: path.to_string(),
        }
    }

    pub fn contention(path: impl ToString) -> Self {
        DocStoreError::Contention {
            path: path.to_string(),
        }
    }

    /// Whether retrying the whole transaction may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocStoreError::Contention { .. })
    }
}

/// Result type alias for document store operations
pub type DocResult<T> = Result<T, DocStoreError>;
