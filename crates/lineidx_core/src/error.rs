//! Error types for row table operations.

use std::io;
use thiserror::Error;

/// Result type for row table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur while writing, reading or deriving row tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] lineidx_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record or field handed to a writer cannot be stored.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input.
        message: String,
    },

    /// A row number outside `[0, row_count)` was requested.
    #[error("row {row} out of range: table has {row_count} rows")]
    OutOfRange {
        /// The requested row.
        row: usize,
        /// Number of indexed rows.
        row_count: usize,
    },

    /// Operation not permitted in the table's current state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the operation is rejected.
        message: String,
    },

    /// A row's content could not be decoded.
    #[error("malformed row {row}: {message}")]
    MalformedInput {
        /// The offending row number.
        row: usize,
        /// Description of the decoding failure.
        message: String,
    },

    /// Index and data file disagree.
    #[error("table corrupted: {message}")]
    Corrupted {
        /// Description of the inconsistency.
        message: String,
    },

    /// Another appender holds the table.
    #[error("table locked: {path}")]
    TableLocked {
        /// Data file path of the locked table.
        path: String,
    },
}

impl TableError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a malformed input error for `row`.
    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            row,
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Returns true for failures of the underlying file system.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Storage(_))
    }
}
