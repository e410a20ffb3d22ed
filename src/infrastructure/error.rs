//! Infrastructure-level errors (storage gateway)

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::DomainError;

/// Errors from the persistence gateway.
///
/// Load-time failures are fatal to startup; the debounced write path logs
/// and latches failures instead of returning them (see `JsonStorage`).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid document {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DomainError,
    },

    #[error("failed to encode document: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Create an I/O error with the affected path.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
