//! Application-level errors (wraps domain and storage errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::StorageError;

/// Application errors wrap the lower layers and add use-case context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
