//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invariant violations in the goal tree.
/// These are independent of storage and presentation concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("strategy node {id}: atp list must not be empty")]
    EmptyAtp { id: String },

    #[error("duplicate node id in document: {id}")]
    DuplicateId { id: String },
}
