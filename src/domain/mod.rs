//! Domain layer: goal tree entities and invariants
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod node;
pub mod update;

pub use error::DomainError;
pub use node::{AppData, ChildMode, ChildrenType, Node, StandardNode, StrategyNode, Status};
pub use update::{FieldUpdate, ListField};
