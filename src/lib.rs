//! goaltree: hierarchical goal tracker
//!
//! Decompose goals into plain subgoals or into strategies carrying
//! ATP/signpost/trigger lists; track status, boards and timestamps per node;
//! persist the whole forest as one JSON document with debounced writes.
//!
//! Layering, leaves first: `domain` (entities and invariants) →
//! `infrastructure` (filesystem boundary and the JSON storage gateway) →
//! `application` (the `AppState` mutation choke point) → `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
