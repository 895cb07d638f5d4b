//! Error types for trellis board operations.

use crate::domain::InitiativeId;
use std::io;
use thiserror::Error;

/// The error type for trellis board operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Initiative not found.
    #[error("Initiative not found: {0}")]
    InitiativeNotFound(InitiativeId),

    /// An initiative cannot depend on itself.
    #[error("Initiative {id} cannot depend on itself")]
    SelfDependency {
        /// The initiative that was named on both sides of the edge.
        id: InitiativeId,
    },

    /// The exact dependency edge already exists.
    #[error("Dependency already exists: {from} -> {to}")]
    DuplicateDependency {
        /// The dependent initiative.
        from: InitiativeId,
        /// The initiative being depended upon.
        to: InitiativeId,
    },

    /// Adding the dependency would create a cycle.
    #[error("Circular dependency detected: {from} -> {to}")]
    CircularDependency {
        /// The dependent initiative.
        from: InitiativeId,
        /// The initiative being depended upon.
        to: InitiativeId,
    },

    /// The initiative cannot be deleted while other initiatives depend on it.
    #[error("Initiative {initiative_id} has {dependent_count} dependent(s) and cannot be deleted")]
    HasDependents {
        /// The initiative targeted for deletion.
        initiative_id: InitiativeId,
        /// Number of initiatives that depend on it.
        dependent_count: usize,
        /// The initiatives that depend on it.
        dependents: Vec<InitiativeId>,
    },
}

/// A specialized Result type for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;
