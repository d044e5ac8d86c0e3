//! Error types for sweep-db
//!
//! Every failure is surfaced to the immediate caller; nothing is retried
//! automatically and a failing stage never silently continues.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Sweep-db error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid generator kind, duplicate axis name, or malformed binding
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A calculation's required arguments are not covered by its parameter group
    #[error("validation error: {0}")]
    Validation(String),

    /// Zip expansion requested with no axis of length > 1
    #[error("expansion error: {0}")]
    Expansion(String),

    /// Attempted rewrite of an existing (stage, run) entry
    #[error("duplicate run: stage {stage} run {run} already written (store is append-only; prepare with overwrite to reset)")]
    DuplicateRun {
        /// Stage index of the rejected write
        stage: usize,
        /// Run index of the rejected write
        run: usize,
    },

    /// Pipelined stage found no matching predecessor binding
    #[error("dependency lookup failed: stage {stage} has no run matching binding {binding}")]
    DependencyLookup {
        /// Stage index that was searched (the predecessor)
        stage: usize,
        /// Rendering of the binding that had no match
        binding: String,
    },

    /// Retrieval hit a non-scalar field where a scalar is required
    #[error("shape error: field '{field}' of stage {stage} run {run} is not a scalar")]
    Shape {
        /// Stage index of the offending run
        stage: usize,
        /// Run index of the offending run
        run: usize,
        /// Name of the non-scalar field
        field: String,
    },

    /// Store-level failure outside the append-only contract
    #[error("store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Container (de)serialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
