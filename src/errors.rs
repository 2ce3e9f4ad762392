// src/errors.rs

//! Crate-wide error types.
//!
//! - [`RunError`] is what a [`crate::run`] call resolves with when it fails.
//! - [`NodeError`] is the failure of a single node; it is shared (via `Arc`)
//!   between the renderer `fail` update and the error handed to the caller.
//! - [`LockError`] covers lock accounting mistakes.
//! - [`KeydagError`] is the CLI/config-level error.

use std::sync::Arc;

use thiserror::Error;

/// Failure of a single node, either thrown by its body or produced by
/// provides-contract validation.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Task(#[from] anyhow::Error),

    #[error("task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },

    #[error("task '{task}' provided {key}, which was already provided")]
    AlreadyProvided { task: String, key: String },

    #[error("task '{task}' provided unexpected {key}")]
    UnexpectedProvide { task: String, key: String },

    #[error("task '{task}' did not provide expected {key}")]
    MissingProvide { task: String, key: String },

    #[error("task '{task}' returned nothing but declares several provides: {keys:?}")]
    NoResult { task: String, keys: Vec<String> },
}

impl NodeError {
    /// Whether this failure came from result validation rather than from the
    /// task body itself.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            NodeError::AlreadyProvided { .. }
                | NodeError::UnexpectedProvide { .. }
                | NodeError::MissingProvide { .. }
                | NodeError::NoResult { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("lock acquired while unavailable (capacity {capacity})")]
    Exhausted { capacity: usize },

    #[error("lock released while not held")]
    NotHeld,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("task #{index} has an empty title")]
    MissingTitle { index: usize },

    #[error("task '{task}' uses undeclared lock '{lock}'")]
    UnknownLock { task: String, lock: String },

    #[error("lock '{lock}' must have a capacity of at least 1")]
    InvalidLockCapacity { lock: String },

    #[error("no task provides targeted key '{key}'")]
    UnknownTarget { key: String },

    #[error("lock accounting error: {0}")]
    Lock(#[from] LockError),

    #[error("{error}")]
    TaskFailed {
        task: String,
        #[source]
        error: Arc<NodeError>,
    },

    #[error("run stalled with pending tasks that can never start: {pending:?}")]
    Stalled { pending: Vec<String> },

    #[error("runtime event channel closed before the run settled")]
    ChannelClosed,
}

impl RunError {
    /// The node failure behind a `TaskFailed` error, if any.
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            RunError::TaskFailed { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum KeydagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, KeydagError>;
