//! Error types for resolution and strict execution

use thiserror::Error;

use crate::task::TaskId;

/// Result type for task operations
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors raised by the resolver and the strict single-task runner
#[derive(Debug, Error)]
pub enum TaskError {
    /// A cycle is reachable from the start task
    #[error("Circular dependency detected: {path}")]
    CircularDependency {
        /// Project paths around the cycle, joined with " -> "
        path: String,
    },

    /// A required task failed
    #[error("Task {id} failed with exit code {exit_code}")]
    TaskExecution {
        id: TaskId,
        exit_code: i32,
        stderr: String,
    },
}

/// Failures of the process invocation capability itself
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child failed
    #[error("Failed to wait for '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
