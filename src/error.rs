//! Structured error handling for the orchestration engine.
//!
//! Every fallible public operation returns [`Result`], the crate-wide alias over
//! [`GridExecError`]. Component-local failures (worker runtime, registration)
//! have their own error enums next to the component and convert into
//! `GridExecError` at the crate boundary. User-code seams (tasks, collectors,
//! subscribers) use `anyhow::Error` and collapse into error Results at the
//! storage boundary.

use thiserror::Error;

/// Top-level error type for orchestration operations.
#[derive(Debug, Error)]
pub enum GridExecError {
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Task already exists: {task_id}")]
    TaskAlreadyExists { task_id: String },

    #[error("Executor not found: {executor_id}")]
    ExecutorNotFound { executor_id: String },

    #[error("Executor {executor_id} rejected work: {reason}")]
    WorkRejected { executor_id: String, reason: String },

    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Orchestrator is shut down")]
    ShutDown,

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Orchestration failed: {message}")]
    Orchestration { message: String },
}

impl GridExecError {
    /// Shorthand for a free-form orchestration failure.
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::Orchestration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GridExecError>;
