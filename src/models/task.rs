//! Task trait and execution outcome variants.
//!
//! A task is opaque to the engine except for its `execute` entry point. The
//! outcome is a tagged variant rather than an unwind: yielding is ordinary
//! control flow, and failures are values the collection logic consumes.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::executor::context::ExecutionContext;

/// What one execution attempt produced.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Normal completion of this attempt with a result value.
    Continue(Value),
    /// Cooperative suspension; the same executor resumes after at least the
    /// given delay with `is_resuming()` set.
    Yield(Duration),
    /// The attempt failed; captured as an error Result, never a crash.
    Failed(anyhow::Error),
}

impl TaskOutcome {
    pub fn continue_with(value: impl Into<Value>) -> Self {
        Self::Continue(value.into())
    }

    pub fn yield_for(delay: Duration) -> Self {
        Self::Yield(delay)
    }

    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        Self::Failed(error.into())
    }
}

/// A user-supplied unit of work, immutable once submitted.
///
/// Implementations must tolerate being executed more than once (recovery
/// re-runs an attempt on another executor) and can use the task-scoped
/// properties on the context to carry resumption state across yields and
/// failovers.
#[async_trait]
pub trait Task: Send + Sync {
    /// Runs one attempt of this task on the calling executor.
    async fn execute(&self, ctx: &ExecutionContext) -> TaskOutcome;

    /// Short human-readable identity for logs.
    fn name(&self) -> &str {
        "task"
    }
}
