//! # Command Outcome Classification
//!
//! Provides a unified outcome type for classifying orchestration command results.
//! Used by the event system's send-and-await pipeline to uniformly handle stats
//! tracking and error reporting across all command types.

use crate::orchestration::commands::{
    StepProcessResult, TaskFinalizationResult, TaskInitializeResult,
};

/// Classifies any command result into a uniform outcome for stats and logging.
///
/// The orchestration event system processes three command types (StepResult,
/// TaskInitialize, TaskFinalization) through the same send-and-await pipeline.
/// Each has different result variants, but from the event system's perspective
/// they all reduce to:
/// - **Success**: Increment `operations_coordinated`
/// - **Failed**: Increment `events_failed`, return error
/// - **Skipped**: Increment `operations_coordinated` (non-error skip)
///
/// Uses an enum instead of a trait because the result type set is intentionally
/// finite and exhaustive — there are exactly three command result types.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CommandOutcome {
    /// Command completed successfully
    Success,
    /// Command processing failed
    Failed(String),
    /// Command was skipped (non-error condition)
    Skipped(String),
}

impl CommandOutcome {
    /// Classify a step result processing outcome
    pub fn from_step_result(result: &StepProcessResult) -> Self {
        match result {
            StepProcessResult::Success { .. } => Self::Success,
            StepProcessResult::Failed { error } => Self::Failed(error.clone()),
            StepProcessResult::Skipped { reason } => Self::Skipped(reason.clone()),
        }
    }

    /// Classify a task initialization outcome
    pub fn from_task_initialize_result(result: &TaskInitializeResult) -> Self {
        match result {
            TaskInitializeResult::Success { .. } => Self::Success,
            TaskInitializeResult::Failed { error } => Self::Failed(error.clone()),
            TaskInitializeResult::Skipped { reason } => Self::Skipped(reason.clone()),
        }
    }

    /// Classify a task finalization outcome
    ///
    /// `NotClaimed` maps to `Skipped` — it's a non-error condition where another
    /// processor already claimed the finalization.
    pub fn from_task_finalization_result(result: &TaskFinalizationResult) -> Self {
        match result {
            TaskFinalizationResult::Success { .. } => Self::Success,
            TaskFinalizationResult::Failed { error } => Self::Failed(error.clone()),
            TaskFinalizationResult::NotClaimed { reason, .. } => Self::Skipped(reason.clone()),
        }
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    #[cfg(test)]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Get the detail message for non-success outcomes
    #[cfg(test)]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failed(s) | Self::Skipped(s) => Some(s),
        }
    }

    /// Get a human-readable label for the outcome
    #[cfg(test)]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}
