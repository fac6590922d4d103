//! Core data model: results, tasks, collectors, plans, assignments, and the
//! per-task and per-executor shared records.

pub mod assignment;
pub mod collector;
pub mod executor_info;
pub mod plan;
pub mod result;
pub mod task;
pub mod task_manager;

// Re-export core models for easy access
pub use assignment::{Assignment, AssignmentState};
pub use collector::ResultCollector;
pub use executor_info::{ExecutorInfo, ExecutorState};
pub use plan::{Action, ExecutionPlan};
pub use result::TaskResult;
pub use task::{Task, TaskOutcome};
pub use task_manager::{Contribution, TaskManager, TaskState};
