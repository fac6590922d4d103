//! The authoritative per-task orchestration record.
//!
//! One `TaskManager` exists per submitted task, stored in the task-managers
//! grid map and mutated only through atomic per-key invokes: the reactive
//! evaluation, worker result-reporting, cancellation, and cleanup. Both
//! completion flags are monotonic; once either is set the record stops
//! accepting results and plan evaluation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collector::ResultCollector;
use super::plan::{Action, ExecutionPlan};
use super::result::TaskResult;
use super::task::Task;
use crate::orchestration::strategy::ExecutionStrategy;

/// Orchestration state of the record. TERMINATING triggers cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Orchestrated,
    Terminating,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Orchestrated => write!(f, "orchestrated"),
            TaskState::Terminating => write!(f, "terminating"),
        }
    }
}

/// Decides completion from the folded result when a collector is present.
pub type CompletionPredicate = dyn Fn(&Value) -> bool + Send + Sync;

/// Side effect invoked exactly once at completion.
pub type CompletionAction = dyn Fn() + Send + Sync;

/// One per-executor contributed result awaiting collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub executor_id: String,
    pub result: TaskResult,
    pub contributed_at: DateTime<Utc>,
}

/// Authoritative shared record for one task's lifecycle.
#[derive(Clone)]
pub struct TaskManager {
    pub task_id: String,
    pub task: Arc<dyn Task>,
    pub strategy: Arc<dyn ExecutionStrategy>,
    pub collector: Option<Arc<dyn ResultCollector>>,
    pub completion_predicate: Option<Arc<CompletionPredicate>>,
    pub completion_action: Option<Arc<CompletionAction>>,
    /// `None`: delete the record on completion. Zero: keep forever.
    /// Positive: expire the record that long after completion.
    pub retain: Option<Duration>,
    /// Current plan; `None` until the strategy first runs.
    pub plan: Option<ExecutionPlan>,
    /// Un-evaluated triggers (membership/result changes). Accumulates, never
    /// reset; evaluation subtracts exactly what it consumed.
    pub pending_strategy_updates: u32,
    /// Un-optimized plan changes, same accumulate/consume discipline.
    pub pending_plan_optimizations: u32,
    pub last_result: TaskResult,
    /// Bumped by exactly one for every published top-level result change.
    pub result_version: u64,
    /// Open per-executor results. With a collector this accumulates; without
    /// one each new contribution entirely replaces the prior one.
    pub contributed: Vec<Contribution>,
    /// Incremented on every contributed result.
    pub result_generation: u64,
    /// Last generation folded into `last_result`.
    pub processed_generation: u64,
    pub completed: bool,
    pub cancelled: bool,
    completion_notified: bool,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
}

impl TaskManager {
    /// Creates the record as stored at submission. The initial pending
    /// strategy update makes the creation notification itself produce the
    /// first plan.
    pub fn new(
        task_id: impl Into<String>,
        task: Arc<dyn Task>,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task,
            strategy,
            collector: None,
            completion_predicate: None,
            completion_action: None,
            retain: None,
            plan: None,
            pending_strategy_updates: 1,
            pending_plan_optimizations: 0,
            last_result: TaskResult::None,
            result_version: 0,
            contributed: Vec::new(),
            result_generation: 0,
            processed_generation: 0,
            completed: false,
            cancelled: false,
            completion_notified: false,
            state: TaskState::Orchestrated,
            created_at: Utc::now(),
        }
    }

    /// Completed or cancelled: no further results, no further evaluation.
    pub fn is_done(&self) -> bool {
        self.completed || self.cancelled
    }

    /// Contributions newer than the last fold exist.
    pub fn has_new_results(&self) -> bool {
        self.result_generation > self.processed_generation
    }

    /// Records one executor's result. Returns false when the record no longer
    /// accepts results.
    ///
    /// `mark_completed` additionally flips this executor's plan action to
    /// COMPLETED so the plan can reach full completion without being
    /// re-picked.
    pub fn record_contribution(
        &mut self,
        executor_id: &str,
        result: TaskResult,
        mark_completed: bool,
    ) -> bool {
        if self.is_done() {
            return false;
        }
        let contribution = Contribution {
            executor_id: executor_id.to_string(),
            result,
            contributed_at: Utc::now(),
        };
        if self.collector.is_some() {
            self.contributed.push(contribution);
        } else {
            self.contributed = vec![contribution];
        }
        self.result_generation += 1;
        if mark_completed {
            if let Some(plan) = self.plan.as_mut() {
                plan.set_action(executor_id, Action::Completed);
            }
        }
        true
    }

    /// Publishes a new top-level result. Equality-checked: an unchanged
    /// result bumps nothing so subscribers see no redundant notification.
    pub fn publish(&mut self, result: TaskResult) -> bool {
        if self.last_result == result {
            return false;
        }
        self.last_result = result;
        self.result_version += 1;
        true
    }

    /// Marks the task completed and moves it to TERMINATING.
    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.state = TaskState::Terminating;
    }

    /// Cancellation guard: only an ORCHESTRATED, not-yet-done record cancels.
    /// Monotonic; the second caller gets false.
    pub fn mark_cancelled(&mut self) -> bool {
        if self.state == TaskState::Orchestrated && !self.is_done() {
            self.cancelled = true;
            self.state = TaskState::Terminating;
            true
        } else {
            false
        }
    }

    /// Claims the one-shot completion notice. The winner runs the completion
    /// action and terminal subscriber delivery.
    pub fn claim_completion_notice(&mut self) -> bool {
        if self.completion_notified {
            false
        } else {
            self.completion_notified = true;
            true
        }
    }

    /// Registers an evaluation trigger (membership or result change).
    pub fn bump_strategy_updates(&mut self) {
        self.pending_strategy_updates += 1;
    }

    /// Latest contributed result, the effective result when no collector is
    /// configured.
    pub fn latest_contribution(&self) -> Option<&Contribution> {
        self.contributed.last()
    }
}

impl fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskManager")
            .field("task_id", &self.task_id)
            .field("task", &self.task.name())
            .field("has_collector", &self.collector.is_some())
            .field("retain", &self.retain)
            .field("plan", &self.plan)
            .field("pending_strategy_updates", &self.pending_strategy_updates)
            .field(
                "pending_plan_optimizations",
                &self.pending_plan_optimizations,
            )
            .field("last_result", &self.last_result)
            .field("result_version", &self.result_version)
            .field("result_generation", &self.result_generation)
            .field("processed_generation", &self.processed_generation)
            .field("completed", &self.completed)
            .field("cancelled", &self.cancelled)
            .field("state", &self.state)
            .finish()
    }
}
