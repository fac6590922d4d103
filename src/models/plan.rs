//! Execution plan: per-task map of executor-id to proposed action.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Proposed action for one executor within a task's plan.
///
/// ASSIGN, RECOVER, and COMPLETED mean the executor currently owns or has
/// owned the task productively; REASSIGN and RELEASE are transitional
/// non-ownership states that exist only between evaluation and optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Assign,
    Recover,
    Completed,
    Reassign,
    Release,
}

impl Action {
    /// True when this action represents productive ownership of the task.
    pub fn is_effectively_assigned(&self) -> bool {
        matches!(self, Action::Assign | Action::Recover | Action::Completed)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Assign => "assign",
            Action::Recover => "recover",
            Action::Completed => "completed",
            Action::Reassign => "reassign",
            Action::Release => "release",
        };
        write!(f, "{name}")
    }
}

/// Map of executor-id → [`Action`] with satisfaction and pending-recovery
/// bookkeeping. Deterministically ordered by executor-id.
///
/// Mutation goes through `set_action`/`assign`/`recover`/`release`/`optimize`
/// only; the record holding the plan provides the single-writer guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    actions: BTreeMap<String, Action>,
    satisfied: bool,
    pending_recovery_count: u32,
}

impl ExecutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current action for an executor, if any.
    pub fn action(&self, executor_id: &str) -> Option<Action> {
        self.actions.get(executor_id).copied()
    }

    /// Sets the action for an executor. Returns whether the plan changed.
    pub fn set_action(&mut self, executor_id: &str, action: Action) -> bool {
        match self.actions.insert(executor_id.to_string(), action) {
            Some(previous) => previous != action,
            None => true,
        }
    }

    pub fn assign(&mut self, executor_id: &str) -> bool {
        self.set_action(executor_id, Action::Assign)
    }

    pub fn recover(&mut self, executor_id: &str) -> bool {
        self.set_action(executor_id, Action::Recover)
    }

    pub fn release(&mut self, executor_id: &str) -> bool {
        self.set_action(executor_id, Action::Release)
    }

    /// Executor ids present in the plan, in deterministic order.
    pub fn ids(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Action)> {
        self.actions
            .iter()
            .map(|(id, action)| (id.as_str(), *action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of entries matching the predicate.
    pub fn count(&self, predicate: impl Fn(Action) -> bool) -> usize {
        self.actions
            .values()
            .filter(|action| predicate(**action))
            .count()
    }

    /// Number of executors productively owning the task.
    pub fn effectively_assigned_count(&self) -> usize {
        self.count(|action| action.is_effectively_assigned())
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn set_satisfied(&mut self, satisfied: bool) {
        self.satisfied = satisfied;
    }

    /// Recovery slots waiting to be backfilled with RECOVER assignments.
    pub fn pending_recovery_count(&self) -> u32 {
        self.pending_recovery_count
    }

    pub fn increment_pending_recovery(&mut self) {
        self.pending_recovery_count += 1;
    }

    /// Consumes one pending recovery slot. Returns whether one was available.
    pub fn consume_pending_recovery(&mut self) -> bool {
        if self.pending_recovery_count > 0 {
            self.pending_recovery_count -= 1;
            true
        } else {
            false
        }
    }

    /// Strips RELEASE entries. They are one-shot signals consumed by
    /// assignment registration, not durable state. Returns whether the plan
    /// changed.
    pub fn optimize(&mut self) -> bool {
        let before = self.actions.len();
        self.actions.retain(|_, action| *action != Action::Release);
        before != self.actions.len()
    }
}
