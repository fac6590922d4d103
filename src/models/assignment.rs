//! Per (executor, task) assignment sub-state record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::assignment_key;

/// Execution sub-state of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    Assigned,
    Executing,
    Cancelled,
    Executed,
}

impl AssignmentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentState::Cancelled | AssignmentState::Executed)
    }
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssignmentState::Assigned => "assigned",
            AssignmentState::Executing => "executing",
            AssignmentState::Cancelled => "cancelled",
            AssignmentState::Executed => "executed",
        };
        write!(f, "{name}")
    }
}

/// Record created when a plan first assigns an executor; the worker side
/// watches these to know when to actually run.
///
/// Transitions are compare-and-set: a stale actor whose expected state no
/// longer matches simply loses, the stored state already reflects a newer
/// transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: String,
    pub executor_id: String,
    pub state: AssignmentState,
    /// True when this assignment backfills a recovery slot rather than being
    /// a first-time assignment.
    pub recovered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(task_id: impl Into<String>, executor_id: impl Into<String>, recovered: bool) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            executor_id: executor_id.into(),
            state: AssignmentState::Assigned,
            recovered,
            created_at: now,
            updated_at: now,
        }
    }

    /// Grid key for this assignment record.
    pub fn key(&self) -> String {
        assignment_key(&self.task_id, &self.executor_id)
    }

    /// Compare-and-set transition: succeeds only when the current state is
    /// exactly `expected`.
    pub fn transition(&mut self, expected: AssignmentState, next: AssignmentState) -> bool {
        if self.state == expected {
            self.state = next;
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }
}
