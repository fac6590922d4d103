//! Execution strategies: policy functions producing a new plan from current
//! state.
//!
//! `analyze` is pure: given identical inputs and rotation-counter state it
//! produces an equal plan, so it is safe to re-invoke on every trigger without
//! external coordination. The only shared touch point is the process-wide
//! rotation counter, which spreads assignment start positions fairly across
//! concurrent analyze calls for different tasks.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::constants::DEFAULT_DESIRED_EXECUTORS;
use crate::models::executor_info::ExecutorInfo;
use crate::models::plan::{Action, ExecutionPlan};

/// Why an evaluation cycle is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rationale {
    /// No plan exists yet; the task was just created.
    pub task_created: bool,
    /// Executor membership changed since the last evaluation.
    pub executors_changed: bool,
    /// A new result generation arrived.
    pub result_provided: bool,
    /// The notification cause was a partition/ownership recovery.
    pub task_recovered: bool,
}

impl Rationale {
    pub fn any(&self) -> bool {
        self.task_created || self.executors_changed || self.result_provided || self.task_recovered
    }
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.task_created {
            parts.push("task_created");
        }
        if self.executors_changed {
            parts.push("executors_changed");
        }
        if self.result_provided {
            parts.push("result_provided");
        }
        if self.task_recovered {
            parts.push("task_recovered");
        }
        write!(f, "[{}]", parts.join(","))
    }
}

/// Policy seam deciding which executors run a task.
pub trait ExecutionStrategy: Send + Sync {
    /// Produces the next plan from the current plan, the live executor set,
    /// and the evaluation rationale.
    fn analyze(
        &self,
        current: Option<&ExecutionPlan>,
        executors: &[ExecutorInfo],
        rationale: Rationale,
        rotation: &AtomicU64,
    ) -> ExecutionPlan;

    /// Identity for logs.
    fn describe(&self) -> String {
        "execution-strategy".to_string()
    }
}

/// Candidate filter over live executor records.
pub type ExecutorFilter = dyn Fn(&ExecutorInfo) -> bool + Send + Sync;

/// The standard policy: desired executor count, concurrent or sequential
/// progression, optional candidate filter.
pub struct StandardExecutionStrategy {
    desired: Option<u32>,
    concurrent: bool,
    filter: Option<Arc<ExecutorFilter>>,
}

impl StandardExecutionStrategy {
    /// Targets a fixed number of executors, filling the gap concurrently.
    pub fn desired(count: u32) -> Self {
        Self {
            desired: Some(count),
            concurrent: true,
            filter: None,
        }
    }

    /// Targets every matching candidate.
    pub fn all_candidates() -> Self {
        Self {
            desired: None,
            concurrent: true,
            filter: None,
        }
    }

    /// Switches between concurrent gap-filling and sequential one-at-a-time
    /// progression. Sequential plans only advance when the task was just
    /// created or a previous executor just produced a result.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Restricts candidates with an arbitrary predicate.
    pub fn with_filter(
        mut self,
        filter: impl Fn(&ExecutorInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Restricts candidates to executors registered under a logical name.
    pub fn for_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_filter(move |executor| executor.name == name)
    }

    /// Restricts candidates to executors registered with a role.
    pub fn for_role(self, role: impl Into<String>) -> Self {
        let role = role.into();
        self.with_filter(move |executor| executor.role.as_deref() == Some(role.as_str()))
    }

    /// Restricts candidates to storage-enabled executors.
    pub fn storage_enabled_only(self) -> Self {
        self.with_filter(|executor| executor.storage_enabled)
    }

    fn is_candidate(&self, executor: &ExecutorInfo, now: chrono::DateTime<Utc>) -> bool {
        executor.is_live(now)
            && self
                .filter
                .as_deref()
                .is_none_or(|filter| filter(executor))
    }
}

impl Default for StandardExecutionStrategy {
    fn default() -> Self {
        Self::desired(DEFAULT_DESIRED_EXECUTORS)
    }
}

impl fmt::Debug for StandardExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardExecutionStrategy")
            .field("desired", &self.desired)
            .field("concurrent", &self.concurrent)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl ExecutionStrategy for StandardExecutionStrategy {
    fn analyze(
        &self,
        current: Option<&ExecutionPlan>,
        executors: &[ExecutorInfo],
        rationale: Rationale,
        rotation: &AtomicU64,
    ) -> ExecutionPlan {
        let now = Utc::now();

        // Candidates ordered by join time (earliest preferred), id as the
        // final tie-break so ordering is fully deterministic.
        let mut candidates: Vec<&ExecutorInfo> = executors
            .iter()
            .filter(|executor| self.is_candidate(executor, now))
            .collect();
        candidates.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let candidate_ids: HashSet<&str> =
            candidates.iter().map(|executor| executor.id.as_str()).collect();

        let mut plan = current.cloned().unwrap_or_default();

        // Executors that left the candidate set while owning the task, or
        // that asked to be reassigned, are released; their slot must be
        // backfilled by a recovery, not a fresh assignment.
        for id in plan.ids() {
            match plan.action(&id) {
                Some(Action::Assign) | Some(Action::Recover)
                    if !candidate_ids.contains(id.as_str()) =>
                {
                    plan.release(&id);
                    plan.increment_pending_recovery();
                }
                Some(Action::Reassign) => {
                    plan.release(&id);
                    plan.increment_pending_recovery();
                }
                _ => {}
            }
        }

        // Candidates without any standing in the plan. Executors already
        // effectively assigned must not be double-counted; released entries
        // become eligible again only after optimization strips them.
        let available: Vec<&ExecutorInfo> = candidates
            .iter()
            .copied()
            .filter(|executor| plan.action(&executor.id).is_none())
            .collect();

        let desired = match self.desired {
            Some(count) => count as usize,
            None => candidates.len(),
        };

        let effective = plan.effectively_assigned_count();
        let additional = if self.concurrent {
            desired.saturating_sub(effective)
        } else if effective < desired && (rationale.task_created || rationale.result_provided) {
            1
        } else {
            0
        };

        let additional = additional.min(available.len());
        if additional > 0 {
            let start = (rotation.fetch_add(1, Ordering::Relaxed) as usize) % available.len();
            for offset in 0..additional {
                let executor = available[(start + offset) % available.len()];
                if plan.consume_pending_recovery() {
                    plan.recover(&executor.id);
                } else {
                    plan.assign(&executor.id);
                }
            }
        }

        let effective = plan.effectively_assigned_count();
        plan.set_satisfied(desired > 0 && effective == desired);
        plan
    }

    fn describe(&self) -> String {
        format!(
            "standard(desired={}, {})",
            self.desired
                .map_or_else(|| "all".to_string(), |count| count.to_string()),
            if self.concurrent {
                "concurrent"
            } else {
                "sequential"
            }
        )
    }
}
