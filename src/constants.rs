//! # System Constants
//!
//! Core constants and defaults that define the operational boundaries of the
//! orchestration engine: grid map names, continuation-lane sizing, worker
//! runtime limits, and lease/retention timing.

/// Names of the shared grid maps the engine operates on.
///
/// Records keyed by the same task-id across these maps are colocated by
/// construction in the embedded grid.
pub mod maps {
    /// Authoritative per-task orchestration records.
    pub const TASK_MANAGERS: &str = "task-managers";
    /// Per (task, executor) assignment sub-state records.
    pub const ASSIGNMENTS: &str = "task-assignments";
    /// Registered executor liveness and lifecycle records.
    pub const EXECUTORS: &str = "executor-registry";
    /// Task-scoped shared key/value properties.
    pub const PROPERTIES: &str = "task-properties";
}

/// Number of single-consumer continuation lanes serializing per-task
/// evaluation. Prime so task-id hashes spread evenly.
pub const DEFAULT_CONTINUATION_LANES: usize = 11;

/// Grid change-stream channel capacity.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Interval between expiry sweeps over the grid maps.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 250;

/// Executor lease duration; refreshed by heartbeat, expiry means the owning
/// process died without deregistering.
pub const DEFAULT_LEASE_MS: u64 = 10_000;

/// Executor heartbeat interval. Must be well under the lease duration.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 2_000;

/// Bounded depth of a worker's local assignment queue; `try_send` failure at
/// this depth is the rejection signal that propagates REASSIGN into the plan.
pub const DEFAULT_WORKER_QUEUE_CAPACITY: usize = 64;

/// Maximum concurrently executing tasks per registered worker.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 8;

/// Desired executor count used when a strategy is built without one.
pub const DEFAULT_DESIRED_EXECUTORS: u32 = 1;

/// Builds the assignment-record key for an (executor, task) pair.
///
/// The task-id prefix keeps a task's assignments adjacent and colocated with
/// its TaskManager record.
pub fn assignment_key(task_id: &str, executor_id: &str) -> String {
    format!("{task_id}::{executor_id}")
}

/// Splits an assignment key back into (task-id, executor-id).
pub fn split_assignment_key(key: &str) -> Option<(&str, &str)> {
    key.split_once("::")
}
