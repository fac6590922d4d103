//! Per-task serialized continuation lanes.
//!
//! Reactive-hook evaluations perform read-evaluate-write over shared records
//! and must never interleave with themselves. Task-ids hash across a small
//! prime-sized array of single-consumer lanes: two different tasks can
//! evaluate concurrently, one task's successive triggers are strictly
//! ordered.

use std::collections::HashMap;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A queued evaluation trigger for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalTrigger {
    /// The notification cause was a partition/ownership recovery.
    pub recovery: bool,
}

impl EvalTrigger {
    pub fn regular() -> Self {
        Self { recovery: false }
    }

    pub fn recovered() -> Self {
        Self { recovery: true }
    }

    /// Composes a newly arrived trigger into an already queued one.
    pub fn merge(&mut self, other: EvalTrigger) {
        self.recovery |= other.recovery;
    }
}

struct Lane {
    tx: mpsc::UnboundedSender<String>,
    pending: Arc<Mutex<HashMap<String, EvalTrigger>>>,
    worker: JoinHandle<()>,
}

/// Hash-partitioned single-consumer lanes running one handler per trigger.
///
/// A trigger arriving while one is already queued for the same task composes
/// into the queued run instead of enqueuing twice; a trigger arriving while
/// the task's handler is mid-run queues exactly one follow-up run.
pub struct ContinuationLanes {
    lanes: Vec<Lane>,
}

impl ContinuationLanes {
    /// Spawns `count` lane consumers driving `handler`.
    pub fn start<F, Fut>(count: usize, handler: F) -> Self
    where
        F: Fn(String, EvalTrigger) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        assert!(count > 0, "at least one continuation lane is required");
        let mut lanes = Vec::with_capacity(count);
        for index in 0..count {
            let (tx, mut rx) = mpsc::unbounded_channel::<String>();
            let pending: Arc<Mutex<HashMap<String, EvalTrigger>>> =
                Arc::new(Mutex::new(HashMap::new()));
            let consumer_pending = Arc::clone(&pending);
            let handler = handler.clone();
            let worker = tokio::spawn(async move {
                while let Some(task_id) = rx.recv().await {
                    let trigger = consumer_pending.lock().remove(&task_id);
                    if let Some(trigger) = trigger {
                        handler(task_id, trigger).await;
                    }
                }
                debug!(lane = index, "continuation lane stopped");
            });
            lanes.push(Lane {
                tx,
                pending,
                worker,
            });
        }
        Self { lanes }
    }

    /// Schedules an evaluation for `task_id`, composing with one already
    /// queued on the same lane.
    pub fn schedule(&self, task_id: &str, trigger: EvalTrigger) {
        let lane = &self.lanes[Self::lane_index(task_id, self.lanes.len())];
        let enqueue = {
            let mut pending = lane.pending.lock();
            match pending.get_mut(task_id) {
                Some(existing) => {
                    existing.merge(trigger);
                    false
                }
                None => {
                    pending.insert(task_id.to_string(), trigger);
                    true
                }
            }
        };
        // A send failure means the lanes were shut down; the trigger is moot.
        if enqueue {
            let _ = lane.tx.send(task_id.to_string());
        }
    }

    /// Stops all lane consumers. In-flight handlers are aborted; the process
    /// is tearing down and the records they would have written are going with
    /// it.
    pub fn shutdown(&self) {
        for lane in &self.lanes {
            lane.worker.abort();
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    fn lane_index(task_id: &str, count: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        task_id.hash(&mut hasher);
        (hasher.finish() as usize) % count
    }
}
