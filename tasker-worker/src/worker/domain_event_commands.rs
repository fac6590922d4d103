//! # TAS-65/TAS-69: Domain Event Commands
//!
//! Command pattern for fire-and-forget domain event publishing.
//! Uses `try_send()` to ensure workflow steps never block on event publishing.
//!
//! ## Architecture
//!
//! ```text
//! command_processor.rs
//!       |
//!       | try_send(DispatchEvents)  <-- fire-and-forget, never blocks
//!       v
//! DomainEventSystem
//!       |
//!       v
//! StepEventPublisher.publish(ctx)
//!       |
//!       v
//! EventRouter → Durable (PGMQ) / Fast (InProcess)
//! ```
//!
//! ## Key Design Decisions
//!
//! 1. **Fire-and-forget with `try_send()`**: Commands are dispatched without waiting
//!    for acknowledgment. If the channel is full, events are dropped with metrics.
//!
//! 2. **No oneshot response channels**: Unlike other commands that need responses,
//!    domain event dispatch is purely fire-and-forget. Stats queries use oneshot.
//!
//! 3. **Step-level publishing**: Events are collected during step execution and
//!    dispatched as a batch after completion.

use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use tasker_shared::events::domain_events::EventMetadata;
use tasker_shared::messaging::execution_types::StepExecutionResult;
use tasker_shared::models::core::task_template::EventDeliveryMode;
use tasker_shared::types::base::TaskSequenceStep;

// Re-export from canonical location in tasker-shared
pub use tasker_shared::metrics::worker::{
    DomainEventShutdownResult as ShutdownResult, DomainEventSystemStats,
};

/// A domain event ready to be published
#[derive(Debug, Clone)]
pub struct DomainEventToPublish {
    /// Event name in dot notation (e.g., "order.processed")
    pub event_name: String,
    /// How to deliver the event (Durable or Fast)
    pub delivery_mode: EventDeliveryMode,
    /// Business-specific event payload
    pub business_payload: Value,
    /// Event metadata for correlation and tracing
    pub metadata: EventMetadata,
    /// The complete task sequence step context
    pub task_sequence_step: TaskSequenceStep,
    /// The execution result from the step
    pub execution_result: StepExecutionResult,
}

/// Commands for the DomainEventSystem
///
/// These commands are processed asynchronously by the DomainEventSystem.
/// The `DispatchEvents` command uses fire-and-forget semantics (no response).
#[derive(Debug)]
pub enum DomainEventCommand {
    /// Dispatch domain events after step completion (fire-and-forget)
    ///
    /// This command has no response channel - it's purely fire-and-forget.
    /// If the command cannot be sent (channel full), events are dropped
    /// and a metric is recorded.
    DispatchEvents {
        /// Events to publish
        events: Vec<DomainEventToPublish>,
        /// Name of the publisher to use (for custom publisher support)
        publisher_name: String,
        /// Correlation ID for tracing
        correlation_id: Uuid,
    },

    /// Get system statistics
    GetStats {
        /// Response channel for stats
        resp: oneshot::Sender<DomainEventSystemStats>,
    },

    /// Shutdown the domain event system
    ///
    /// Drains any pending fast events up to the configured timeout,
    /// then stops processing. Durable events are already persisted.
    Shutdown {
        /// Response when shutdown is complete
        resp: oneshot::Sender<ShutdownResult>,
    },
}

// DomainEventSystemStats and ShutdownResult are re-exported from tasker_shared::metrics::worker
