//! # TAS-40 Worker Event Publisher
//!
//! Specialized event publisher for workers to fire step execution events
//! to FFI handlers using the in-process event system.
//!
//! ## Key Features
//!
//! - **Database-Hydrated Events**: Uses database-as-API pattern to create fully hydrated events
//! - **Ruby-Compatible Context**: Creates execution context matching Ruby expectations
//! - **Command Integration**: Seamlessly works with WorkerProcessor command pattern
//! - **FFI Bridge**: Publishes events that FFI handlers can subscribe to
//! - **Traceability**: Provides correlation IDs and comprehensive logging
//!
//! ## Architecture Integration
//!
//! ```text
//! WorkerProcessor.handle_execute_step()
//!     ↓ (after database hydration)
//! WorkerEventPublisher.fire_step_execution_event()
//!     ↓ (via WorkerEventSystem)
//! FFI Handler (Ruby/Python/WASM) receives StepExecutionEvent
//! ```
//!
//! ## Usage in WorkerProcessor
//!
//! ```rust
//! use tasker_worker::worker::event_publisher::WorkerEventPublisher;
//! use tasker_shared::types::TaskSequenceStep;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Inside WorkerProcessor
//!     let worker_id = "worker-001".to_string();
//!     let event_publisher = WorkerEventPublisher::new(worker_id.clone());
//!
//!     // Example TaskSequenceStep would come from database hydration
//!     // For doctest purposes, we'll create a minimal example
//!     // In practice, this would come from WorkerProcessor's step processing
//!
//!     // Note: TaskSequenceStep creation would typically happen in the processor
//!     // This is just to demonstrate the fire_step_execution_event API
//!
//!     // Uncomment for real usage with TaskSequenceStep:
//!     // event_publisher.fire_step_execution_event(&task_sequence_step).await?;
//!
//!     println!("WorkerEventPublisher created successfully");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use tasker_shared::events::{WorkerEventPublisher as SharedEventPublisher, WorkerEventSystem};
use tasker_shared::types::TaskSequenceStep;

use tasker_shared::types::{StepEventPayload, StepExecutionEvent};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Worker-specific event publisher that creates Ruby-compatible events
#[derive(Debug, Clone)]
pub struct WorkerEventPublisher {
    /// Worker identifier for traceability
    worker_id: String,
    /// Shared event publisher for cross-language communication
    shared_publisher: SharedEventPublisher,
    /// Event system for direct publishing if needed
    event_system: Arc<WorkerEventSystem>,
}

impl WorkerEventPublisher {
    /// Create a new worker event publisher
    pub fn new(worker_id: String) -> Self {
        let event_system = Arc::new(WorkerEventSystem::new());
        let shared_publisher = event_system.create_publisher();

        info!(
            worker_id = %worker_id,
            "Creating WorkerEventPublisher for FFI communication"
        );

        Self {
            worker_id,
            shared_publisher,
            event_system,
        }
    }

    /// Create a worker event publisher with custom event system
    pub fn with_event_system(worker_id: String, event_system: Arc<WorkerEventSystem>) -> Self {
        let shared_publisher = event_system.create_publisher();

        Self {
            worker_id,
            shared_publisher,
            event_system,
        }
    }

    /// Fire a step execution event to FFI handlers after database hydration
    ///
    /// This is the main integration point called by WorkerProcessor after it has
    /// hydrated all step context from the database using SimpleStepMessage UUIDs.
    pub async fn fire_step_execution_event(
        &self,
        task_sequence_step: &TaskSequenceStep,
    ) -> Result<StepExecutionEvent, WorkerEventError> {
        let task_uuid = task_sequence_step.task.task.task_uuid;
        let step_uuid = task_sequence_step.workflow_step.workflow_step_uuid;

        // Create step event payload with all hydrated context
        let payload = StepEventPayload::new(task_uuid, step_uuid, task_sequence_step.clone());

        // Create the event
        let event = StepExecutionEvent::new(payload);
        let event_id = event.event_id;

        // Publish event to FFI handlers
        match self
            .shared_publisher
            .publish_step_execution(event.payload.clone())
            .await
        {
            Ok(()) => {
                info!(
                    worker_id = %self.worker_id,
                    event_id = %event_id,
                    step_name = %task_sequence_step.step_definition.name,
                    callable = %task_sequence_step.step_definition.handler.callable,
                    "Step execution event fired successfully to FFI handlers"
                );
                Ok(event)
            }
            Err(e) => {
                error!(
                    worker_id = %self.worker_id,
                    event_id = %event_id,
                    step_name = %task_sequence_step.step_definition.name,
                    error = %e,
                    "Failed to fire step execution event to FFI handlers"
                );
                Err(WorkerEventError::PublishError(format!(
                    "Failed to publish step execution event: {e}"
                )))
            }
        }
    }

    /// Fire a step execution event with specific correlation ID
    ///
    /// This allows for event correlation between worker and FFI completion events.
    pub async fn fire_step_execution_event_with_correlation(
        &self,
        correlation_id: Uuid,
        task_sequence_step: &TaskSequenceStep,
    ) -> Result<StepExecutionEvent, WorkerEventError> {
        let task_uuid = task_sequence_step.task.task.task_uuid;
        let step_uuid = task_sequence_step.workflow_step.workflow_step_uuid;

        debug!(
            worker_id = %self.worker_id,
            correlation_id = %correlation_id,
            task_uuid = %task_uuid,
            step_uuid = %step_uuid,
            step_name = %task_sequence_step.step_definition.name,
            "Firing step execution event with correlation ID"
        );

        // Create step event payload
        let payload = StepEventPayload::new(task_uuid, step_uuid, task_sequence_step.clone());

        // Publish with correlation ID
        match self
            .shared_publisher
            .publish_step_execution_with_correlation(correlation_id, payload.clone())
            .await
        {
            Ok(()) => {
                info!(
                    worker_id = %self.worker_id,
                    correlation_id = %correlation_id,
                    step_name = %task_sequence_step.step_definition.name,
                    "Step execution event fired with correlation ID"
                );
                Ok(StepExecutionEvent::with_event_id(correlation_id, payload))
            }
            Err(e) => {
                error!(
                    worker_id = %self.worker_id,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Failed to fire step execution event with correlation ID"
                );
                Err(WorkerEventError::PublishError(format!(
                    "Failed to publish correlated step execution event: {e}"
                )))
            }
        }
    }

    /// TAS-65 Phase 1.5b: Fire a step execution event with trace context for distributed tracing
    ///
    /// This propagates trace_id and span_id to FFI handlers for distributed tracing.
    pub async fn fire_step_execution_event_with_trace(
        &self,
        task_sequence_step: &TaskSequenceStep,
        trace_id: Option<String>,
        span_id: Option<String>,
    ) -> Result<StepExecutionEvent, WorkerEventError> {
        let task_uuid = task_sequence_step.task.task.task_uuid;
        let step_uuid = task_sequence_step.workflow_step.workflow_step_uuid;

        debug!(
            worker_id = %self.worker_id,
            task_uuid = %task_uuid,
            step_uuid = %step_uuid,
            step_name = %task_sequence_step.step_definition.name,
            trace_id = ?trace_id,
            span_id = ?span_id,
            "Firing step execution event with trace context"
        );

        // Create step event payload
        let payload = StepEventPayload::new(task_uuid, step_uuid, task_sequence_step.clone());

        // Create event with trace context
        let event = StepExecutionEvent::with_trace_context(
            payload.clone(),
            trace_id.clone(),
            span_id.clone(),
        );
        let event_id = event.event_id;

        // Publish event to FFI handlers
        match self
            .shared_publisher
            .publish_step_execution_event(event.clone())
            .await
        {
            Ok(()) => {
                info!(
                    worker_id = %self.worker_id,
                    event_id = %event_id,
                    step_name = %task_sequence_step.step_definition.name,
                    trace_id = ?trace_id,
                    span_id = ?span_id,
                    "Step execution event with trace context fired successfully to FFI handlers"
                );
                Ok(event)
            }
            Err(e) => {
                error!(
                    worker_id = %self.worker_id,
                    event_id = %event_id,
                    step_name = %task_sequence_step.step_definition.name,
                    error = %e,
                    "Failed to fire step execution event with trace context to FFI handlers"
                );
                Err(WorkerEventError::PublishError(format!(
                    "Failed to publish step execution event with trace context: {e}"
                )))
            }
        }
    }

    /// Get event system statistics for monitoring
    pub fn get_statistics(&self) -> WorkerEventPublisherStats {
        let system_stats = self.event_system.get_statistics();

        WorkerEventPublisherStats {
            worker_id: self.worker_id.clone(),
            events_published: 0, // Would need to track this separately
            ffi_handlers_subscribed: system_stats.step_execution_subscribers,
            completion_subscribers: system_stats.step_completion_subscribers,
            total_events_tracked: system_stats.total_events_tracked,
        }
    }
}

/// Statistics for worker event publisher monitoring
#[derive(Debug, Clone)]
pub struct WorkerEventPublisherStats {
    pub worker_id: String,
    pub events_published: u64,
    pub ffi_handlers_subscribed: usize,
    pub completion_subscribers: usize,
    pub total_events_tracked: usize,
}

/// Errors specific to worker event publishing
#[derive(Debug, thiserror::Error)]
pub enum WorkerEventError {
    #[error("Failed to publish event: {0}")]
    PublishError(String),

    #[error("Invalid event data: {0}")]
    InvalidEventData(String),

    #[error("Context creation error: {0}")]
    ContextError(String),

    #[error("Event system error: {0}")]
    EventSystemError(String),
}
