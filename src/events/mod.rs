pub mod publisher;
pub mod rails_payload;
pub mod types;

// Re-export key types for convenience
pub use publisher::{EventPublisher, EventPublisherConfig, EventPublisherStats, PublishError};
pub use rails_payload::RailsCompatiblePayload;
pub use types::{
    constants, Event, GenericEvent, OrchestrationEvent, StepResult, TaskResult, ViableStep,
};
