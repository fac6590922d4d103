//! Step Enqueuer Services Module
//!
//! Service-oriented architecture for step enqueueing with clear separation of concerns:
//!
//! - **Types**: Result types, statistics, and metrics
//! - **StateHandlers**: State-specific processing logic
//! - **TaskProcessor**: Single task processing
//! - **BatchProcessor**: Batch processing orchestration
//! - **Summary**: Continuous orchestration summary management
//! - **Service**: Main orchestration service composition

pub use service::StepEnqueuerService;
pub use types::*;

mod batch_processor;
mod service;
mod state_handlers;
mod summary;
mod task_processor;
mod types;
