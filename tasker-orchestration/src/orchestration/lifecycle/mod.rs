pub mod result_processing;
pub mod step_enqueuer;
pub mod step_enqueuer_services;
pub mod step_result_processor;

pub mod task_finalization;
pub mod task_initialization;
pub mod task_request_processor;

pub use result_processing::{OrchestrationResultProcessor, StepError};
pub use step_enqueuer::StepEnqueuer;
pub use step_enqueuer_services::{
    AggregatePerformanceMetrics, ContinuousOrchestrationSummary, NamespaceStats,
    PerformanceMetrics, PriorityDistribution, StepEnqueuerService, StepEnqueuerServiceResult,
};
pub use step_result_processor::{StepResultProcessingResult, StepResultProcessor};

pub use task_finalization::{
    FinalizationAction, FinalizationError, FinalizationResult, TaskFinalizer,
};
pub use task_initialization::{TaskInitializationError, TaskInitializationResult, TaskInitializer};
pub use task_request_processor::{
    TaskRequestProcessor, TaskRequestProcessorConfig, TaskRequestProcessorStats,
};
