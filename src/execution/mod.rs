pub mod message_protocols;
pub mod zeromq_pub_sub_executor;

pub use message_protocols::{
    StepBatchRequest, StepBatchResponse, StepExecutionRequest, StepExecutionResult,
};
// Note: BatchMessage, BatchPublisher, etc. have been replaced by ZmqPubSubExecutor
// which provides superior database integration and comprehensive batch tracking
pub use zeromq_pub_sub_executor::ZmqPubSubExecutor;
