//! Result Aggregation Command Handler (Stub)

use async_trait::async_trait;
use crate::execution::command::{Command, CommandType};
use crate::execution::command_router::CommandHandler;

/// Handler for result aggregation commands (placeholder implementation)
pub struct ResultAggregationHandler;

impl ResultAggregationHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler for ResultAggregationHandler {
    async fn handle_command(&self, _command: Command) -> Result<Option<Command>, Box<dyn std::error::Error + Send + Sync>> {
        // TODO: Implement result aggregation logic
        Ok(None)
    }

    fn handler_name(&self) -> &str {
        "ResultAggregationHandler"
    }

    fn supported_commands(&self) -> Vec<CommandType> {
        vec![CommandType::ReportPartialResult, CommandType::ReportBatchCompletion]
    }
}