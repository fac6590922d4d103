//! Batch Execution Command Handler (Stub)

use async_trait::async_trait;
use crate::execution::command::{Command, CommandType};
use crate::execution::command_router::CommandHandler;

/// Handler for batch execution commands (placeholder implementation)
pub struct BatchExecutionHandler;

impl BatchExecutionHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler for BatchExecutionHandler {
    async fn handle_command(&self, _command: Command) -> Result<Option<Command>, Box<dyn std::error::Error + Send + Sync>> {
        // TODO: Implement batch execution logic
        Ok(None)
    }

    fn handler_name(&self) -> &str {
        "BatchExecutionHandler"
    }

    fn supported_commands(&self) -> Vec<CommandType> {
        vec![CommandType::ExecuteBatch]
    }
}