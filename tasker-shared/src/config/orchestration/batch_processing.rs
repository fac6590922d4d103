// Re-export BatchProcessingConfig from tasker.rs (TAS-61 pattern)
pub use crate::config::tasker::BatchProcessingConfig;

impl BatchProcessingConfig {
    /// Get the batch size to use, with fallback to default
    pub fn effective_batch_size(&self, template_batch_size: Option<u32>) -> u32 {
        template_batch_size.unwrap_or(self.default_batch_size)
    }

    /// Get the checkpoint interval to use, with fallback to default
    pub fn effective_checkpoint_interval(&self, template_interval: Option<u32>) -> u32 {
        template_interval.unwrap_or(self.checkpoint_interval_default)
    }

    /// Check if batch processing is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get the checkpoint stall duration in seconds
    pub fn checkpoint_stall_seconds(&self) -> u64 {
        (self.checkpoint_stall_minutes as u64) * 60
    }

    /// Validate that a task template is compatible with current batch processing configuration
    ///
    /// ## Usage at Task Acceptance
    ///
    /// This should be called when accepting tasks (POST /v1/tasks) to reject
    /// tasks with batchable steps when batch processing is disabled.
    ///
    /// ```rust,ignore
    /// use tasker_shared::config::BatchProcessingConfig;
    /// use tasker_shared::models::core::task_template::TaskTemplate;
    ///
    /// let config = context.tasker_config.orchestration.batch_processing;
    /// let template = /* resolved from TaskRequest */;
    ///
    /// if let Err(e) = config.validate_template_compatibility(&template) {
    ///     // Return HTTP 422 Unprocessable Entity
    ///     return Err(format!("Task rejected: {}", e));
    /// }
    /// ```
    ///
    /// ## Rationale
    ///
    /// Validation must happen at task acceptance, not during execution:
    /// - By execution time, the task has been accepted and enqueued
    /// - The batchable step has already executed
    /// - Silently skipping batch processing would be a silent failure
    /// - Users would have no visibility into why workers weren't created
    pub fn validate_template_compatibility(
        &self,
        template: &crate::models::core::task_template::TaskTemplate,
    ) -> Result<(), String> {
        use crate::models::core::task_template::StepType;

        // Check if template has any batchable steps
        let has_batchable_steps = template
            .steps
            .iter()
            .any(|step| step.step_type == StepType::Batchable);

        if has_batchable_steps && !self.is_enabled() {
            return Err(format!(
                "Task template '{}/{}:{}' contains batchable steps but batch processing is disabled. \
                Enable 'orchestration.batch_processing.enabled' in configuration or use a different task template.",
                template.namespace_name, template.name, template.version
            ));
        }

        Ok(())
    }
}
