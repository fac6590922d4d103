//! Worker resource validation

use anyhow::Result;

use crate::{
    config::WorkerConfig,
    error::{WorkerError},
};

/// Worker resource validator
pub struct WorkerResourceValidator {
    config: WorkerConfig,
}

impl WorkerResourceValidator {
    /// Create new resource validator
    pub async fn new(config: &WorkerConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Validate startup resources
    pub async fn validate_startup(&self) -> crate::error::Result<()> {
        // Check basic resource availability
        self.validate_database_connections().await?;
        self.validate_memory_usage().await?;
        Ok(())
    }

    /// Validate database connections
    pub async fn validate_database_connections(&self) -> crate::error::Result<()> {
        // TODO: Implement database connection validation
        Ok(())
    }

    /// Validate memory usage
    pub async fn validate_memory_usage(&self) -> crate::error::Result<()> {
        // TODO: Implement memory usage validation
        Ok(())
    }

    /// Validate CPU usage
    pub async fn validate_cpu_usage(&self) -> crate::error::Result<()> {
        // TODO: Implement CPU usage validation
        Ok(())
    }

    /// Validate pool resources
    pub async fn validate_pool_resources(&self, namespace: &str, pool_size: usize) -> crate::error::Result<()> {
        if pool_size > self.config.step_executor_pool.max_pool_size {
            return Err(WorkerError::ResourceLimit(format!(
                "Pool size {} exceeds maximum {} for namespace {}",
                pool_size, self.config.step_executor_pool.max_pool_size, namespace
            )));
        }
        Ok(())
    }
}