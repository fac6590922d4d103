//! Worker health monitoring

use std::sync::Arc;
use tokio::sync::RwLock;
use std::collections::HashMap;
use anyhow::Result;

use crate::{
    config::WorkerConfig,
    worker::coordinator::NamespaceMetrics,
};

/// Worker health monitor
pub struct WorkerHealthMonitor {
    config: WorkerConfig,
    namespace_metrics: Arc<RwLock<HashMap<String, NamespaceMetrics>>>,
}

impl WorkerHealthMonitor {
    /// Create new health monitor
    pub async fn new(config: &WorkerConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            namespace_metrics: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Start health monitoring
    pub async fn start(&self) -> Result<()> {
        // TODO: Implement health monitoring startup
        Ok(())
    }

    /// Stop health monitoring
    pub async fn stop(&self) -> Result<()> {
        // TODO: Implement health monitoring shutdown
        Ok(())
    }

    /// Record namespace metrics
    pub async fn record_namespace_metrics(&self, namespace: &str, metrics: NamespaceMetrics) {
        let mut metrics_map = self.namespace_metrics.write().await;
        metrics_map.insert(namespace.to_string(), metrics);
    }

    /// Get namespace metrics
    pub async fn get_namespace_metrics(&self, namespace: &str) -> crate::error::Result<NamespaceMetrics> {
        let metrics_map = self.namespace_metrics.read().await;
        metrics_map
            .get(namespace)
            .cloned()
            .ok_or_else(|| crate::error::WorkerError::Other(anyhow::anyhow!("Namespace metrics not found: {}", namespace)))
    }

    /// Check system health
    pub async fn check_system_health(&self) -> Result<()> {
        // TODO: Implement comprehensive health checking
        Ok(())
    }
}