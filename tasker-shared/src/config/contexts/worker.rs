// TAS-50: WorkerConfig - Language-agnostic worker configuration
//
// This configuration is used by all worker languages (Rust/Ruby/Python/WASM).
// It contains worker-specific components:
// - Worker system settings (web API, health monitoring, step processing)
// - Worker event systems (real-time coordination)
// - Worker MPSC channels (command processor, event listeners)
// - Template path with ENV override support (TASKER_TEMPLATE_PATH)
//
// Phase 1 implementation: Full implementation with conversion from TaskerConfig

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigurationContext;
use crate::config::components::WorkerChannelsConfig;
use crate::config::error::ConfigurationError;
use crate::config::event_systems::WorkerEventSystemConfig;
use crate::config::worker::WorkerConfig as LegacyWorkerConfig;
use crate::config::TaskerConfig;

/// Language-agnostic worker configuration
///
/// Contains all configuration needed by worker systems regardless of language:
/// - Worker system behavior (web API, health monitoring)
/// - Event-driven coordination
/// - MPSC channel buffer sizing
/// - Template discovery path
///
/// This configuration is used by:
/// - Rust workers (via tasker-worker library directly)
/// - Ruby workers (via FFI to tasker-worker library)
/// - Python workers (future: via FFI to tasker-worker library)
/// - WASM workers (future: via FFI to tasker-worker library)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker system configuration (web API, health monitoring, step processing)
    pub worker_system: LegacyWorkerConfig,

    /// Worker event system configuration
    pub worker_events: WorkerEventSystemConfig,

    /// MPSC channels configuration for worker
    pub mpsc_channels: WorkerChannelsConfig,

    /// Template path for task handler discovery
    /// Can be overridden by TASKER_TEMPLATE_PATH environment variable
    pub template_path: Option<PathBuf>,

    /// Current environment (cached from common config)
    pub environment: String,
}

impl WorkerConfig {
    /// Get the template path with environment variable override support
    ///
    /// Priority:
    /// 1. TASKER_TEMPLATE_PATH environment variable (if set)
    /// 2. template_path from TOML configuration (if set)
    /// 3. None (no template path configured)
    ///
    /// This allows K8s deployments to override template paths without
    /// modifying TOML files, and enables testing flexibility.
    pub fn effective_template_path(&self) -> Option<PathBuf> {
        // Check for environment variable override first
        if let Ok(env_path) = std::env::var("TASKER_TEMPLATE_PATH") {
            if !env_path.is_empty() {
                return Some(PathBuf::from(env_path));
            }
        }

        // Fall back to TOML configuration
        self.template_path.clone()
    }
}

impl ConfigurationContext for WorkerConfig {
    fn validate(&self) -> Result<(), Vec<ConfigurationError>> {
        let mut errors = Vec::new();

        // Environment validation
        if self.environment.is_empty() {
            errors.push(ConfigurationError::MissingRequiredField {
                field: "environment".to_string(),
                context: "WorkerConfig".to_string(),
            });
        }

        // MPSC channel validation
        if self.mpsc_channels.command_processor.command_buffer_size == 0 {
            errors.push(ConfigurationError::InvalidValue {
                field: "mpsc_channels.command_processor.command_buffer_size".to_string(),
                value: "0".to_string(),
                context: "command_buffer_size must be greater than 0".to_string(),
            });
        }

        // Worker system validation
        if self.worker_system.web.enabled && self.worker_system.web.bind_address.is_empty() {
            errors.push(ConfigurationError::InvalidValue {
                field: "worker_system.web.bind_address".to_string(),
                value: "".to_string(),
                context: "bind_address must not be empty when web API is enabled".to_string(),
            });
        }

        // Template path validation (if set)
        if let Some(path) = &self.template_path {
            if path.as_os_str().is_empty() {
                errors.push(ConfigurationError::InvalidValue {
                    field: "template_path".to_string(),
                    value: "".to_string(),
                    context: "template_path must not be empty if specified".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn environment(&self) -> &str {
        &self.environment
    }

    fn summary(&self) -> String {
        let template_path_str = self
            .effective_template_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not set".to_string());

        format!(
            "WorkerConfig: environment={}, web_enabled={}, event_mode={:?}, template_path={}",
            self.environment,
            self.worker_system.web.enabled,
            self.worker_events.deployment_mode,
            template_path_str
        )
    }
}

impl From<&TaskerConfig> for WorkerConfig {
    /// Convert legacy TaskerConfig to WorkerConfig
    ///
    /// This conversion extracts only the worker-specific configuration fields
    /// from the monolithic TaskerConfig structure.
    ///
    /// Note: template_path is initially None and can be set via environment
    /// variable TASKER_TEMPLATE_PATH at runtime.
    fn from(config: &TaskerConfig) -> Self {
        Self {
            worker_system: config.worker.clone().unwrap_or_default(),
            worker_events: config.event_systems.worker.clone(),
            mpsc_channels: config.mpsc_channels.worker.clone(),
            template_path: None, // Set via TASKER_TEMPLATE_PATH env var or future TOML config
            environment: config.execution.environment.clone(),
        }
    }
}
