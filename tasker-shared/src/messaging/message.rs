//! # Message Structures for pgmq Queues
//!
//! Defines message formats for queue-based workflow orchestration.
//! These replace the Command structures from the TCP system.
//!
//! ## TAS-133 Consolidation
//!
//! As of TAS-133, `StepMessage` uses UUID-based references only.
//! Workers query the database using these UUIDs to get full context.
//! The old embedded-context `StepMessage` has been removed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// Import canonical types from their unified locations
use super::execution_types::StepExecutionError;
use super::orchestration_messages::StepExecutionStatus;

/// Step message with UUID references (workers query DB for context)
///
/// This dramatically reduces message size and complexity by using UUIDs to reference
/// database records instead of embedding full execution context. Workers use
/// the UUIDs to fetch models directly from the shared database.
///
/// ## Benefits
///
/// - 80%+ message size reduction (3 UUIDs vs complex nested JSON)
/// - Eliminates type conversion issues (workers get real database models)
/// - Prevents stale queue messages (UUIDs are globally unique)
/// - Database as single source of truth (no data duplication)
/// - TAS-29: Correlation ID available immediately without database query
///
/// ## TAS-133 Note
///
/// This is the UUID-based step message (previously `SimpleStepMessage`).
/// The old embedded-context format has been removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepMessage {
    /// Task UUID from tasker.tasks.task_uuid column
    pub task_uuid: Uuid,
    /// Step UUID from tasker.workflow_steps.step_uuid column
    pub step_uuid: Uuid,
    /// TAS-29: Correlation ID for distributed tracing (from tasker.tasks.correlation_id)
    pub correlation_id: Uuid,
}

impl StepMessage {
    /// Create a new step message
    pub fn new(task_uuid: Uuid, step_uuid: Uuid, correlation_id: Uuid) -> Self {
        Self {
            task_uuid,
            step_uuid,
            correlation_id,
        }
    }
}

/// Result of step execution for completion tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Step that was executed
    pub step_uuid: Uuid,
    /// Task containing the step
    pub task_uuid: Uuid,
    /// Execution status
    pub status: StepExecutionStatus,
    /// Result data from step execution
    pub result_data: Option<serde_json::Value>,
    /// Error information if step failed
    pub error: Option<StepExecutionError>,
    /// Execution timing
    pub execution_time_ms: u64,
    /// When the step completed
    pub completed_at: chrono::DateTime<chrono::Utc>,
    /// NEW: Rich metadata for orchestration decisions (backoff, retry strategies)
    pub orchestration_metadata: Option<OrchestrationMetadata>,
}

/// Metadata from step execution that informs orchestration decisions
/// This enables intelligent backoff, retry strategies, and workflow coordination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationMetadata {
    /// HTTP response headers from external API calls (e.g., Retry-After, Rate-Limit headers)
    pub headers: HashMap<String, String>,
    /// Error context that triggered this result (e.g., "Rate limited by payment gateway")
    pub error_context: Option<String>,
    /// Explicit backoff hint from handler execution
    pub backoff_hint: Option<BackoffHint>,
    /// Custom domain-specific metadata for orchestration decisions
    pub custom: HashMap<String, serde_json::Value>,
}

/// Backoff hint from handler to orchestration system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffHint {
    /// Type of backoff requested
    pub backoff_type: BackoffHintType,
    /// Suggested delay in seconds
    pub delay_seconds: u32,
    /// Additional context for the backoff decision
    pub context: Option<String>,
}

/// Types of backoff hints handlers can provide
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackoffHintType {
    /// Server explicitly requested backoff (e.g., Retry-After header)
    ServerRequested,
    /// Rate limit detected, suggest exponential backoff
    RateLimit,
    /// Temporary service unavailable
    ServiceUnavailable,
    /// Custom backoff strategy
    Custom,
}

// StepExecutionStatus is now imported from orchestration_messages module

// StepExecutionError is now imported from execution_types module

impl Default for OrchestrationMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationMetadata {
    /// Try to create OrchestrationMetadata from JSON value
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Object(obj) => {
                let headers = obj
                    .get("headers")
                    .and_then(|v| v.as_object())
                    .map(|h| {
                        h.iter()
                            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                            .collect()
                    })
                    .unwrap_or_default();

                let error_context = obj
                    .get("error_context")
                    .and_then(|v| v.as_str())
                    .map(String::from);

                let backoff_hint = obj
                    .get("backoff_hint")
                    .and_then(|v| serde_json::from_value(v.clone()).ok());

                let custom = obj
                    .get("custom")
                    .and_then(|v| v.as_object())
                    .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();

                Some(OrchestrationMetadata {
                    headers,
                    error_context,
                    backoff_hint,
                    custom,
                })
            }
            _ => None,
        }
    }

    /// Create new orchestration metadata
    pub fn new() -> Self {
        Self {
            headers: HashMap::new(),
            error_context: None,
            backoff_hint: None,
            custom: HashMap::new(),
        }
    }

    /// Add HTTP header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Add error context
    pub fn with_error_context(mut self, context: String) -> Self {
        self.error_context = Some(context);
        self
    }

    /// Add backoff hint
    pub fn with_backoff_hint(mut self, hint: BackoffHint) -> Self {
        self.backoff_hint = Some(hint);
        self
    }

    /// Add custom metadata
    pub fn with_custom(mut self, key: String, value: serde_json::Value) -> Self {
        self.custom.insert(key, value);
        self
    }
}

impl BackoffHint {
    /// Create server-requested backoff hint
    pub fn server_requested(delay_seconds: u32, context: Option<String>) -> Self {
        Self {
            backoff_type: BackoffHintType::ServerRequested,
            delay_seconds,
            context,
        }
    }

    /// Create rate limit backoff hint
    pub fn rate_limit(delay_seconds: u32, context: Option<String>) -> Self {
        Self {
            backoff_type: BackoffHintType::RateLimit,
            delay_seconds,
            context,
        }
    }
}

impl StepResult {
    /// Create successful step result
    pub fn success(
        step_uuid: Uuid,
        task_uuid: Uuid,
        result_data: Option<serde_json::Value>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            step_uuid,
            task_uuid,
            status: StepExecutionStatus::Success,
            result_data,
            error: None,
            execution_time_ms,
            completed_at: chrono::Utc::now(),
            orchestration_metadata: None,
        }
    }

    /// Create successful step result with orchestration metadata
    pub fn success_with_metadata(
        step_uuid: Uuid,
        task_uuid: Uuid,
        result_data: Option<serde_json::Value>,
        execution_time_ms: u64,
        orchestration_metadata: OrchestrationMetadata,
    ) -> Self {
        Self {
            step_uuid,
            task_uuid,
            status: StepExecutionStatus::Success,
            result_data,
            error: None,
            execution_time_ms,
            completed_at: chrono::Utc::now(),
            orchestration_metadata: Some(orchestration_metadata),
        }
    }

    /// Create failed step result
    pub fn failed(
        step_uuid: Uuid,
        task_uuid: Uuid,
        error: StepExecutionError,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            step_uuid,
            task_uuid,
            status: StepExecutionStatus::Failed,
            result_data: None,
            error: Some(error),
            execution_time_ms,
            completed_at: chrono::Utc::now(),
            orchestration_metadata: None,
        }
    }

    /// Create failed step result with orchestration metadata
    pub fn failed_with_metadata(
        step_uuid: Uuid,
        task_uuid: Uuid,
        error: StepExecutionError,
        execution_time_ms: u64,
        orchestration_metadata: OrchestrationMetadata,
    ) -> Self {
        Self {
            step_uuid,
            task_uuid,
            status: StepExecutionStatus::Failed,
            result_data: None,
            error: Some(error),
            execution_time_ms,
            completed_at: chrono::Utc::now(),
            orchestration_metadata: Some(orchestration_metadata),
        }
    }

    /// Create timed out step result
    pub fn timed_out(step_uuid: Uuid, task_uuid: Uuid, execution_time_ms: u64) -> Self {
        Self {
            step_uuid,
            task_uuid,
            status: StepExecutionStatus::Timeout,
            result_data: None,
            error: Some(
                StepExecutionError::new("Step execution timed out".to_string(), true)
                    .with_error_type("TimeoutError".to_string()),
            ),
            execution_time_ms,
            completed_at: chrono::Utc::now(),
            orchestration_metadata: None,
        }
    }
}
