//! # Event Registry (TAS-65 Phase 2.3a)
//!
//! Pattern-matching event subscription and dispatch system for domain events.
//! Supports exact matches, wildcard patterns, and global subscriptions.
//!
//! ## Features
//!
//! - **Pattern Matching**: Subscribe with exact names or wildcards (`payment.*`, `*`)
//! - **Concurrent Dispatch**: Handlers execute in parallel via `futures::join_all`
//! - **Error Collection**: All handlers execute even if some fail
//! - **Type Safety**: Strong typing for handlers and errors
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use tasker_shared::events::registry::{EventRegistry, EventHandler};
//! use tasker_shared::events::domain_events::{DomainEvent, DomainEventPayload, EventMetadata};
//! use tasker_shared::types::base::TaskSequenceStep;
//! use tasker_shared::messaging::execution_types::StepExecutionResult;
//! use std::sync::Arc;
//! use serde_json::json;
//!
//! # async fn example(
//! #     tss: TaskSequenceStep,
//! #     result: StepExecutionResult,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = EventRegistry::new();
//!
//! // Subscribe to specific event
//! let handler = Arc::new(|event: DomainEvent| {
//!     Box::pin(async move {
//!         println!("Handling: {}", event.event_name);
//!         Ok(())
//!     }) as std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), _>> + Send>>
//! });
//! registry.subscribe("payment.charged", handler)?;
//!
//! // Subscribe with wildcard
//! let wildcard_handler = Arc::new(|event: DomainEvent| {
//!     Box::pin(async move {
//!         println!("Wildcard: {}", event.event_name);
//!         Ok(())
//!     }) as std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), _>> + Send>>
//! });
//! registry.subscribe("payment.*", wildcard_handler)?;
//!
//! // Dispatch event (both handlers will execute)
//! # let event = DomainEvent {
//! #     event_id: uuid::Uuid::new_v4(),
//! #     event_name: "payment.charged".to_string(),
//! #     event_version: "1.0".to_string(),
//! #     payload: DomainEventPayload {
//! #         task_sequence_step: tss,
//! #         execution_result: result,
//! #         payload: json!({}),
//! #     },
//! #     metadata: EventMetadata {
//! #         task_uuid: uuid::Uuid::new_v4(),
//! #         step_uuid: None,
//! #         step_name: None,
//! #         namespace: "test".to_string(),
//! #         correlation_id: uuid::Uuid::new_v4(),
//! #         fired_at: chrono::Utc::now(),
//! #         fired_by: "test".to_string(),
//! #     },
//! # };
//! let errors = registry.dispatch(&event).await;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use super::domain_events::DomainEvent;

/// Event handler function type
///
/// Handlers are async functions that process domain events. They must be:
/// - `Send + Sync` for thread-safe sharing
/// - Return a pinned future for async execution
/// - Return `Result<(), EventHandlerError>` for error handling
pub type EventHandler = Arc<
    dyn Fn(DomainEvent) -> Pin<Box<dyn Future<Output = Result<(), EventHandlerError>> + Send>>
        + Send
        + Sync,
>;

/// Errors that can occur during event registry operations
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Invalid pattern syntax
    #[error("Invalid event pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Duplicate subscription (currently not enforced, reserved for future use)
    #[error("Duplicate subscription for pattern '{pattern}'")]
    DuplicateSubscription { pattern: String },
}

/// Errors that can occur during event handler execution
#[derive(Debug, Clone, Error)]
pub enum EventHandlerError {
    /// Handler execution failed
    #[error("Handler for pattern '{pattern}' failed on event '{event_name}': {reason}")]
    ExecutionFailed {
        event_name: String,
        pattern: String,
        reason: String,
    },

    /// Handler panicked (caught via panic handling)
    #[error("Handler for pattern '{pattern}' panicked on event '{event_name}'")]
    HandlerPanicked { event_name: String, pattern: String },

    /// Generic error for handler failures
    #[error("Handler error: {0}")]
    Generic(String),
}

/// Event registry with pattern-matching subscription system
///
/// Manages event handler subscriptions and dispatches events to matching handlers.
/// Supports exact matches, wildcard patterns, and concurrent handler execution.
///
/// ## Pattern Matching Rules
///
/// - **Exact match**: `"payment.charged"` matches only `"payment.charged"`
/// - **Wildcard**: `"payment.*"` matches `"payment.charged"`, `"payment.failed"`, etc.
/// - **Global**: `"*"` matches all events
///
/// ## Concurrency
///
/// All matching handlers execute concurrently using `futures::join_all`.
/// Errors from individual handlers are collected but don't stop other handlers.
#[derive(Default)]
pub struct EventRegistry {
    /// Map of patterns to handlers
    subscriptions: HashMap<String, Vec<EventHandler>>,
}

impl EventRegistry {
    /// Create a new event registry
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
        }
    }

    /// Subscribe a handler to an event pattern
    ///
    /// # Arguments
    ///
    /// * `pattern` - Event name pattern (exact, wildcard, or global)
    /// * `handler` - Event handler function
    ///
    /// # Returns
    ///
    /// `Ok(())` on success, `Err(RegistryError)` if pattern is invalid
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use tasker_shared::events::registry::EventRegistry;
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut registry = EventRegistry::new();
    ///
    /// // Exact match
    /// let handler = Arc::new(|event| Box::pin(async move { Ok(()) }) as _);
    /// registry.subscribe("payment.charged", handler)?;
    ///
    /// // Wildcard match
    /// let handler2 = Arc::new(|event| Box::pin(async move { Ok(()) }) as _);
    /// registry.subscribe("payment.*", handler2)?;
    ///
    /// // Global match
    /// let handler3 = Arc::new(|event| Box::pin(async move { Ok(()) }) as _);
    /// registry.subscribe("*", handler3)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&mut self, pattern: &str, handler: EventHandler) -> Result<(), RegistryError> {
        // Validate pattern (basic validation)
        if pattern.is_empty() {
            return Err(RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "Pattern cannot be empty".to_string(),
            });
        }

        // Add handler to pattern's handler list
        self.subscriptions
            .entry(pattern.to_string())
            .or_default()
            .push(handler);

        Ok(())
    }

    /// Dispatch an event to all matching handlers
    ///
    /// Finds all handlers whose patterns match the event name, then executes them
    /// concurrently. Returns a vector of errors from failed handlers.
    ///
    /// # Arguments
    ///
    /// * `event` - The domain event to dispatch
    ///
    /// # Returns
    ///
    /// Vector of errors from failed handlers (empty if all succeeded)
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use tasker_shared::events::registry::EventRegistry;
    /// # use tasker_shared::events::domain_events::DomainEvent;
    /// # async fn example(registry: &EventRegistry, event: &DomainEvent) {
    /// let errors = registry.dispatch(event).await;
    /// if !errors.is_empty() {
    ///     eprintln!("Some handlers failed: {:?}", errors);
    /// }
    /// # }
    /// ```
    pub async fn dispatch(&self, event: &DomainEvent) -> Vec<EventHandlerError> {
        // Find all matching handlers
        let mut handlers_to_execute = Vec::new();

        for (pattern, handlers) in &self.subscriptions {
            if self.pattern_matches(pattern, &event.event_name) {
                for handler in handlers {
                    handlers_to_execute.push((pattern.clone(), handler.clone()));
                }
            }
        }

        // Execute all handlers concurrently
        let futures: Vec<_> = handlers_to_execute
            .into_iter()
            .map(|(_pattern, handler)| {
                let event_clone = event.clone();
                async move {
                    // Execute handler and convert errors
                    (handler(event_clone.clone()).await).err()
                }
            })
            .collect();

        // Wait for all handlers to complete
        let results = join_all(futures).await;

        // Collect errors
        results.into_iter().flatten().collect()
    }

    /// Check if a pattern matches an event name
    ///
    /// # Pattern Matching Logic
    ///
    /// - If pattern is `"*"`: matches all events
    /// - If pattern contains `"*"`: split on `.`, compare parts, `*` matches any part
    /// - Otherwise: exact string match
    ///
    /// # Arguments
    ///
    /// * `pattern` - The subscription pattern
    /// * `event_name` - The event name to test
    ///
    /// # Returns
    ///
    /// `true` if pattern matches event name, `false` otherwise
    fn pattern_matches(&self, pattern: &str, event_name: &str) -> bool {
        // Global wildcard matches everything
        if pattern == "*" {
            return true;
        }

        // If pattern contains wildcard, do wildcard matching
        if pattern.contains('*') {
            let pattern_parts: Vec<&str> = pattern.split('.').collect();
            let event_parts: Vec<&str> = event_name.split('.').collect();

            // Must have same number of parts
            if pattern_parts.len() != event_parts.len() {
                return false;
            }

            // Compare each part
            pattern_parts
                .iter()
                .zip(event_parts.iter())
                .all(|(p, e)| p == &"*" || p == e)
        } else {
            // Exact match
            pattern == event_name
        }
    }

    /// Get the number of registered patterns
    pub fn pattern_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Get the total number of handlers across all patterns
    pub fn handler_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    /// Clear all subscriptions
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

// Manual Debug implementation for EventRegistry
impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("pattern_count", &self.pattern_count())
            .field("handler_count", &self.handler_count())
            .finish()
    }
}
