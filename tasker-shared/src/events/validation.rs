//! Event schema validation for TAS-65 distributed event system
//!
//! Provides JSON Schema-based validation for event payloads to ensure type safety
//! and contract compliance across the distributed system.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during event validation
#[derive(Debug, Clone, Error)]
pub enum EventValidationError {
    /// Invalid JSON Schema definition
    #[error("Invalid JSON Schema for event '{event_name}': {reason}")]
    InvalidSchema { event_name: String, reason: String },

    /// Event not registered in validator
    #[error("Unknown event '{event_name}' - not registered in schema validator")]
    UnknownEvent { event_name: String },

    /// Payload failed validation against schema
    #[error("Event '{event_name}' payload validation failed: {}", errors.join("; "))]
    ValidationFailed {
        event_name: String,
        errors: Vec<String>,
    },
}

/// Event schema validator using JSON Schema
///
/// Compiles and caches JSON Schemas for event validation. Validates event payloads
/// at runtime to ensure they conform to their declared schemas.
///
/// ## Usage
///
/// ```rust,ignore
/// use tasker_shared::events::validation::EventSchemaValidator;
/// use serde_json::json;
///
/// let mut validator = EventSchemaValidator::new();
///
/// // Register an event schema
/// let schema = json!({
///     "type": "object",
///     "properties": {
///         "order_id": {"type": "string"},
///         "amount": {"type": "number"}
///     },
///     "required": ["order_id", "amount"]
/// });
/// validator.register_event_schema("order.created", schema)?;
///
/// // Validate a payload (success)
/// let valid_payload = json!({
///     "order_id": "12345",
///     "amount": 99.99
/// });
/// validator.validate_payload("order.created", &valid_payload)?; // ✓ Success
///
/// // Validate an invalid payload (failure)
/// let invalid_payload = json!({"order_id": "12345"}); // Missing 'amount'
/// let result = validator.validate_payload("order.created", &invalid_payload);
/// assert!(result.is_err()); // ✗ Validation failed
/// ```
#[derive(Debug)]
pub struct EventSchemaValidator {
    schemas: HashMap<String, JSONSchema>,
}

impl EventSchemaValidator {
    /// Create a new event schema validator
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Register an event schema for validation
    ///
    /// Compiles the JSON Schema and stores it for future validation calls.
    /// Schema compilation happens once at registration time for performance.
    ///
    /// # Arguments
    ///
    /// * `event_name` - The event name (e.g., "order.created")
    /// * `schema` - The JSON Schema definition (draft-07 compatible)
    ///
    /// # Returns
    ///
    /// `Ok(())` if schema compiled successfully, `Err` if schema is invalid
    ///
    /// # Errors
    ///
    /// Returns `EventValidationError::InvalidSchema` if the schema is malformed
    /// or fails to compile.
    pub fn register_event_schema(
        &mut self,
        event_name: &str,
        schema: Value,
    ) -> Result<(), EventValidationError> {
        // Compile JSON Schema with draft-07
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| EventValidationError::InvalidSchema {
                event_name: event_name.to_string(),
                reason: e.to_string(),
            })?;

        self.schemas.insert(event_name.to_string(), compiled);
        Ok(())
    }

    /// Validate an event payload against its registered schema
    ///
    /// # Arguments
    ///
    /// * `event_name` - The event name to validate against
    /// * `payload` - The event payload to validate
    ///
    /// # Returns
    ///
    /// `Ok(())` if validation succeeds, `Err` with detailed error information if:
    /// - Event schema not registered
    /// - Payload fails validation
    ///
    /// # Errors
    ///
    /// Returns `EventValidationError::UnknownEvent` if the event is not registered,
    /// or `EventValidationError::ValidationFailed` with details if validation fails.
    pub fn validate_payload(
        &self,
        event_name: &str,
        payload: &Value,
    ) -> Result<(), EventValidationError> {
        // Get the compiled schema
        let schema =
            self.schemas
                .get(event_name)
                .ok_or_else(|| EventValidationError::UnknownEvent {
                    event_name: event_name.to_string(),
                })?;

        // Validate the payload
        let validation_result = schema.validate(payload);

        match validation_result {
            Ok(()) => Ok(()),
            Err(errors) => {
                // Collect all validation errors into a vector
                let error_messages: Vec<String> = errors
                    .map(|e| {
                        format!(
                            "Property '{}': {}",
                            e.instance_path,
                            e.to_string().replace('\n', " ")
                        )
                    })
                    .collect();

                Err(EventValidationError::ValidationFailed {
                    event_name: event_name.to_string(),
                    errors: error_messages,
                })
            }
        }
    }

    /// Check if an event schema is registered
    pub fn has_event(&self, event_name: &str) -> bool {
        self.schemas.contains_key(event_name)
    }

    /// Get the count of registered event schemas
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Clear all registered schemas
    pub fn clear(&mut self) {
        self.schemas.clear();
    }
}

impl Default for EventSchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}
