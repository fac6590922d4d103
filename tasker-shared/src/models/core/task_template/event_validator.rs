//! # TAS-65 Phase 1.2: Event Publication Validator
//!
//! Validates event declarations at template load time.
//!
//! ## Overview
//!
//! The EventPublicationValidator ensures that all event declarations in a task template
//! are valid before the template is used. This prevents runtime errors and provides
//! clear feedback during template loading.
//!
//! ## Validation Rules
//!
//! For each event declaration:
//! - Event name must follow dot notation (namespace.action)
//! - JSON Schema must be valid and compilable
//! - Custom publisher names must be valid Ruby class names
//! - No duplicate event names within a step
//!
//! For the entire template:
//! - All step event declarations must be valid
//! - Event names should be unique within a step (warning if duplicates)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasker_shared::models::core::task_template::{TaskTemplate, EventPublicationValidator};
//!
//! # fn example(template: TaskTemplate) -> Result<(), String> {
//! // Validate all event declarations in the template
//! EventPublicationValidator::validate_template(&template)?;
//! # Ok(())
//! # }
//! ```

use super::{EventDeclaration, StepDefinition, TaskTemplate};
use std::collections::HashSet;

/// Validation result with detailed error information
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether validation passed
    pub valid: bool,
    /// Validation errors (if any)
    pub errors: Vec<ValidationError>,
    /// Validation warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a failed validation result with errors
    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Add a warning to the result
    pub fn with_warning(mut self, warning: ValidationWarning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Add multiple warnings to the result
    pub fn with_warnings(mut self, warnings: Vec<ValidationWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Convert to a Result type for easier error handling
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.valid {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

/// Validation error with context
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Step name where the error occurred
    pub step_name: String,
    /// Event name that failed validation (if applicable)
    pub event_name: Option<String>,
    /// Error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(step_name: String, event_name: Option<String>, message: String) -> Self {
        Self {
            step_name,
            event_name,
            message,
        }
    }

    /// Create an error for a specific event
    pub fn event_error(step_name: String, event_name: String, message: String) -> Self {
        Self::new(step_name, Some(event_name), message)
    }

    /// Create an error for a step (not event-specific)
    pub fn step_error(step_name: String, message: String) -> Self {
        Self::new(step_name, None, message)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(event_name) = &self.event_name {
            write!(
                f,
                "Step '{}', Event '{}': {}",
                self.step_name, event_name, self.message
            )
        } else {
            write!(f, "Step '{}': {}", self.step_name, self.message)
        }
    }
}

/// Validation warning (non-fatal)
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// Step name where the warning occurred
    pub step_name: String,
    /// Warning message
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(step_name: String, message: String) -> Self {
        Self {
            step_name,
            message,
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step '{}': {}", self.step_name, self.message)
    }
}

/// Event publication validator
///
/// Validates event declarations at template load time to ensure all
/// events are properly configured before template execution.
#[derive(Debug)]
pub struct EventPublicationValidator;

impl EventPublicationValidator {
    /// Validate all event declarations in a task template
    ///
    /// # Arguments
    ///
    /// * `template` - The task template to validate
    ///
    /// # Returns
    ///
    /// A `ValidationResult` containing any errors or warnings
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use tasker_shared::models::core::task_template::{TaskTemplate, EventPublicationValidator};
    ///
    /// # fn example(template: TaskTemplate) -> Result<(), String> {
    /// let result = EventPublicationValidator::validate_template(&template);
    ///
    /// if !result.valid {
    ///     for error in &result.errors {
    ///         eprintln!("Error: {}", error);
    ///     }
    ///     return Err("Template validation failed".to_string());
    /// }
    ///
    /// for warning in &result.warnings {
    ///     eprintln!("Warning: {}", warning);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn validate_template(template: &TaskTemplate) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for step in &template.steps {
            let step_result = Self::validate_step(step);
            errors.extend(step_result.errors);
            warnings.extend(step_result.warnings);
        }

        if errors.is_empty() {
            ValidationResult::success().with_warnings(warnings)
        } else {
            ValidationResult::failure(errors).with_warnings(warnings)
        }
    }

    /// Validate event declarations for a single step
    ///
    /// # Arguments
    ///
    /// * `step` - The step definition to validate
    ///
    /// # Returns
    ///
    /// A `ValidationResult` for this step's events
    pub fn validate_step(step: &StepDefinition) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // Skip validation if no events declared
        if step.publishes_events.is_empty() {
            return ValidationResult::success();
        }

        // Track event names to detect duplicates
        let mut seen_events = HashSet::new();

        for event in &step.publishes_events {
            // Validate individual event
            if let Err(error_msg) = event.validate() {
                errors.push(ValidationError::event_error(
                    step.name.clone(),
                    event.name.clone(),
                    error_msg,
                ));
                continue; // Skip duplicate check if event is invalid
            }

            // Check for duplicate event names
            if !seen_events.insert(event.name.clone()) {
                warnings.push(ValidationWarning::new(
                    step.name.clone(),
                    format!(
                        "Duplicate event name '{}' - only the last declaration will be used",
                        event.name
                    ),
                ));
            }
        }

        if errors.is_empty() {
            ValidationResult::success().with_warnings(warnings)
        } else {
            ValidationResult::failure(errors).with_warnings(warnings)
        }
    }

    /// Validate a single event declaration
    ///
    /// # Arguments
    ///
    /// * `event` - The event declaration to validate
    /// * `step_name` - The name of the step containing this event
    ///
    /// # Returns
    ///
    /// `Ok(())` if valid, `Err(ValidationError)` otherwise
    pub fn validate_event(event: &EventDeclaration, step_name: &str) -> Result<(), ValidationError> {
        event.validate().map_err(|error_msg| {
            ValidationError::event_error(step_name.to_string(), event.name.clone(), error_msg)
        })
    }
}
