//! # Class Constant Resolver
//!
//! TAS-93: Fallback resolver for class-path style callables.
//!
//! This resolver is the last in the chain and attempts to resolve callables
//! that look like class paths (e.g., "MyApp::Handlers::PaymentHandler").
//!
//! ## Rust Implementation
//!
//! In Rust, runtime class lookup is not possible. This resolver serves as:
//! - A fallback that logs warnings for unresolved class-path callables
//! - A placeholder for consistency with Ruby/Python workers
//! - Documentation of the expected callable format
//!
//! ## Priority
//!
//! Priority: **100** (checked last in the resolver chain)
//!
//! ## When This Resolver Runs
//!
//! This resolver runs when:
//! 1. No explicit mapping was found for the callable
//! 2. No custom resolver matched the callable format
//!
//! ## Class Path Formats
//!
//! Recognized class path formats (for logging purposes):
//! - Ruby style: `MyApp::Handlers::PaymentHandler`
//! - Python style: `myapp.handlers.PaymentHandler`
//! - Rust style: `myapp::handlers::PaymentHandler`
//!
//! ## What to Do When Resolution Fails
//!
//! If you're seeing warnings from this resolver, you need to:
//! 1. Register the handler explicitly with `ExplicitMappingResolver`
//! 2. Create a custom resolver for your callable format
//! 3. Use a resolver hint in the YAML to bypass the chain

use crate::models::core::task_template::HandlerDefinition;
use crate::registry::{ResolutionContext, ResolvedHandler, StepHandlerResolver};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Resolver for class-path style callables.
///
/// In Rust, this resolver always returns `None` since runtime class
/// instantiation is not possible. It logs warnings when callables
/// look like class paths to help developers debug resolution failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassConstantResolver;

impl ClassConstantResolver {
    /// Create a new class constant resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check if a callable looks like a class path.
    ///
    /// Returns `true` for callables that match common class path patterns:
    /// - Contains `::` (Ruby/Rust style)
    /// - Contains `.` and starts with lowercase (Python style)
    /// - Starts with uppercase letter (likely a class name)
    #[must_use]
    pub fn looks_like_class_path(callable: &str) -> bool {
        // Empty or simple names don't look like class paths
        if callable.is_empty() {
            return false;
        }

        // Ruby/Rust style: Foo::Bar::Handler
        if callable.contains("::") {
            return true;
        }

        // Python style: foo.bar.Handler
        if callable.contains('.') {
            return true;
        }

        // Starts with uppercase and contains no special characters
        // (likely intended to be a class name)
        if callable
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
            && callable.chars().all(|c| c.is_alphanumeric() || c == '_')
        {
            return true;
        }

        false
    }

    /// Get the likely language based on callable format.
    #[must_use]
    pub fn detect_callable_style(callable: &str) -> &'static str {
        if callable.contains("::") {
            if callable
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
            {
                "Ruby"
            } else {
                "Rust"
            }
        } else if callable.contains('.') {
            "Python"
        } else {
            "Unknown"
        }
    }
}

#[async_trait]
impl StepHandlerResolver for ClassConstantResolver {
    fn can_resolve(&self, definition: &HandlerDefinition) -> bool {
        // In Rust, we can never actually resolve class paths at runtime
        // But we return true for class-path-like callables so we can log a warning
        Self::looks_like_class_path(&definition.callable)
    }

    async fn resolve(
        &self,
        definition: &HandlerDefinition,
        _context: &ResolutionContext,
    ) -> Option<Arc<dyn ResolvedHandler>> {
        // Log a warning to help developers understand why resolution failed
        let style = Self::detect_callable_style(&definition.callable);
        warn!(
            callable = %definition.callable,
            style = style,
            "ClassConstantResolver cannot resolve class paths in Rust. \
             Register the handler explicitly with ExplicitMappingResolver \
             or use a custom resolver."
        );

        // Rust cannot do runtime class instantiation
        None
    }

    fn resolver_name(&self) -> &str {
        "ClassConstantResolver"
    }

    fn priority(&self) -> u32 {
        100 // Lowest priority - checked last
    }
}
