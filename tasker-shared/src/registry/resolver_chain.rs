//! # Resolver Chain
//!
//! TAS-93: Priority-ordered chain of step handler resolvers.
//!
//! The resolver chain manages multiple resolvers and routes handler definitions
//! to the appropriate resolver based on priority and resolver hints.
//!
//! ## Resolution Flow
//!
//! ```text
//! HandlerDefinition ─────┐
//!                        │
//!                   ┌────▼────┐
//!            has    │ Check   │  no
//!   ┌───────hint?───┤ Hint    ├────────────┐
//!   │               └─────────┘            │
//!   │                                      │
//! ┌─▼─────────────┐               ┌────────▼──────────┐
//! │ Find resolver │               │ Iterate by        │
//! │ by name       │               │ priority          │
//! └───────┬───────┘               └────────┬──────────┘
//!         │                                │
//!         ▼                                ▼
//!   ┌─────────────┐               ┌─────────────────────┐
//!   │ Direct      │               │ Try each resolver   │
//!   │ resolution  │               │ that can_resolve()  │
//!   └─────────────┘               └─────────────────────┘
//! ```
//!
//! ## Priority System
//!
//! Resolvers are tried in priority order (lower = checked first):
//! - 10: ExplicitMappingResolver (direct key lookup)
//! - 20-99: Custom resolvers (domain-specific patterns)
//! - 100: ClassConstantResolver (fallback class path lookup)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use tasker_shared::registry::{ResolverChain, StepHandlerResolver};
//! use std::sync::Arc;
//!
//! // Create chain with custom resolvers
//! let chain = ResolverChain::new()
//!     .with_resolver(Arc::new(ExplicitMappingResolver::new()))
//!     .with_resolver(Arc::new(PaymentHandlerResolver::new()))
//!     .with_resolver(Arc::new(ClassConstantResolver::new()));
//!
//! // Resolve a handler definition
//! let definition = HandlerDefinition::builder()
//!     .callable("payments:stripe:refund")
//!     .build();
//! let context = ResolutionContext::default();
//!
//! match chain.resolve(&definition, &context).await {
//!     Ok(handler) => println!("Resolved: {}", handler.name()),
//!     Err(error) => eprintln!("Failed: {}", error),
//! }
//! ```

use crate::models::core::task_template::HandlerDefinition;

use super::step_handler_resolver::{
    ResolutionContext, ResolutionError, ResolvedHandler, StepHandlerResolver,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// A priority-ordered chain of step handler resolvers.
///
/// The resolver chain manages multiple resolvers and coordinates handler
/// resolution through either hint-based direct routing or priority-ordered
/// iteration.
///
/// ## Thread Safety
///
/// `ResolverChain` is `Send + Sync` since it only holds `Arc` references
/// to resolvers. Resolvers can be added via `with_resolver()` during
/// construction (builder pattern).
#[derive(Debug, Default)]
pub struct ResolverChain {
    /// Resolvers ordered by priority (lower priority = earlier in vec)
    resolvers: Vec<Arc<dyn StepHandlerResolver>>,

    /// Index by resolver name for hint-based bypass
    resolvers_by_name: HashMap<String, Arc<dyn StepHandlerResolver>>,
}

impl ResolverChain {
    /// Create a new empty resolver chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolver to the chain.
    ///
    /// Resolvers are automatically sorted by priority (lower = checked first).
    /// This method consumes self and returns it, enabling builder pattern usage.
    ///
    /// # Arguments
    ///
    /// * `resolver` - The resolver to add
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn StepHandlerResolver>) -> Self {
        let name = resolver.resolver_name().to_string();
        self.resolvers_by_name.insert(name, Arc::clone(&resolver));
        self.resolvers.push(resolver);
        self.sort_by_priority();
        self
    }

    /// Add a resolver to an existing chain (mutable).
    ///
    /// This is useful when you need to add resolvers dynamically after
    /// initial construction.
    pub fn add_resolver(&mut self, resolver: Arc<dyn StepHandlerResolver>) {
        let name = resolver.resolver_name().to_string();
        self.resolvers_by_name.insert(name, Arc::clone(&resolver));
        self.resolvers.push(resolver);
        self.sort_by_priority();
    }

    /// Sort resolvers by priority (lower = earlier).
    fn sort_by_priority(&mut self) {
        self.resolvers.sort_by_key(|r| r.priority());
    }

    /// Get the number of resolvers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Check if the chain has no resolvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Get resolver names in priority order.
    #[must_use]
    pub fn resolver_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.resolver_name()).collect()
    }

    /// Check if a resolver with the given name exists.
    #[must_use]
    pub fn has_resolver(&self, name: &str) -> bool {
        self.resolvers_by_name.contains_key(name)
    }

    /// Check if any resolver in the chain can resolve the given definition.
    ///
    /// This is a quick check without actually performing resolution.
    #[must_use]
    pub fn can_resolve(&self, definition: &HandlerDefinition) -> bool {
        // If hint is provided, check if that resolver can handle it
        if let Some(ref resolver_name) = definition.resolver {
            if let Some(resolver) = self.resolvers_by_name.get(resolver_name) {
                return resolver.can_resolve(definition);
            }
            return false;
        }

        // Otherwise, check if any resolver can handle it
        self.resolvers.iter().any(|r| r.can_resolve(definition))
    }

    /// Get all callable keys that are registered with any resolver.
    ///
    /// This aggregates registered callables from all resolvers that support
    /// introspection via the `registered_callables` method.
    #[must_use]
    pub fn registered_callables(&self) -> Vec<String> {
        let mut callables = Vec::new();
        for resolver in &self.resolvers {
            callables.extend(resolver.registered_callables());
        }
        callables.sort();
        callables.dedup();
        callables
    }

    /// Resolve a handler definition to a handler instance.
    ///
    /// Resolution flow:
    /// 1. If `definition.resolver` is set, use hint-based bypass
    /// 2. Otherwise, iterate through resolvers by priority
    /// 3. Return the first successful resolution, or an error if none succeed
    ///
    /// # Arguments
    ///
    /// * `definition` - The handler definition to resolve
    /// * `context` - Additional context for resolution
    ///
    /// # Returns
    ///
    /// A handler instance, or an error if resolution failed.
    #[instrument(
        skip(self, context),
        fields(
            callable = %definition.callable,
            resolver_hint = ?definition.resolver,
        )
    )]
    pub async fn resolve(
        &self,
        definition: &HandlerDefinition,
        context: &ResolutionContext,
    ) -> Result<Arc<dyn ResolvedHandler>, ResolutionError> {
        // Check for hint-based bypass
        if let Some(ref resolver_name) = definition.resolver {
            return self
                .resolve_with_hint(definition, context, resolver_name)
                .await;
        }

        // Iterate through resolvers by priority
        self.resolve_by_priority(definition, context).await
    }

    /// Resolve using a specific resolver (hint-based bypass).
    async fn resolve_with_hint(
        &self,
        definition: &HandlerDefinition,
        context: &ResolutionContext,
        resolver_name: &str,
    ) -> Result<Arc<dyn ResolvedHandler>, ResolutionError> {
        debug!(resolver = resolver_name, "Using hint-based resolver bypass");

        let resolver = self.resolvers_by_name.get(resolver_name).ok_or_else(|| {
            ResolutionError::new(
                &definition.callable,
                format!("Resolver '{}' not found in chain", resolver_name),
            )
            .with_hint(format!(
                "Available resolvers: {}",
                self.resolver_names().join(", ")
            ))
        })?;

        // Check if the resolver can handle this definition
        if !resolver.can_resolve(definition) {
            warn!(
                resolver = resolver_name,
                callable = %definition.callable,
                "Hinted resolver cannot handle this callable"
            );
            return Err(ResolutionError::new(
                &definition.callable,
                format!(
                    "Resolver '{}' cannot handle callable '{}'",
                    resolver_name, definition.callable
                ),
            )
            .with_tried_resolver(resolver_name.to_string())
            .with_hint("The resolver hint may be incorrect for this callable format"));
        }

        // Attempt resolution
        resolver.resolve(definition, context).await.ok_or_else(|| {
            ResolutionError::new(
                &definition.callable,
                format!(
                    "Resolver '{}' could not resolve callable '{}'",
                    resolver_name, definition.callable
                ),
            )
            .with_tried_resolver(resolver_name.to_string())
        })
    }

    /// Resolve by iterating through resolvers in priority order.
    async fn resolve_by_priority(
        &self,
        definition: &HandlerDefinition,
        context: &ResolutionContext,
    ) -> Result<Arc<dyn ResolvedHandler>, ResolutionError> {
        let mut tried_resolvers = Vec::new();

        for resolver in &self.resolvers {
            let resolver_name = resolver.resolver_name();

            // Quick check if resolver can handle this format
            if !resolver.can_resolve(definition) {
                trace!(
                    resolver = resolver_name,
                    callable = %definition.callable,
                    "Resolver cannot handle this callable format"
                );
                continue;
            }

            tried_resolvers.push(resolver_name.to_string());
            debug!(
                resolver = resolver_name,
                callable = %definition.callable,
                "Attempting resolution"
            );

            // Attempt resolution
            if let Some(handler) = resolver.resolve(definition, context).await {
                debug!(
                    resolver = resolver_name,
                    handler = handler.name(),
                    "Successfully resolved handler"
                );
                return Ok(handler);
            }

            trace!(
                resolver = resolver_name,
                "Resolution returned None, trying next resolver"
            );
        }

        // No resolver could handle it
        Err(ResolutionError::no_resolver_found(
            &definition.callable,
            tried_resolvers,
        ))
    }

    /// Get statistics about resolver usage.
    #[must_use]
    pub fn stats(&self) -> ResolverChainStats {
        ResolverChainStats {
            resolver_count: self.resolvers.len(),
            resolver_names: self
                .resolver_names()
                .into_iter()
                .map(String::from)
                .collect(),
            priorities: self.resolvers.iter().map(|r| r.priority()).collect(),
        }
    }
}

/// Statistics about a resolver chain.
#[derive(Debug, Clone)]
pub struct ResolverChainStats {
    /// Number of resolvers in the chain
    pub resolver_count: usize,

    /// Names of resolvers in priority order
    pub resolver_names: Vec<String>,

    /// Priorities of resolvers in order
    pub priorities: Vec<u32>,
}
