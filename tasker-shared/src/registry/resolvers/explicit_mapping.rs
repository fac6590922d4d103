//! # Explicit Mapping Resolver
//!
//! TAS-93: Direct key-to-handler mapping resolver.
//!
//! This resolver provides the highest-priority resolution strategy by mapping
//! explicit callable keys to handler instances or factories. It mirrors the
//! existing Rust registry pattern and is checked first in the resolver chain.
//!
//! ## Priority
//!
//! Priority: **10** (checked first in the resolver chain)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tasker_shared::registry::resolvers::ExplicitMappingResolver;
//! use std::sync::Arc;
//!
//! let resolver = ExplicitMappingResolver::new();
//!
//! // Register a handler instance directly
//! resolver.register_instance("my_handler", Arc::new(MyHandler::new()));
//!
//! // Register a factory function
//! resolver.register("configurable_handler", |ctx| {
//!     let timeout = ctx.initialization.get("timeout_ms")
//!         .and_then(|v| v.as_i64())
//!         .unwrap_or(5000);
//!     Arc::new(ConfigurableHandler::with_timeout(timeout))
//! });
//! ```
//!
//! ## When to Use
//!
//! Use explicit mapping when:
//! - You want deterministic, fast resolution
//! - The callable is a simple key (not a class path)
//! - You need to control handler instantiation

use crate::models::core::task_template::HandlerDefinition;
use crate::registry::{ResolutionContext, ResolvedHandler, StepHandlerResolver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Type alias for handler factory functions.
///
/// Factories receive the resolution context and return a handler instance.
/// Use factories when handlers need initialization parameters.
pub type HandlerFactory = Box<dyn Fn(&ResolutionContext) -> Arc<dyn ResolvedHandler> + Send + Sync>;

/// Entry in the handler registry - either an instance or a factory.
enum RegistryEntry {
    /// Pre-instantiated handler (shared across all resolutions)
    Instance(Arc<dyn ResolvedHandler>),

    /// Factory that creates handlers on demand
    Factory(HandlerFactory),
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Instance(h) => write!(f, "Instance({})", h.name()),
            RegistryEntry::Factory(_) => write!(f, "Factory(...)"),
        }
    }
}

/// Explicit mapping resolver for direct key-to-handler lookup.
///
/// This resolver maintains a thread-safe mapping of callable keys to handlers.
/// It supports both pre-instantiated handlers and factory functions for
/// deferred instantiation.
///
/// ## Thread Safety
///
/// Uses `RwLock` for safe concurrent access. Reads are lock-free when no
/// writes are in progress.
pub struct ExplicitMappingResolver {
    /// Handler mappings keyed by callable string
    mappings: RwLock<HashMap<String, RegistryEntry>>,

    /// Resolver name for logging
    name: String,
}

impl fmt::Debug for ExplicitMappingResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mappings = self.mappings.read().unwrap();
        f.debug_struct("ExplicitMappingResolver")
            .field("name", &self.name)
            .field("registered_handlers", &mappings.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ExplicitMappingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplicitMappingResolver {
    /// Create a new explicit mapping resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: RwLock::new(HashMap::new()),
            name: "ExplicitMappingResolver".to_string(),
        }
    }

    /// Create a resolver with a custom name.
    ///
    /// Useful when multiple explicit mapping resolvers are in the chain.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            mappings: RwLock::new(HashMap::new()),
            name: name.into(),
        }
    }

    /// Register a pre-instantiated handler.
    ///
    /// The handler will be shared across all resolutions of this key.
    /// Use this for stateless handlers or when sharing state is desired.
    ///
    /// # Arguments
    ///
    /// * `key` - The callable string to register
    /// * `handler` - The handler instance to return for this key
    pub fn register_instance(&self, key: impl Into<String>, handler: Arc<dyn ResolvedHandler>) {
        self.mappings
            .write()
            .unwrap()
            .insert(key.into(), RegistryEntry::Instance(handler));
    }

    /// Register a handler factory.
    ///
    /// The factory is called each time this key is resolved, allowing
    /// for per-resolution configuration based on the context.
    ///
    /// # Arguments
    ///
    /// * `key` - The callable string to register
    /// * `factory` - Function that creates handler instances
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// resolver.register("timeout_handler", |ctx| {
    ///     let timeout = ctx.initialization.get("timeout_ms")
    ///         .and_then(|v| v.as_i64())
    ///         .unwrap_or(5000);
    ///     Arc::new(TimeoutHandler::new(timeout as u64))
    /// });
    /// ```
    pub fn register<F>(&self, key: impl Into<String>, factory: F)
    where
        F: Fn(&ResolutionContext) -> Arc<dyn ResolvedHandler> + Send + Sync + 'static,
    {
        self.mappings
            .write()
            .unwrap()
            .insert(key.into(), RegistryEntry::Factory(Box::new(factory)));
    }

    /// Unregister a handler.
    ///
    /// Returns `true` if a handler was removed, `false` if the key wasn't registered.
    pub fn unregister(&self, key: &str) -> bool {
        self.mappings.write().unwrap().remove(key).is_some()
    }

    /// Check if a key is registered.
    #[must_use]
    pub fn is_registered(&self, key: &str) -> bool {
        self.mappings.read().unwrap().contains_key(key)
    }

    /// Get the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.read().unwrap().len()
    }

    /// Check if the resolver has no registered handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.read().unwrap().is_empty()
    }

    /// Get all registered keys.
    #[must_use]
    pub fn registered_keys(&self) -> Vec<String> {
        self.mappings.read().unwrap().keys().cloned().collect()
    }

    /// Clear all registered handlers.
    pub fn clear(&self) {
        self.mappings.write().unwrap().clear();
    }
}

#[async_trait]
impl StepHandlerResolver for ExplicitMappingResolver {
    fn can_resolve(&self, definition: &HandlerDefinition) -> bool {
        self.mappings
            .read()
            .unwrap()
            .contains_key(&definition.callable)
    }

    async fn resolve(
        &self,
        definition: &HandlerDefinition,
        context: &ResolutionContext,
    ) -> Option<Arc<dyn ResolvedHandler>> {
        let mappings = self.mappings.read().unwrap();
        let entry = mappings.get(&definition.callable)?;

        Some(match entry {
            RegistryEntry::Instance(handler) => Arc::clone(handler),
            RegistryEntry::Factory(factory) => factory(context),
        })
    }

    fn resolver_name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        10 // Highest priority - checked first
    }

    fn registered_callables(&self) -> Vec<String> {
        self.registered_keys()
    }
}
