//! # Resource-Based Authorization Types
//!
//! Defines resources and actions for protocol-agnostic authorization.
//! Routes declare which resource+action they protect, and the authorization
//! wrapper checks permissions before invoking handlers.
//!
//! This module provides a declarative approach where routes specify:
//! ```rust,ignore
//! .route("/tasks", post(authorize(Resource::Tasks, Action::Create, handler)))
//! ```
//!
//! The `ResourceAction` resolves to the appropriate `Permission` enum variant.

use super::permissions::Permission;
use std::fmt;

/// Resources in the system.
///
/// Each resource maps to a permission prefix (e.g., `Resource::Tasks` â†’ `"tasks:*"`).
/// Public resources (Health, Metrics, Docs) don't require authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Task management (`tasks:*`)
    Tasks,
    /// Workflow step operations (`steps:*`)
    Steps,
    /// Dead letter queue (`dlq:*`)
    Dlq,
    /// Task templates (`templates:*`)
    Templates,
    /// System administration (`system:*`)
    System,
    /// Worker-specific operations (`worker:*`)
    Worker,
    /// Health endpoints - public, no auth required
    Health,
    /// Metrics endpoints - public, no auth required
    Metrics,
    /// API documentation - public, no auth required
    Docs,
}

impl Resource {
    /// Check if this resource is public (no authentication required).
    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Health | Self::Metrics | Self::Docs)
    }

    /// Get the permission prefix for this resource.
    #[must_use]
    pub const fn permission_prefix(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Steps => "steps",
            Self::Dlq => "dlq",
            Self::Templates => "templates",
            Self::System => "system",
            Self::Worker => "worker",
            Self::Health | Self::Metrics | Self::Docs => "",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tasks => "tasks",
            Self::Steps => "steps",
            Self::Dlq => "dlq",
            Self::Templates => "templates",
            Self::System => "system",
            Self::Worker => "worker",
            Self::Health => "health",
            Self::Metrics => "metrics",
            Self::Docs => "docs",
        })
    }
}

/// Actions that can be performed on resources.
///
/// Standard CRUD actions plus resource-specific actions like `Cancel` and `Resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create new resource (POST)
    Create,
    /// Read single resource (GET by ID)
    Read,
    /// List resources (GET collection)
    List,
    /// Update resource (PUT/PATCH)
    Update,
    /// Delete resource (DELETE)
    Delete,

    // Task-specific actions
    /// Cancel a running task (`tasks:cancel`)
    Cancel,
    /// Read task execution context (`tasks:context_read`)
    ContextRead,

    // Step-specific actions
    /// Manually resolve a step (`steps:resolve`)
    Resolve,

    // DLQ-specific actions
    /// Get DLQ statistics (`dlq:stats`)
    Stats,

    // Template-specific actions
    /// Validate a template (`templates:validate`)
    Validate,

    // System-specific actions
    /// Read system configuration (`system:config_read`, `worker:config_read`)
    ConfigRead,
    /// Read analytics data (`system:analytics_read`)
    AnalyticsRead,
    /// Read registered handlers (legacy) (`system:handlers_read`)
    HandlersRead,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Cancel => "cancel",
            Self::ContextRead => "context_read",
            Self::Resolve => "resolve",
            Self::Stats => "stats",
            Self::Validate => "validate",
            Self::ConfigRead => "config_read",
            Self::AnalyticsRead => "analytics_read",
            Self::HandlersRead => "handlers_read",
        })
    }
}

/// Combines Resource + Action for declarative route authorization.
///
/// # Example
///
/// ```rust
/// use tasker_shared::types::resources::{Resource, Action, ResourceAction};
///
/// let ra = ResourceAction::new(Resource::Tasks, Action::Create);
/// assert!(ra.required_permission().is_some());
///
/// // Public resources return None
/// let public = ResourceAction::new(Resource::Health, Action::Read);
/// assert!(public.required_permission().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAction {
    /// The resource being accessed
    pub resource: Resource,
    /// The action being performed
    pub action: Action,
}

impl ResourceAction {
    /// Create a new resource+action pair.
    #[must_use]
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Returns the required permission, or `None` for public resources.
    ///
    /// Public resources (Health, Metrics, Docs) don't require authentication,
    /// so this returns `None` for those resources.
    #[must_use]
    pub fn required_permission(&self) -> Option<Permission> {
        if self.resource.is_public() {
            return None;
        }
        Some(self.to_permission())
    }

    /// Convert to the corresponding Permission enum variant.
    ///
    /// # Panics
    ///
    /// Panics if called on a public resource (Health, Metrics, Docs) or
    /// an invalid resource+action combination. Use `required_permission()`
    /// for safe access.
    #[must_use]
    #[expect(
        clippy::wrong_self_convention,
        reason = "Private method matching internal conventions; Copy type but method is private"
    )]
    fn to_permission(&self) -> Permission {
        match (self.resource, self.action) {
            // Tasks
            (Resource::Tasks, Action::Create) => Permission::TasksCreate,
            (Resource::Tasks, Action::Read) => Permission::TasksRead,
            (Resource::Tasks, Action::List) => Permission::TasksList,
            (Resource::Tasks, Action::Cancel) => Permission::TasksCancel,
            (Resource::Tasks, Action::ContextRead) => Permission::TasksContextRead,

            // Steps - Read/List both use StepsRead permission
            (Resource::Steps, Action::Read | Action::List) => Permission::StepsRead,
            (Resource::Steps, Action::Resolve) => Permission::StepsResolve,

            // DLQ - Read/List both use DlqRead permission
            (Resource::Dlq, Action::Read | Action::List) => Permission::DlqRead,
            (Resource::Dlq, Action::Update) => Permission::DlqUpdate,
            (Resource::Dlq, Action::Stats) => Permission::DlqStats,

            // Templates - Read/List both use TemplatesRead permission
            (Resource::Templates, Action::Read | Action::List) => Permission::TemplatesRead,
            (Resource::Templates, Action::Validate) => Permission::TemplatesValidate,

            // System
            (Resource::System, Action::ConfigRead) => Permission::SystemConfigRead,
            (Resource::System, Action::HandlersRead) => Permission::HandlersRead,
            (Resource::System, Action::AnalyticsRead) => Permission::AnalyticsRead,

            // Worker
            (Resource::Worker, Action::ConfigRead) => Permission::WorkerConfigRead,
            (Resource::Worker, Action::Read | Action::List) => Permission::WorkerTemplatesRead,
            (Resource::Worker, Action::Validate) => Permission::TemplatesValidate,

            // Invalid combinations - these indicate a bug in route configuration
            (resource, action) => {
                panic!(
                    "Invalid resource+action combination: {:?}:{:?}. \
                     If this is a public resource, use required_permission() instead.",
                    resource, action
                )
            }
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}
