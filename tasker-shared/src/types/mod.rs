pub mod api;
pub mod api_key_auth;
pub mod auth;
pub mod base;
pub mod error_types;
pub mod jwks;
#[cfg(feature = "web-api")]
pub mod openapi_security;
pub mod permissions;
pub mod resources;
pub mod security;
pub mod web;

pub use crate::services::SecurityService;
pub use base::{
    HandlerMetadata, StepEventPayload, StepExecutionCompletionEvent, StepExecutionEvent,
    TaskSequenceStep, ViableStep,
};
pub use permissions::Permission;
pub use resources::{Action, Resource, ResourceAction};
pub use security::{AuthMethod, SecurityContext};
