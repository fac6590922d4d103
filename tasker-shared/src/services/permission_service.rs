//! # Permission Service
//!
//! TAS-76: Consolidated permission checking logic shared between orchestration and worker.
//! Provides framework-agnostic permission enforcement that works with both REST (Axum)
//! and future gRPC (Tonic) endpoints.
//!
//! ## Design
//!
//! The permission service is intentionally simple - it checks if a `SecurityContext`
//! has the required permission and returns an appropriate error if not. The error type
//! is `ApiError` which can be converted to HTTP responses (Axum) or gRPC status (Tonic).
//!
//! ## Usage
//!
//! ```ignore
//! use tasker_shared::services::require_permission;
//! use tasker_shared::types::permissions::Permission;
//!
//! fn my_handler(ctx: SecurityContext) -> Result<(), ApiError> {
//!     require_permission(&ctx, Permission::TasksCreate)?;
//!     // ... handler logic
//!     Ok(())
//! }
//! ```

use opentelemetry::KeyValue;
use tracing::warn;

use crate::metrics::security as security_metrics;
use crate::types::permissions::Permission;
use crate::types::security::{AuthMethod, SecurityContext};
use crate::types::web::{ApiError, AuthFailureSeverity};

/// Check that the security context has the required permission.
///
/// Returns `Ok(())` if:
/// - Auth is disabled (`AuthMethod::Disabled`)
/// - The context's permissions include the required permission (exact or wildcard)
///
/// Returns `Err(ApiError)` with 403 status if permission is missing.
///
/// # Metrics
///
/// Increments `security.permission_denials_total` counter with `permission` label on failure.
///
/// # Example
///
/// ```ignore
/// require_permission(&security_context, Permission::TasksCreate)?;
/// ```
pub fn require_permission(ctx: &SecurityContext, perm: Permission) -> Result<(), ApiError> {
    if ctx.auth_method == AuthMethod::Disabled {
        return Ok(());
    }
    if ctx.has_permission(&perm) {
        Ok(())
    } else {
        warn!(
            subject = %ctx.subject,
            required = %perm,
            "Permission denied"
        );
        security_metrics::permission_denials_total()
            .add(1, &[KeyValue::new("permission", perm.as_str().to_string())]);
        Err(ApiError::authorization_error_with_context(
            format!("Missing required permission: {}", perm),
            AuthFailureSeverity::Medium,
        ))
    }
}
