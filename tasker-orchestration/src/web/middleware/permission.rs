//! # Permission Checking
//!
//! TAS-150: Per-handler permission enforcement utilities.
//! Used by handlers to verify the authenticated user has the required permission.
//!
//! TAS-76: This module re-exports the shared permission service from tasker-shared.
//! The implementation is consolidated there to enable sharing between orchestration,
//! worker, and future gRPC endpoints.

// Re-export the shared permission service
pub use tasker_shared::services::require_permission;
