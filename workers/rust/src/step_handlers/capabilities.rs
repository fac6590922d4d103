//! # TAS-112: Ergonomic Handler Capability Traits
//!
//! This module re-exports capability traits from `tasker_worker` for backward compatibility.
//! The canonical implementation lives in `tasker_worker::handler_capabilities`.
//!
//! ## Usage
//!
//! For new handlers, prefer importing directly from `tasker_worker`:
//!
//! ```ignore
//! use tasker_worker::{APICapable, DecisionCapable, BatchableCapable};
//! ```
//!
//! For compatibility with existing code, this module provides the same exports:
//!
//! ```ignore
//! use tasker_worker_rust::step_handlers::capabilities::{APICapable, DecisionCapable};
//! ```

// Re-export all capability types from tasker_worker
pub use tasker_worker::handler_capabilities::{
    APICapable, BatchableCapable, DecisionCapable, ErrorClassification, HandlerCapabilities,
};
