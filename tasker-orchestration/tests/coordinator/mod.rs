//! Coordinator Test Module
//!
//! Tests for the orchestration coordinator system including:
//! - Operational state management
//! - Health monitoring
//! - Pool management and scaling
//! - TAS-37 shutdown-aware enhancements

pub mod operational_state_test;