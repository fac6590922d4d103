//! Orchestration Integration Tests
//!
//! Tests for the complete orchestration system with state machine integration.

pub mod complex_workflow_integration_test;
pub mod config_integration_test;
pub mod state_manager;
pub mod step_handler_integration_test;
pub mod system_events_integration_test;
pub mod task_handler_integration_test;
pub mod task_initializer_test;
pub mod workflow_coordinator_integration_test;
pub mod workflow_coordinator_test;
