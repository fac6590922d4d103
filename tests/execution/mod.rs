//! Execution Module Tests
//!
//! Tests for both legacy ZeroMQ architecture and new Command pattern architecture.

// Legacy ZeroMQ tests (temporarily disabled due to compilation issues)
// pub mod zeromq_executor_test;
// pub mod zeromq_message_parsing_test;
// pub mod zeromq_orchestration_integration_test;

// New Command Pattern tests
pub mod command_basic_test;
// pub mod command_infrastructure_test;
// pub mod tcp_executor_test;
// pub mod command_performance_test;
