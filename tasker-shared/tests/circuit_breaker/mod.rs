//! Circuit Breaker Test Module
//!
//! Tests for circuit breaker functionality including:
//! - Configuration-driven circuit breaker enablement
//! - Circuit breaker state transitions
//! - Integration with messaging components

pub mod circuit_breaker_enabled_test;