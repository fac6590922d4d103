//! Database integration tests
//!
//! Tests for database-level functionality including SQL functions,
//! connection pooling, and migration handling.

pub mod optimized_queries_test;
pub mod sql_functions;
