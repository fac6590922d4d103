//! Model Tests Module
//!
//! This module contains all model tests using SQLx native testing
//! for automatic database isolation.

// Insights model tests
pub mod core;
pub mod insights;
pub mod orchestration;
