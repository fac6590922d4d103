//! Worker Web API Handlers
//!
//! HTTP request handlers for all worker web endpoints.

pub mod config;
pub mod health;
pub mod metrics;
pub mod templates;
pub mod worker_status;
