//! # GridExec
//!
//! Distributed task-execution coordinator layered over a clustered key-value
//! data grid.
//!
//! ## Module Organization
//!
//! - [`constants`] - Grid map names, lane sizing, and runtime defaults
//! - [`error`] - Structured error handling
//! - [`grid`] - Embedded key-value substrate with invoke/subscribe/expiry
//! - [`models`] - Results, plans, assignments, and shared records
//! - [`orchestration`] - Execution strategies and continuation lanes

pub mod constants;
pub mod error;
pub mod grid;
pub mod models;
pub mod orchestration;

pub use error::{GridExecError, Result};
