//! # Orchestration
//!
//! Policy and scheduling seams of the engine: execution strategies producing
//! plans from live membership, and the per-task serialized continuation lanes
//! that run reactive evaluations.

pub mod lanes;
pub mod strategy;
