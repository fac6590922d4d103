//! Type conversion utilities for TypeScript FFI
//!
//! Provides conversion between Rust types and JSON for TypeScript consumption.
//! Uses explicit DTO types for compile-time guarantees on the FFI contract.

use anyhow::Result;

use crate::dto::{FfiDispatchMetricsDto, FfiStepEventDto};
use tasker_worker::worker::{FfiDispatchMetrics, FfiStepEvent};

/// Convert an FfiStepEvent to a JSON string for TypeScript consumption.
///
/// Uses explicit DTO conversion for compile-time field mapping guarantees.
/// If the underlying Rust types change, this will fail to compile rather
/// than silently producing incorrect JSON.
pub fn convert_ffi_step_event_to_json(event: &FfiStepEvent) -> Result<String> {
    let dto = FfiStepEventDto::from(event);
    Ok(serde_json::to_string(&dto)?)
}

/// Convert FfiDispatchMetrics to a JSON string for TypeScript consumption.
pub fn convert_ffi_dispatch_metrics_to_json(metrics: &FfiDispatchMetrics) -> Result<String> {
    let dto = FfiDispatchMetricsDto::from(metrics);
    Ok(serde_json::to_string(&dto)?)
}
