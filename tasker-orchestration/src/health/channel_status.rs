//! # Channel Health Evaluator
//!
//! TAS-75 Phase 5: Evaluates MPSC channel saturation and health.
//!
//! This module provides functions to check channel health without blocking the
//! API hot path. The evaluator is called by the background `StatusEvaluator` task.

use tasker_shared::monitoring::channel_metrics::ChannelMonitor;
use tokio::sync::mpsc;
use tracing::debug;

use super::types::{ChannelHealthConfig, ChannelHealthStatus};

/// Evaluate channel health status
///
/// Checks the command channel saturation and determines health state.
///
/// # Arguments
/// * `channel_monitor` - Monitor for the command channel
/// * `command_sender` - Sender handle to get current capacity
/// * `config` - Health check configuration with thresholds
///
/// # Type Parameters
/// * `T` - The message type of the channel
///
/// # Returns
/// `ChannelHealthStatus` with current channel health information
pub fn evaluate_channel_status<T>(
    channel_monitor: &ChannelMonitor,
    command_sender: &mpsc::Sender<T>,
    config: &ChannelHealthConfig,
) -> ChannelHealthStatus {
    let available_capacity = command_sender.capacity();
    let buffer_size = channel_monitor.buffer_size();
    let metrics = channel_monitor.metrics();

    // Calculate saturation percentage
    let saturation_percent = if buffer_size > 0 {
        let used = buffer_size.saturating_sub(available_capacity);
        (used as f64 / buffer_size as f64) * 100.0
    } else {
        0.0
    };

    // Determine if saturated/critical based on config thresholds
    let is_saturated = saturation_percent >= config.critical_threshold;
    let is_critical = saturation_percent >= config.emergency_threshold;

    debug!(
        channel_name = %channel_monitor.channel_name(),
        saturation_percent = saturation_percent,
        available_capacity = available_capacity,
        buffer_size = buffer_size,
        messages_sent = metrics.messages_sent,
        overflow_events = metrics.overflow_events,
        is_saturated = is_saturated,
        is_critical = is_critical,
        "Channel health evaluated"
    );

    ChannelHealthStatus {
        evaluated: true, // We actually evaluated the channel status
        command_saturation_percent: saturation_percent,
        command_available_capacity: available_capacity,
        command_messages_sent: metrics.messages_sent,
        command_overflow_events: metrics.overflow_events,
        is_saturated,
        is_critical,
    }
}

/// Create a channel health status without a monitor (for testing or fallback)
///
/// Uses direct sender capacity when a monitor is not available.
///
/// # Arguments
/// * `command_sender` - Sender handle to get current capacity
/// * `buffer_size` - The configured buffer size of the channel
/// * `config` - Health check configuration with thresholds
///
/// # Type Parameters
/// * `T` - The message type of the channel
///
/// # Returns
/// `ChannelHealthStatus` with current channel health information
pub fn evaluate_channel_status_basic<T>(
    command_sender: &mpsc::Sender<T>,
    buffer_size: usize,
    config: &ChannelHealthConfig,
) -> ChannelHealthStatus {
    let available_capacity = command_sender.capacity();

    // Calculate saturation percentage
    let saturation_percent = if buffer_size > 0 {
        let used = buffer_size.saturating_sub(available_capacity);
        (used as f64 / buffer_size as f64) * 100.0
    } else {
        0.0
    };

    // Determine if saturated/critical based on config thresholds
    let is_saturated = saturation_percent >= config.critical_threshold;
    let is_critical = saturation_percent >= config.emergency_threshold;

    ChannelHealthStatus {
        evaluated: true, // We actually evaluated the channel status
        command_saturation_percent: saturation_percent,
        command_available_capacity: available_capacity,
        command_messages_sent: 0,   // Not tracked without monitor
        command_overflow_events: 0, // Not tracked without monitor
        is_saturated,
        is_critical,
    }
}
