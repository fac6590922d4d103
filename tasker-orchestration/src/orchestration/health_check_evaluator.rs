//! # Health Check Evaluator
//!
//! Pure function for evaluating system health from cached health status data.
//! Extracted from the command processor actor for testability.

use crate::health::HealthStatusCaches;
use crate::orchestration::commands::SystemHealth;
use tasker_shared::TaskerResult;

/// Evaluate system health from cached health status data (TAS-75)
///
/// Reads from `HealthStatusCaches` for non-blocking health checks.
/// Uses fail-open semantics: unevaluated status returns healthy.
pub async fn evaluate_health_status(
    health_caches: &HealthStatusCaches,
    actor_count: usize,
) -> TaskerResult<SystemHealth> {
    let db_status = health_caches.get_db_status().await;
    let channel_status = health_caches.get_channel_status().await;
    let queue_status = health_caches.get_queue_status().await;
    let backpressure = health_caches.get_backpressure().await;

    let health_evaluated =
        db_status.evaluated || channel_status.evaluated || queue_status.tier.is_evaluated();

    let database_connected = if db_status.evaluated {
        db_status.is_connected && !db_status.circuit_breaker_open
    } else {
        true // Fail-open during startup
    };

    let message_queues_healthy = !queue_status.tier.is_critical();

    let status = if !health_evaluated {
        "unknown".to_string()
    } else if !database_connected || !message_queues_healthy || backpressure.active {
        "unhealthy".to_string()
    } else if channel_status.is_saturated || queue_status.tier.is_warning() {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    };

    Ok(SystemHealth {
        status,
        database_connected,
        message_queues_healthy,
        active_processors: actor_count as u32,
        circuit_breaker_open: db_status.circuit_breaker_open,
        circuit_breaker_failures: db_status.circuit_breaker_failures,
        command_channel_saturation_percent: channel_status.command_saturation_percent,
        backpressure_active: backpressure.active,
        queue_depth_tier: format!("{:?}", queue_status.tier),
        queue_depth_max: queue_status.max_depth,
        queue_depth_worst_queue: queue_status.worst_queue.clone(),
        health_evaluated,
    })
}
