//! # TAS-65: Payment Handler with Domain Event Publishing
//!
//! Example handler demonstrating domain event publishing pattern for Rust workers.
//! This serves as a reference implementation before Ruby FFI integration.

use super::{
    error_result, success_result, DomainEventPublishable, RustStepHandler, StepHandlerConfig,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tasker_shared::messaging::StepExecutionResult;
use tasker_shared::types::TaskSequenceStep;
use tracing::info;
use uuid::Uuid;

/// Example handler that processes a payment and publishes domain events
///
/// This handler demonstrates the TAS-65 domain event publishing pattern:
/// - Extracts payment data from task context
/// - Processes the payment (business logic)
/// - Publishes `payment.processed` event via DomainEventPublishable trait
/// - Event publishing failures are logged but don't fail the step
#[derive(Debug)]
pub struct ProcessPaymentHandler {
    _config: StepHandlerConfig,
    event_publisher: Option<Arc<tasker_shared::events::domain_events::DomainEventPublisher>>,
}

#[async_trait]
impl RustStepHandler for ProcessPaymentHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // Extract payment data from task context
        let amount = match step_data.get_context_field::<f64>("amount") {
            Ok(value) => value,
            Err(e) => {
                return Ok(error_result(
                    step_uuid,
                    format!("Missing required field 'amount': {}", e),
                    Some("MISSING_CONTEXT_FIELD".to_string()),
                    Some("ValidationError".to_string()),
                    false, // Not retryable - data validation error
                    start_time.elapsed().as_millis() as i64,
                    Some(HashMap::from([("field".to_string(), json!("amount"))])),
                ));
            }
        };

        let currency = step_data
            .get_context_field::<String>("currency")
            .unwrap_or_else(|_| "USD".to_string());

        // Validate amount
        if amount <= 0.0 {
            return Ok(error_result(
                step_uuid,
                "Payment amount must be positive".to_string(),
                Some("INVALID_AMOUNT".to_string()),
                Some("ValidationError".to_string()),
                false, // Not retryable
                start_time.elapsed().as_millis() as i64,
                Some(HashMap::from([("amount".to_string(), json!(amount))])),
            ));
        }

        // Business logic: process payment
        info!("Processing payment: {} {}", amount, currency);

        let transaction_id = format!("TXN-{}", Uuid::new_v4());
        let timestamp = chrono::Utc::now();

        // TAS-65: Publish domain event using the trait helper
        self.publish_domain_event(
            step_data,
            "payment.processed",
            json!({
                "transaction_id": transaction_id,
                "amount": amount,
                "currency": currency,
                "status": "completed",
                "processed_at": timestamp.to_rfc3339(),
            }),
        )
        .await?;

        // Return success result
        let mut metadata = HashMap::new();
        metadata.insert("transaction_id".to_string(), json!(transaction_id));
        metadata.insert("processed_at".to_string(), json!(timestamp.to_rfc3339()));

        Ok(success_result(
            step_uuid,
            json!({
                "transaction_id": transaction_id,
                "status": "success",
                "amount": amount,
                "currency": currency,
            }),
            start_time.elapsed().as_millis() as i64,
            Some(metadata),
        ))
    }

    fn name(&self) -> &str {
        "process_payment"
    }

    fn new(config: StepHandlerConfig) -> Self {
        let event_publisher = config.event_publisher.clone();
        Self {
            _config: config,
            event_publisher,
        }
    }
}

// TAS-65: Implement DomainEventPublishable trait
impl DomainEventPublishable for ProcessPaymentHandler {
    fn event_publisher(
        &self,
    ) -> Option<&Arc<tasker_shared::events::domain_events::DomainEventPublisher>> {
        self.event_publisher.as_ref()
    }

    fn handler_name(&self) -> &str {
        self.name()
    }
}
