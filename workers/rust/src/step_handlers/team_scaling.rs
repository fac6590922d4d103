//! # Team Scaling Step Handlers for Blog Post 04
//!
//! Demonstrates namespace-based workflow organization with two distinct namespaces:
//!
//! Customer Success namespace (process_refund workflow):
//! 1. ValidateRefundRequestHandler: Validate customer refund request details
//! 2. CheckRefundPolicyHandler: Verify request complies with policies
//! 3. GetManagerApprovalHandler: Route to manager for approval if needed
//! 4. ExecuteRefundWorkflowHandler: Call payments team's workflow (cross-namespace)
//! 5. UpdateTicketStatusHandler: Update customer support ticket
//!
//! Payments namespace (process_refund workflow):
//! 1. ValidatePaymentEligibilityHandler: Check if payment can be refunded
//! 2. ProcessGatewayRefundHandler: Execute refund through payment processor
//! 3. UpdatePaymentRecordsHandler: Update internal payment status
//! 4. NotifyCustomerHandler: Send refund confirmation
//!
//! TAS-137 Best Practices Demonstrated:
//! - get_input() for task context access
//! - get_dependency_field() for nested field extraction
//! - get_dependency_result_column_value() for upstream step data
//!
//! TAS-91: Blog Post 04 - Rust implementation

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use tasker_shared::messaging::StepExecutionResult;
use tasker_shared::types::TaskSequenceStep;
use tracing::info;
use uuid::Uuid;

use super::{error_result, success_result, RustStepHandler, StepHandlerConfig};

// =============================================================================
// Helper Functions
// =============================================================================

fn generate_id(prefix: &str) -> String {
    format!(
        "{}_{}",
        prefix,
        &Uuid::new_v4().to_string().replace('-', "")[..12]
    )
}

/// Determine customer tier based on customer ID
fn determine_customer_tier(customer_id: &str) -> &'static str {
    let lower = customer_id.to_lowercase();
    if lower.contains("vip") || lower.contains("premium") {
        "premium"
    } else if lower.contains("gold") {
        "gold"
    } else {
        "standard"
    }
}

/// Refund policy rules by tier
fn get_refund_policy(tier: &str) -> (i32, bool, i64) {
    // (window_days, requires_approval, max_amount)
    match tier {
        "gold" => (60, false, 50_000),
        "premium" => (90, false, 100_000),
        _ => (30, true, 10_000), // standard
    }
}

// =============================================================================
// Customer Success Namespace: Step 1 - Validate Refund Request
// =============================================================================

/// Validate customer refund request details.
#[derive(Debug)]
pub struct ValidateRefundRequestHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for ValidateRefundRequestHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Use get_input() for task context access
        let ticket_id: String = match step_data.get_input("ticket_id") {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_result(
                    step_uuid,
                    "Missing required field: ticket_id".to_string(),
                    Some("MISSING_REQUIRED_FIELDS".to_string()),
                    Some("ValidationError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
        };

        let customer_id: String = match step_data.get_input("customer_id") {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_result(
                    step_uuid,
                    "Missing required field: customer_id".to_string(),
                    Some("MISSING_REQUIRED_FIELDS".to_string()),
                    Some("ValidationError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
        };

        let _refund_amount: f64 = match step_data.get_input("refund_amount") {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_result(
                    step_uuid,
                    "Missing required field: refund_amount".to_string(),
                    Some("MISSING_REQUIRED_FIELDS".to_string()),
                    Some("ValidationError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
        };

        // Simulate validation scenarios based on ticket_id patterns
        if ticket_id.contains("ticket_closed") {
            return Ok(error_result(
                step_uuid,
                "Cannot process refund for closed ticket".to_string(),
                Some("TICKET_CLOSED".to_string()),
                Some("ValidationError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }
        if ticket_id.contains("ticket_cancelled") {
            return Ok(error_result(
                step_uuid,
                "Cannot process refund for cancelled ticket".to_string(),
                Some("TICKET_CANCELLED".to_string()),
                Some("ValidationError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let customer_tier = determine_customer_tier(&customer_id);
        let purchase_date = (Utc::now() - Duration::days(30)).to_rfc3339();
        let payment_id = generate_id("pay");
        let now = Utc::now().to_rfc3339();

        info!(
            "ValidateRefundRequestHandler: Validated request - ticket_id={}, customer_tier={}",
            ticket_id, customer_tier
        );

        Ok(success_result(
            step_uuid,
            json!({
                "request_validated": true,
                "ticket_id": ticket_id,
                "customer_id": customer_id,
                "ticket_status": "open",
                "customer_tier": customer_tier,
                "original_purchase_date": purchase_date,
                "payment_id": payment_id,
                "validation_timestamp": now,
                "namespace": "customer_success"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("validate_refund_request")),
                ("service".to_string(), json!("customer_service_platform")),
                ("ticket_id".to_string(), json!(ticket_id)),
                ("customer_tier".to_string(), json!(customer_tier)),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_cs_validate_refund_request"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Customer Success Namespace: Step 2 - Check Refund Policy
// =============================================================================

/// Check if refund request complies with policy rules.
#[derive(Debug)]
pub struct CheckRefundPolicyHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for CheckRefundPolicyHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate dependency result
        let validation_result: Value = step_data
            .get_dependency_result_column_value("validate_refund_request")
            .unwrap_or(Value::Null);
        let validated = validation_result
            .get("request_validated")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !validated {
            return Ok(error_result(
                step_uuid,
                "Request validation must be completed before policy check".to_string(),
                Some("MISSING_VALIDATION".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        // TAS-137: Use get_dependency_field() for nested extraction
        let customer_tier: String = step_data
            .get_dependency_field("validate_refund_request", &["customer_tier"])
            .unwrap_or_else(|_| "standard".to_string());

        let refund_amount: f64 = step_data.get_input("refund_amount").unwrap_or(0.0);

        // Check policy compliance
        let (window_days, requires_approval, max_amount) = get_refund_policy(&customer_tier);
        let days_since_purchase = 30; // Simplified for demo
        let within_window = days_since_purchase <= window_days;
        let within_amount_limit = (refund_amount as i64) <= max_amount;

        if !within_window {
            return Ok(error_result(
                step_uuid,
                format!(
                    "Refund request outside policy window: {} days (max: {} days)",
                    days_since_purchase, window_days
                ),
                Some("OUTSIDE_REFUND_WINDOW".to_string()),
                Some("PolicyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        if !within_amount_limit {
            return Ok(error_result(
                step_uuid,
                format!(
                    "Refund amount exceeds policy limit: ${:.2} (max: ${:.2})",
                    refund_amount / 100.0,
                    max_amount as f64 / 100.0
                ),
                Some("EXCEEDS_AMOUNT_LIMIT".to_string()),
                Some("PolicyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let now = Utc::now().to_rfc3339();

        info!(
            "CheckRefundPolicyHandler: Policy check passed - customer_tier={}, requires_approval={}",
            customer_tier, requires_approval
        );

        Ok(success_result(
            step_uuid,
            json!({
                "policy_checked": true,
                "policy_compliant": true,
                "customer_tier": customer_tier,
                "refund_window_days": window_days,
                "days_since_purchase": days_since_purchase,
                "within_refund_window": within_window,
                "requires_approval": requires_approval,
                "max_allowed_amount": max_amount,
                "policy_checked_at": now,
                "namespace": "customer_success"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("check_refund_policy")),
                ("service".to_string(), json!("policy_engine")),
                ("customer_tier".to_string(), json!(customer_tier)),
                ("requires_approval".to_string(), json!(requires_approval)),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_cs_check_refund_policy"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Customer Success Namespace: Step 3 - Get Manager Approval
// =============================================================================

/// Get manager approval for refund if required.
#[derive(Debug)]
pub struct GetManagerApprovalHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for GetManagerApprovalHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate dependency result
        let policy_result: Value = step_data
            .get_dependency_result_column_value("check_refund_policy")
            .unwrap_or(Value::Null);
        let policy_checked = policy_result
            .get("policy_checked")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !policy_checked {
            return Ok(error_result(
                step_uuid,
                "Policy check must be completed before approval".to_string(),
                Some("MISSING_POLICY_CHECK".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let requires_approval: bool = step_data
            .get_dependency_field("check_refund_policy", &["requires_approval"])
            .unwrap_or(true);

        let customer_tier: String = step_data
            .get_dependency_field("check_refund_policy", &["customer_tier"])
            .unwrap_or_else(|_| "standard".to_string());

        let ticket_id: String = step_data
            .get_dependency_field("validate_refund_request", &["ticket_id"])
            .unwrap_or_default();

        let customer_id: String = step_data
            .get_dependency_field("validate_refund_request", &["customer_id"])
            .unwrap_or_default();

        let now = Utc::now().to_rfc3339();

        if requires_approval {
            // Simulate approval scenarios
            if ticket_id.contains("ticket_denied") {
                return Ok(error_result(
                    step_uuid,
                    "Manager denied refund request".to_string(),
                    Some("APPROVAL_DENIED".to_string()),
                    Some("ApprovalError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
            if ticket_id.contains("ticket_pending") {
                return Ok(error_result(
                    step_uuid,
                    "Waiting for manager approval".to_string(),
                    Some("APPROVAL_PENDING".to_string()),
                    Some("ApprovalPending".to_string()),
                    true,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }

            let approval_id = generate_id("appr");
            let manager_id = format!("mgr_{}", (ticket_id.len() % 5) + 1);

            info!(
                "GetManagerApprovalHandler: Approval obtained - approval_id={}, manager_id={}",
                approval_id, manager_id
            );

            Ok(success_result(
                step_uuid,
                json!({
                    "approval_obtained": true,
                    "approval_required": true,
                    "auto_approved": false,
                    "approval_id": approval_id,
                    "manager_id": manager_id,
                    "manager_notes": format!("Approved refund request for customer {}", customer_id),
                    "approved_at": now,
                    "namespace": "customer_success"
                }),
                start_time.elapsed().as_millis() as i64,
                Some(HashMap::from([
                    ("operation".to_string(), json!("get_manager_approval")),
                    ("service".to_string(), json!("approval_portal")),
                    ("approval_required".to_string(), json!(true)),
                    ("approval_id".to_string(), json!(approval_id)),
                ])),
            ))
        } else {
            info!(
                "GetManagerApprovalHandler: Auto-approved for tier={}",
                customer_tier
            );

            Ok(success_result(
                step_uuid,
                json!({
                    "approval_obtained": true,
                    "approval_required": false,
                    "auto_approved": true,
                    "approval_id": null,
                    "manager_id": null,
                    "manager_notes": format!("Auto-approved for customer tier {}", customer_tier),
                    "approved_at": now,
                    "namespace": "customer_success"
                }),
                start_time.elapsed().as_millis() as i64,
                Some(HashMap::from([
                    ("operation".to_string(), json!("get_manager_approval")),
                    ("service".to_string(), json!("approval_portal")),
                    ("approval_required".to_string(), json!(false)),
                    ("auto_approved".to_string(), json!(true)),
                ])),
            ))
        }
    }

    fn name(&self) -> &str {
        "team_scaling_cs_get_manager_approval"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Customer Success Namespace: Step 4 - Execute Refund Workflow
// =============================================================================

/// Execute cross-namespace refund workflow delegation.
#[derive(Debug)]
pub struct ExecuteRefundWorkflowHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for ExecuteRefundWorkflowHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate approval dependency
        let approval_result: Value = step_data
            .get_dependency_result_column_value("get_manager_approval")
            .unwrap_or(Value::Null);
        let approval_obtained = approval_result
            .get("approval_obtained")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !approval_obtained {
            return Ok(error_result(
                step_uuid,
                "Manager approval must be obtained before executing refund".to_string(),
                Some("MISSING_APPROVAL".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let payment_id: String = step_data
            .get_dependency_field("validate_refund_request", &["payment_id"])
            .unwrap_or_default();

        if payment_id.is_empty() {
            return Ok(error_result(
                step_uuid,
                "Payment ID not found in validation results".to_string(),
                Some("MISSING_PAYMENT_ID".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let correlation_id = format!("cs-{}", generate_id("corr"));
        let task_id = format!("task_{}", Uuid::new_v4());
        let now = Utc::now().to_rfc3339();

        info!(
            "ExecuteRefundWorkflowHandler: Delegated to payments namespace - task_id={}, correlation_id={}",
            task_id, correlation_id
        );

        Ok(success_result(
            step_uuid,
            json!({
                "task_delegated": true,
                "target_namespace": "payments",
                "target_workflow": "process_refund",
                "delegated_task_id": task_id,
                "delegated_task_status": "created",
                "delegation_timestamp": now,
                "correlation_id": correlation_id,
                "namespace": "customer_success"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("execute_refund_workflow")),
                ("service".to_string(), json!("task_delegation")),
                ("target_namespace".to_string(), json!("payments")),
                ("target_workflow".to_string(), json!("process_refund")),
                ("delegated_task_id".to_string(), json!(task_id)),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_cs_execute_refund_workflow"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Customer Success Namespace: Step 5 - Update Ticket Status
// =============================================================================

/// Update customer support ticket status.
#[derive(Debug)]
pub struct UpdateTicketStatusHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for UpdateTicketStatusHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate delegation dependency
        let delegation_result: Value = step_data
            .get_dependency_result_column_value("execute_refund_workflow")
            .unwrap_or(Value::Null);
        let task_delegated = delegation_result
            .get("task_delegated")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !task_delegated {
            return Ok(error_result(
                step_uuid,
                "Refund workflow must be executed before updating ticket".to_string(),
                Some("MISSING_DELEGATION".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let ticket_id: String = step_data
            .get_dependency_field("validate_refund_request", &["ticket_id"])
            .unwrap_or_default();

        let delegated_task_id: String = step_data
            .get_dependency_field("execute_refund_workflow", &["delegated_task_id"])
            .unwrap_or_default();

        let correlation_id: String = step_data
            .get_dependency_field("execute_refund_workflow", &["correlation_id"])
            .unwrap_or_default();

        let refund_amount: f64 = step_data.get_input("refund_amount").unwrap_or(0.0);

        // Simulate update scenarios
        if ticket_id.contains("ticket_locked") {
            return Ok(error_result(
                step_uuid,
                "Ticket locked by another agent, will retry".to_string(),
                Some("TICKET_LOCKED".to_string()),
                Some("TicketLocked".to_string()),
                true,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let now = Utc::now().to_rfc3339();

        info!(
            "UpdateTicketStatusHandler: Ticket updated - ticket_id={}, status=resolved",
            ticket_id
        );

        Ok(success_result(
            step_uuid,
            json!({
                "ticket_updated": true,
                "ticket_id": ticket_id,
                "previous_status": "in_progress",
                "new_status": "resolved",
                "resolution_note": format!(
                    "Refund of ${:.2} processed successfully. Delegated task ID: {}. Correlation ID: {}",
                    refund_amount / 100.0,
                    delegated_task_id,
                    correlation_id
                ),
                "updated_at": now,
                "refund_completed": true,
                "delegated_task_id": delegated_task_id,
                "namespace": "customer_success"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("update_ticket_status")),
                ("service".to_string(), json!("customer_service_platform")),
                ("ticket_id".to_string(), json!(ticket_id)),
                ("new_status".to_string(), json!("resolved")),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_cs_update_ticket_status"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Payments Namespace: Step 1 - Validate Payment Eligibility
// =============================================================================

/// Validate payment eligibility for refund.
#[derive(Debug)]
pub struct ValidatePaymentEligibilityHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for ValidatePaymentEligibilityHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        let payment_id: String = match step_data.get_input("payment_id") {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_result(
                    step_uuid,
                    "Missing required field: payment_id".to_string(),
                    Some("MISSING_REQUIRED_FIELDS".to_string()),
                    Some("ValidationError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
        };

        let refund_amount: f64 = match step_data.get_input("refund_amount") {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_result(
                    step_uuid,
                    "Missing required field: refund_amount".to_string(),
                    Some("MISSING_REQUIRED_FIELDS".to_string()),
                    Some("ValidationError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
        };

        if refund_amount <= 0.0 {
            return Ok(error_result(
                step_uuid,
                format!("Refund amount must be positive, got: {}", refund_amount),
                Some("INVALID_REFUND_AMOUNT".to_string()),
                Some("ValidationError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        // Simulate validation scenarios
        if payment_id.contains("pay_test_insufficient") {
            return Ok(error_result(
                step_uuid,
                "Insufficient funds available for refund".to_string(),
                Some("INSUFFICIENT_FUNDS".to_string()),
                Some("PaymentError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }
        if payment_id.contains("pay_test_processing") {
            return Ok(error_result(
                step_uuid,
                "Payment is still processing, cannot refund yet".to_string(),
                Some("PAYMENT_PROCESSING".to_string()),
                Some("PaymentError".to_string()),
                true,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }
        if payment_id.contains("pay_test_ineligible") {
            return Ok(error_result(
                step_uuid,
                "Payment is not eligible for refund: past refund window".to_string(),
                Some("PAYMENT_INELIGIBLE".to_string()),
                Some("PaymentError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let now = Utc::now().to_rfc3339();

        info!(
            "ValidatePaymentEligibilityHandler: Payment validated - payment_id={}",
            payment_id
        );

        Ok(success_result(
            step_uuid,
            json!({
                "payment_validated": true,
                "payment_id": payment_id,
                "original_amount": refund_amount + 1000.0,
                "refund_amount": refund_amount,
                "payment_method": "credit_card",
                "gateway_provider": "MockPaymentGateway",
                "eligibility_status": "eligible",
                "validation_timestamp": now,
                "namespace": "payments"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                (
                    "operation".to_string(),
                    json!("validate_payment_eligibility"),
                ),
                ("service".to_string(), json!("payment_gateway")),
                ("payment_id".to_string(), json!(payment_id)),
                ("gateway_provider".to_string(), json!("MockPaymentGateway")),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_payments_validate_eligibility"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Payments Namespace: Step 2 - Process Gateway Refund
// =============================================================================

/// Process refund through payment gateway.
#[derive(Debug)]
pub struct ProcessGatewayRefundHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for ProcessGatewayRefundHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate dependency result
        let validation_result: Value = step_data
            .get_dependency_result_column_value("validate_payment_eligibility")
            .unwrap_or(Value::Null);
        let payment_validated = validation_result
            .get("payment_validated")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !payment_validated {
            return Ok(error_result(
                step_uuid,
                "Payment validation must be completed before processing refund".to_string(),
                Some("MISSING_VALIDATION".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let payment_id: String = step_data
            .get_dependency_field("validate_payment_eligibility", &["payment_id"])
            .unwrap_or_default();

        let refund_amount: f64 = step_data
            .get_dependency_field("validate_payment_eligibility", &["refund_amount"])
            .unwrap_or(0.0);

        // Simulate gateway scenarios
        if payment_id.contains("pay_test_gateway_timeout") {
            return Ok(error_result(
                step_uuid,
                "Gateway timeout, will retry".to_string(),
                Some("GATEWAY_TIMEOUT".to_string()),
                Some("GatewayError".to_string()),
                true,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }
        if payment_id.contains("pay_test_gateway_error") {
            return Ok(error_result(
                step_uuid,
                "Gateway refund failed: Gateway error".to_string(),
                Some("GATEWAY_REFUND_FAILED".to_string()),
                Some("GatewayError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let refund_id = generate_id("rfnd");
        let gateway_transaction_id = generate_id("gtx");
        let now = Utc::now();
        let estimated_arrival = (now + Duration::days(5)).to_rfc3339();

        info!(
            "ProcessGatewayRefundHandler: Refund processed - refund_id={}, payment_id={}",
            refund_id, payment_id
        );

        Ok(success_result(
            step_uuid,
            json!({
                "refund_processed": true,
                "refund_id": refund_id,
                "payment_id": payment_id,
                "refund_amount": refund_amount,
                "refund_status": "processed",
                "gateway_transaction_id": gateway_transaction_id,
                "gateway_provider": "MockPaymentGateway",
                "processed_at": now.to_rfc3339(),
                "estimated_arrival": estimated_arrival,
                "namespace": "payments"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("process_gateway_refund")),
                ("service".to_string(), json!("payment_gateway")),
                ("refund_id".to_string(), json!(refund_id)),
                ("gateway_provider".to_string(), json!("MockPaymentGateway")),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_payments_process_gateway_refund"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Payments Namespace: Step 3 - Update Payment Records
// =============================================================================

/// Update internal payment records after refund.
#[derive(Debug)]
pub struct UpdatePaymentRecordsHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for UpdatePaymentRecordsHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate dependency result
        let refund_result: Value = step_data
            .get_dependency_result_column_value("process_gateway_refund")
            .unwrap_or(Value::Null);
        let refund_processed = refund_result
            .get("refund_processed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !refund_processed {
            return Ok(error_result(
                step_uuid,
                "Gateway refund must be completed before updating records".to_string(),
                Some("MISSING_REFUND".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let payment_id: String = step_data
            .get_dependency_field("process_gateway_refund", &["payment_id"])
            .unwrap_or_default();

        let refund_id: String = step_data
            .get_dependency_field("process_gateway_refund", &["refund_id"])
            .unwrap_or_default();

        // Simulate update scenarios
        if payment_id.contains("pay_test_record_lock") {
            return Ok(error_result(
                step_uuid,
                "Payment record locked, will retry".to_string(),
                Some("RECORD_LOCKED".to_string()),
                Some("RecordError".to_string()),
                true,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let record_id = generate_id("rec");
        let now = Utc::now().to_rfc3339();

        info!(
            "UpdatePaymentRecordsHandler: Records updated - payment_id={}, record_id={}",
            payment_id, record_id
        );

        Ok(success_result(
            step_uuid,
            json!({
                "records_updated": true,
                "payment_id": payment_id,
                "refund_id": refund_id,
                "record_id": record_id,
                "payment_status": "refunded",
                "refund_status": "completed",
                "history_entries_created": 2,
                "updated_at": now,
                "namespace": "payments"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("update_payment_records")),
                ("service".to_string(), json!("payment_record_system")),
                ("payment_id".to_string(), json!(payment_id)),
                ("record_id".to_string(), json!(record_id)),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_payments_update_records"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}

// =============================================================================
// Payments Namespace: Step 4 - Notify Customer
// =============================================================================

/// Send refund confirmation notification to customer.
#[derive(Debug)]
pub struct NotifyCustomerHandler {
    #[expect(
        dead_code,
        reason = "Required for API compatibility with handler config pattern"
    )]
    config: StepHandlerConfig,
}

#[async_trait]
impl RustStepHandler for NotifyCustomerHandler {
    async fn call(&self, step_data: &TaskSequenceStep) -> Result<StepExecutionResult> {
        let start_time = std::time::Instant::now();
        let step_uuid = step_data.workflow_step.workflow_step_uuid;

        // TAS-137: Validate dependency result
        let refund_result: Value = step_data
            .get_dependency_result_column_value("process_gateway_refund")
            .unwrap_or(Value::Null);
        let refund_processed = refund_result
            .get("refund_processed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !refund_processed {
            return Ok(error_result(
                step_uuid,
                "Refund must be processed before sending notification".to_string(),
                Some("MISSING_REFUND".to_string()),
                Some("DependencyError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let customer_email: String = match step_data.get_input("customer_email") {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_result(
                    step_uuid,
                    "Customer email is required for notification".to_string(),
                    Some("MISSING_CUSTOMER_EMAIL".to_string()),
                    Some("ValidationError".to_string()),
                    false,
                    start_time.elapsed().as_millis() as i64,
                    None,
                ));
            }
        };

        // Simulate notification scenarios
        if customer_email.contains("@test_bounce") {
            return Ok(error_result(
                step_uuid,
                "Customer email bounced".to_string(),
                Some("EMAIL_BOUNCED".to_string()),
                Some("NotificationError".to_string()),
                false,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }
        if customer_email.contains("@test_rate_limit") {
            return Ok(error_result(
                step_uuid,
                "Email service rate limited, will retry".to_string(),
                Some("RATE_LIMITED".to_string()),
                Some("NotificationError".to_string()),
                true,
                start_time.elapsed().as_millis() as i64,
                None,
            ));
        }

        let refund_id: String = step_data
            .get_dependency_field("process_gateway_refund", &["refund_id"])
            .unwrap_or_default();

        let refund_amount: f64 = step_data
            .get_dependency_field("process_gateway_refund", &["refund_amount"])
            .unwrap_or(0.0);

        let message_id = generate_id("msg");
        let now = Utc::now().to_rfc3339();

        info!(
            "NotifyCustomerHandler: Notification sent - customer_email={}, message_id={}",
            customer_email, message_id
        );

        Ok(success_result(
            step_uuid,
            json!({
                "notification_sent": true,
                "customer_email": customer_email,
                "message_id": message_id,
                "notification_type": "refund_confirmation",
                "sent_at": now,
                "delivery_status": "delivered",
                "refund_id": refund_id,
                "refund_amount": refund_amount,
                "namespace": "payments"
            }),
            start_time.elapsed().as_millis() as i64,
            Some(HashMap::from([
                ("operation".to_string(), json!("notify_customer")),
                ("service".to_string(), json!("email_service")),
                ("customer_email".to_string(), json!(customer_email)),
                ("message_id".to_string(), json!(message_id)),
            ])),
        ))
    }

    fn name(&self) -> &str {
        "team_scaling_payments_notify_customer"
    }

    fn new(config: StepHandlerConfig) -> Self {
        Self { config }
    }
}
