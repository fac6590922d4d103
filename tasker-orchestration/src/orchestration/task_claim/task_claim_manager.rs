//! # Task Claim Manager Trait
//!
//! Provides a unified interface for task claim operations across different claim purposes.
//! This trait enables claim transfers between different operational contexts (finalization,
//! step enqueuing, etc.) when held by the same processor.
//!
//! ## Design Philosophy
//!
//! The trait abstracts over the specific claim implementations while providing a consistent
//! interface for claim lifecycle management. This enables complex multi-phase operations
//! that require claim transfers while maintaining distributed safety guarantees.

use async_trait::async_trait;
use uuid::Uuid;
use tasker_shared::{TaskerResult, TaskerError};
use super::task_claim_state::{TaskClaimState, ClaimPurpose, ClaimError};

/// Unified interface for task claim operations
#[async_trait]
pub trait TaskClaimManager {
    /// Get the processor ID for this claim manager
    fn processor_id(&self) -> &str;

    /// Attempt to claim a task for the specified purpose
    async fn claim_task(
        &self,
        task_uuid: Uuid,
        purpose: ClaimPurpose,
        timeout_seconds: Option<i32>,
    ) -> TaskerResult<TaskClaimState>;

    /// Transfer an existing claim to a new purpose (same processor only)
    async fn transfer_claim(
        &self,
        task_uuid: Uuid,
        from_purpose: ClaimPurpose,
        to_purpose: ClaimPurpose,
        timeout_seconds: Option<i32>,
    ) -> TaskerResult<TaskClaimState>;

    /// Release a claim held by this processor
    async fn release_claim(
        &self,
        task_uuid: Uuid,
        purpose: ClaimPurpose,
    ) -> TaskerResult<bool>;

    /// Extend a claim to prevent timeout
    async fn extend_claim(
        &self,
        task_uuid: Uuid,
        purpose: ClaimPurpose,
        additional_seconds: Option<i32>,
    ) -> TaskerResult<bool>;

    /// Get the current claim state for a task
    async fn get_claim_state(
        &self,
        task_uuid: Uuid,
    ) -> TaskerResult<TaskClaimState>;

    /// Check if this processor can claim or transfer the task
    async fn can_claim_or_transfer(
        &self,
        task_uuid: Uuid,
        purpose: ClaimPurpose,
    ) -> TaskerResult<bool> {
        let current_state = self.get_claim_state(task_uuid).await?;
        Ok(current_state.can_claim(self.processor_id()))
    }
}

/// Extension trait for claim transfer operations
#[async_trait]
pub trait ClaimTransferable: TaskClaimManager {
    /// Transfer a claim from finalization to step enqueuing
    /// This is the primary use case for TAS-41
    async fn transfer_finalization_to_step_enqueuing(
        &self,
        task_uuid: Uuid,
        timeout_seconds: Option<i32>,
    ) -> TaskerResult<TaskClaimState> {
        self.transfer_claim(
            task_uuid,
            ClaimPurpose::Finalization,
            ClaimPurpose::StepEnqueueing,
            timeout_seconds,
        ).await
    }

    /// Transfer a claim from step enqueuing to processing
    async fn transfer_step_enqueuing_to_processing(
        &self,
        task_uuid: Uuid,
        timeout_seconds: Option<i32>,
    ) -> TaskerResult<TaskClaimState> {
        self.transfer_claim(
            task_uuid,
            ClaimPurpose::StepEnqueueing,
            ClaimPurpose::Processing,
            timeout_seconds,
        ).await
    }

    /// Chain multiple claim operations in sequence with automatic transfer
    /// This is useful for complex multi-phase operations
    async fn claim_and_transfer_chain(
        &self,
        task_uuid: Uuid,
        purposes: Vec<ClaimPurpose>,
        timeout_seconds: Option<i32>,
    ) -> TaskerResult<Vec<TaskClaimState>> {
        if purposes.is_empty() {
            return Err(TaskerError::InvalidOperation("Empty purposes chain".to_string()));
        }

        let mut states = Vec::new();
        let mut current_purpose = purposes[0].clone();

        // Initial claim
        let initial_state = self.claim_task(task_uuid, current_purpose.clone(), timeout_seconds).await?;
        states.push(initial_state);

        // Transfer through the chain
        for next_purpose in purposes.into_iter().skip(1) {
            let transferred_state = self.transfer_claim(
                task_uuid,
                current_purpose,
                next_purpose.clone(),
                timeout_seconds,
            ).await?;
            
            states.push(transferred_state);
            current_purpose = next_purpose;
        }

        Ok(states)
    }
}

/// Errors specific to claim management operations
#[derive(Debug, thiserror::Error)]
pub enum ClaimManagerError {
    #[error("Claim transfer not supported between {from:?} and {to:?}")]
    UnsupportedTransfer {
        from: ClaimPurpose,
        to: ClaimPurpose,
    },

    #[error("Processor {processor_id} cannot transfer claim held by {current_holder}")]
    TransferNotAuthorized {
        processor_id: String,
        current_holder: String,
    },

    #[error("Claim has expired and cannot be transferred")]
    ClaimExpired,

    #[error("Database operation failed: {message}")]
    DatabaseError { message: String },
}

impl From<ClaimError> for ClaimManagerError {
    fn from(error: ClaimError) -> Self {
        match error {
            ClaimError::AlreadyClaimed { current_holder, .. } => {
                ClaimManagerError::TransferNotAuthorized {
                    processor_id: "unknown".to_string(),
                    current_holder: current_holder.unwrap_or_default(),
                }
            }
            ClaimError::NotClaimHolder { actual_holder, .. } => {
                ClaimManagerError::TransferNotAuthorized {
                    processor_id: "unknown".to_string(),
                    current_holder: actual_holder,
                }
            }
            _ => ClaimManagerError::DatabaseError {
                message: error.to_string(),
            },
        }
    }
}

impl From<TaskerError> for ClaimManagerError {
    fn from(error: TaskerError) -> Self {
        ClaimManagerError::DatabaseError {
            message: error.to_string(),
        }
    }
}
