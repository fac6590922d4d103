pub mod finalization_claimer;
pub mod task_claimer;

pub use finalization_claimer::{
    ClaimGuard, FinalizationClaimResult, FinalizationClaimer, FinalizationClaimerConfig,
};
pub use task_claimer::{ClaimedTask, TaskClaimer};
