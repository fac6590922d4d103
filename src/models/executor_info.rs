//! Registered-executor liveness and lifecycle record.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Lifecycle state of a registered executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    Joining,
    Running,
    ClosingGracefully,
    Closing,
    Closed,
    Rejecting,
}

impl ExecutorState {
    /// States in which the executor still participates in orchestration.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ExecutorState::Joining | ExecutorState::Running | ExecutorState::Rejecting
        )
    }

    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            ExecutorState::ClosingGracefully | ExecutorState::Closing | ExecutorState::Closed
        )
    }

    /// Validated transition table. RUNNING is reachable only from JOINING or
    /// REJECTING; anything else attempting it is a stale or confused actor.
    pub fn can_transition_to(self, next: ExecutorState) -> bool {
        use ExecutorState::*;
        match next {
            Joining => false,
            Running => matches!(self, Joining | Rejecting),
            Rejecting => matches!(self, Running),
            ClosingGracefully => matches!(self, Joining | Running | Rejecting),
            Closing => matches!(self, Joining | Running | Rejecting | ClosingGracefully),
            Closed => matches!(self, Closing | ClosingGracefully),
        }
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutorState::Joining => "joining",
            ExecutorState::Running => "running",
            ExecutorState::ClosingGracefully => "closing_gracefully",
            ExecutorState::Closing => "closing",
            ExecutorState::Closed => "closed",
            ExecutorState::Rejecting => "rejecting",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ExecutorState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "joining" => Ok(ExecutorState::Joining),
            "running" => Ok(ExecutorState::Running),
            "closing_gracefully" => Ok(ExecutorState::ClosingGracefully),
            "closing" => Ok(ExecutorState::Closing),
            "closed" => Ok(ExecutorState::Closed),
            "rejecting" => Ok(ExecutorState::Rejecting),
            _ => Err(format!("Invalid executor state: {s}")),
        }
    }
}

/// Shared record describing one registered executor.
///
/// The lease expiry is the liveness signal: a process that dies without
/// deregistering stops refreshing it and the record is swept. `joined_at`
/// gives strategies a deterministic candidate ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorInfo {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub storage_enabled: bool,
    pub state: ExecutorState,
    pub joined_at: DateTime<Utc>,
    pub lease_expires_at: DateTime<Utc>,
    pub completed_count: u64,
    pub rejected_count: u64,
    pub in_progress: u32,
    pub queue_capacity: u32,
    pub queue_depth: u32,
}

impl ExecutorInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Option<String>,
        storage_enabled: bool,
        queue_capacity: u32,
        lease: std::time::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            role,
            storage_enabled,
            state: ExecutorState::Joining,
            joined_at: now,
            lease_expires_at: now + ChronoDuration::from_std(lease).unwrap_or_default(),
            completed_count: 0,
            rejected_count: 0,
            in_progress: 0,
            queue_capacity,
            queue_depth: 0,
        }
    }

    /// Applies a lifecycle transition if the table allows it. Invalid
    /// attempts are logged and rejected, a benign race rather than an error.
    pub fn try_transition(&mut self, next: ExecutorState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            warn!(
                executor_id = %self.id,
                from = %self.state,
                to = %next,
                "rejected invalid executor lifecycle transition"
            );
            false
        }
    }

    /// Running with an unexpired lease: eligible as a strategy candidate.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.state == ExecutorState::Running && self.lease_expires_at > now
    }

    pub fn refresh_lease(&mut self, lease: std::time::Duration) {
        self.lease_expires_at = Utc::now() + ChronoDuration::from_std(lease).unwrap_or_default();
    }
}
