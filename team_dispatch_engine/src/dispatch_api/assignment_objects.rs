use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{AssignmentMember, PayoutShare, ProfitMode, TeamOrderAssignment},
    dispatch_api::errors::DispatchError,
};

pub const DEFAULT_DISPATCH_WINDOW_MINUTES: i64 = 10;

/// Deployment-level settings for snatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// How long a team has to confirm a claim before the reaper releases it.
    pub dispatch_window: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { dispatch_window: Duration::minutes(DEFAULT_DISPATCH_WINDOW_MINUTES) }
    }
}

impl DispatchConfig {
    pub fn with_dispatch_window_minutes(mut self, minutes: i64) -> Self {
        self.dispatch_window = Duration::minutes(minutes);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlanRequest {
    pub leader_id: i64,
    pub order_id: i64,
    pub team_id: i64,
    pub profit_mode: ProfitMode,
    pub shares: Vec<PayoutShare>,
}

impl PayoutPlanRequest {
    pub fn new(leader_id: i64, order_id: i64, team_id: i64, profit_mode: ProfitMode) -> Self {
        Self { leader_id, order_id, team_id, profit_mode, shares: Vec::new() }
    }

    pub fn with_share(mut self, member_id: i64, percent: i64) -> Self {
        self.shares.push(PayoutShare::new(member_id, percent));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlanResponse {
    pub assignment_id: i64,
    pub profit_mode: ProfitMode,
    pub shares: Vec<PayoutShare>,
}

/// A row the reaper could not release on this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub assignment_id: i64,
    pub order_id: i64,
    pub error: DispatchError,
}

#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    /// Assignments that were moved to `Released` and whose order was cleared.
    pub released: Vec<TeamOrderAssignment>,
    pub failures: Vec<SweepFailure>,
}

impl SweepResult {
    pub fn released_count(&self) -> usize {
        self.released.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The outcome of a member accepting or declining an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationOutcome {
    pub member: AssignmentMember,
    /// The assignment as it stands after the response. Its status is `Confirmed` if this response completed the
    /// roster.
    pub assignment: TeamOrderAssignment,
}
