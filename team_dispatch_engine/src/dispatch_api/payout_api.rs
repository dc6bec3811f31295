use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{NewPayoutPlan, PayoutShare, ProfitMode, TeamPayoutPlan},
    dispatch_api::{
        assignment_objects::{PayoutPlanRequest, PayoutPlanResponse},
        errors::DispatchError,
        guards::{require_active_leader, require_team_assignment},
    },
    helpers::Clock,
    traits::{AssignmentStore, MembershipLookup, PayoutPlanStore},
};

/// Custom payout shares are whole percentages that must add up to exactly this.
pub const FULL_PAYOUT_PERCENT: i64 = 100;

/// `PayoutPlanApi` lets a team leader decide how the proceeds of a claimed order are split between the team.
pub struct PayoutPlanApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
}

impl<B> Debug for PayoutPlanApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutPlanApi")
    }
}

impl<B> PayoutPlanApi<B> {
    pub fn new(db: B, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PayoutPlanApi<B>
where B: MembershipLookup + AssignmentStore + PayoutPlanStore
{
    /// Stores the payout plan for the order's current assignment, replacing any earlier plan.
    ///
    /// The caller must be an active leader of `team_id`, and `team_id` must hold the order's current assignment.
    /// `Custom` plans are validated with [`validate_shares`]; `Default` plans are stored as given. Nothing is written
    /// if any check fails.
    pub async fn upsert_payout_plan(&self, request: PayoutPlanRequest) -> Result<PayoutPlanResponse, DispatchError> {
        let PayoutPlanRequest { leader_id, order_id, team_id, profit_mode, shares } = request;
        require_active_leader(&self.db, team_id, leader_id).await?;
        let assignment = require_team_assignment(&self.db, order_id, team_id).await?;
        validate_shares(profit_mode, &shares)?;
        let plan = NewPayoutPlan { assignment_id: assignment.id, profit_mode, shares, updated_at: self.clock.now() };
        let plan = self.db.upsert_payout_plan(plan).await?;
        info!(
            "💸️ Team #{team_id} set a {} payout plan with {} shares for assignment #{}",
            plan.profit_mode,
            plan.shares.len(),
            plan.assignment_id
        );
        Ok(PayoutPlanResponse { assignment_id: plan.assignment_id, profit_mode: plan.profit_mode, shares: plan.shares })
    }

    /// Fetches the stored plan for an assignment, shares included.
    pub async fn payout_plan_for_assignment(&self, assignment_id: i64) -> Result<TeamPayoutPlan, DispatchError> {
        self.db
            .fetch_payout_plan(assignment_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("Payout plan for assignment #{assignment_id}")))
    }
}

/// Checks the share arithmetic of a payout plan.
///
/// In `Custom` mode every share must be strictly positive, and the shares must sum to exactly
/// [`FULL_PAYOUT_PERCENT`]. `Default` mode is an equal split, so its shares are not checked.
pub fn validate_shares(mode: ProfitMode, shares: &[PayoutShare]) -> Result<(), DispatchError> {
    if mode == ProfitMode::Default {
        return Ok(());
    }
    if let Some(share) = shares.iter().find(|s| s.percent <= 0) {
        debug!("💸️ Rejecting payout plan. Member #{} has a share of {}%", share.member_id, share.percent);
        return Err(DispatchError::ValidationError(format!(
            "Share for member #{} must be positive, but was {}%",
            share.member_id, share.percent
        )));
    }
    let total = shares.iter().try_fold(0i64, |acc, s| acc.checked_add(s.percent));
    match total {
        Some(FULL_PAYOUT_PERCENT) => Ok(()),
        Some(total) => {
            debug!("💸️ Rejecting payout plan. Shares sum to {total}%");
            Err(DispatchError::ValidationError(format!("Shares must sum to {FULL_PAYOUT_PERCENT}%, not {total}%")))
        },
        None => Err(DispatchError::ValidationError("Share percentages overflow".into())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn shares(percents: &[i64]) -> Vec<PayoutShare> {
        percents.iter().enumerate().map(|(i, p)| PayoutShare::new(i as i64 + 1, *p)).collect()
    }

    #[test]
    fn custom_shares_must_sum_to_100() {
        assert!(validate_shares(ProfitMode::Custom, &shares(&[60, 40])).is_ok());
        assert!(validate_shares(ProfitMode::Custom, &shares(&[100])).is_ok());
        for bad in [vec![60, 39], vec![60, 41], vec![], vec![50, 50, 1]] {
            let err = validate_shares(ProfitMode::Custom, &shares(&bad)).expect_err("sum is not 100");
            assert!(matches!(err, DispatchError::ValidationError(_)), "{bad:?}");
        }
    }

    #[test]
    fn custom_shares_must_be_positive() {
        let err = validate_shares(ProfitMode::Custom, &shares(&[110, -10])).expect_err("negative share");
        assert!(matches!(err, DispatchError::ValidationError(_)));
        let err = validate_shares(ProfitMode::Custom, &shares(&[100, 0])).expect_err("zero share");
        assert!(matches!(err, DispatchError::ValidationError(_)));
        let err = validate_shares(ProfitMode::Custom, &shares(&[i64::MAX, 1])).expect_err("overflow");
        assert!(matches!(err, DispatchError::ValidationError(_)));
    }

    #[test]
    fn default_shares_are_not_validated() {
        assert!(validate_shares(ProfitMode::Default, &shares(&[])).is_ok());
        assert!(validate_shares(ProfitMode::Default, &shares(&[3, -7])).is_ok());
    }
}
