use std::{fmt::Debug, sync::Arc};

use log::*;
use serde_json::json;

use crate::{
    db_types::{
        AssignmentSource,
        AssignmentStatus,
        AuditAction,
        AuditEntity,
        NewAssignment,
        NewAuditEntry,
        OrderUpdate,
        TeamOrderAssignment,
    },
    dispatch_api::{
        assignment_objects::DispatchConfig,
        errors::DispatchError,
        guards::{append_audit, require_active_leader, require_team_assignment},
    },
    helpers::Clock,
    traits::{AssignmentStore, AssignmentStoreError, AuditLogger, MembershipLookup, OrderGateway},
};

/// `SnatchApi` lets team leaders claim team-queued orders for their team, and give them up again.
pub struct SnatchApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
    config: DispatchConfig,
}

impl<B> Debug for SnatchApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SnatchApi ({:?})", self.config)
    }
}

impl<B> SnatchApi<B> {
    pub fn new(db: B, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock, config: DispatchConfig::default() }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> SnatchApi<B>
where B: MembershipLookup + OrderGateway + AssignmentStore + AuditLogger
{
    /// Claims `order_id` for `team_id` on behalf of `leader_id`.
    ///
    /// The checks run in order, and the first failure ends the call without side effects:
    /// 1. `leader_id` must be an active leader of the team ([`DispatchError::PermissionDenied`]).
    /// 2. The order must exist ([`DispatchError::NotFound`]), be `Pending`, and sit in the team queue
    ///    ([`DispatchError::OrderNotEligible`]).
    /// 3. The assignment is created in a single conditional write. If any other team holds a claim on the order that
    ///    has not been released, this fails with [`DispatchError::AssignmentConflict`]. Of any number of concurrent
    ///    callers, exactly one gets past this step.
    ///
    /// The winning team is then recorded on the order. If that update fails, the new assignment is *not* rolled back.
    /// The failure is logged with a `RECONCILE` marker and returned. Finally, an audit entry is written on a
    /// best-effort basis.
    pub async fn snatch_order(
        &self,
        leader_id: i64,
        order_id: i64,
        team_id: i64,
    ) -> Result<TeamOrderAssignment, DispatchError> {
        trace!("🏁️ Leader #{leader_id} is trying to snatch order #{order_id} for team #{team_id}");
        require_active_leader(&self.db, team_id, leader_id).await?;
        let order = self
            .db
            .read_for_claim(order_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("Order #{order_id}")))?;
        if !order.is_snatchable() {
            debug!(
                "🏁️ Order #{order_id} is {} in the {} queue. It cannot be snatched.",
                order.status, order.queue_type
            );
            return Err(DispatchError::OrderNotEligible(format!(
                "Order #{order_id} is {} in the {} queue",
                order.status, order.queue_type
            )));
        }
        let now = self.clock.now();
        let new_assignment = NewAssignment::new(order_id, team_id, now, self.config.dispatch_window);
        let assignment = match self.db.create_assignment(new_assignment).await {
            Ok(a) => a,
            Err(e @ AssignmentStoreError::ActiveAssignmentExists(_)) => {
                debug!("🏁️ Team #{team_id} lost the race for order #{order_id}");
                return Err(e.into());
            },
            Err(e) => {
                warn!("🏁️ Could not create assignment for order #{order_id}. {e}");
                return Err(e.into());
            },
        };
        let update = OrderUpdate::default().with_assigned_team(team_id).with_assignment_source(AssignmentSource::Team);
        if let Err(e) = self.db.update_partial(order_id, update).await {
            error!(
                "🏁️ RECONCILE: assignment #{} for order #{order_id} (team #{team_id}) was created, but the order \
                 could not be updated. {e}",
                assignment.id
            );
            return Err(e.into());
        }
        let entry = NewAuditEntry::new(AuditEntity::Order, order_id, AuditAction::AssignTeam)
            .with_actor(leader_id)
            .with_metadata(json!({ "team_id": team_id, "assignment_id": assignment.id }));
        append_audit(&self.db, entry).await;
        info!(
            "🏁️ Team #{team_id} snatched order #{order_id}. Assignment #{} must be confirmed by {}",
            assignment.id, assignment.dispatch_deadline
        );
        Ok(assignment)
    }

    /// Gives up a team's claim on an order before it is confirmed.
    ///
    /// Only an active leader of the team that holds the current assignment may do this, and only while it is still
    /// `Dispatching`. The release is the same atomic step the reaper uses, so a claim that is confirmed or reaped
    /// concurrently is reported as a conflict rather than released twice.
    pub async fn release_assignment(
        &self,
        leader_id: i64,
        order_id: i64,
        team_id: i64,
    ) -> Result<TeamOrderAssignment, DispatchError> {
        require_active_leader(&self.db, team_id, leader_id).await?;
        let assignment = require_team_assignment(&self.db, order_id, team_id).await?;
        if assignment.status != AssignmentStatus::Dispatching {
            return Err(DispatchError::AssignmentConflict(format!(
                "Assignment #{} is already {}",
                assignment.id, assignment.status
            )));
        }
        let now = self.clock.now();
        let released = self.db.release_assignment(assignment.id, now).await?.ok_or_else(|| {
            DispatchError::AssignmentConflict(format!("Assignment #{} is no longer dispatching", assignment.id))
        })?;
        let entry = NewAuditEntry::new(AuditEntity::Assignment, released.id, AuditAction::Release)
            .with_actor(leader_id)
            .with_reason("released by team leader")
            .with_metadata(json!({ "order_id": order_id, "team_id": team_id }));
        append_audit(&self.db, entry).await;
        info!("🏁️ Team #{team_id} released order #{order_id} (assignment #{})", released.id);
        Ok(released)
    }
}

impl<B> SnatchApi<B>
where B: AssignmentStore
{
    /// The most recent assignment for the order, whatever its status.
    pub async fn current_assignment(&self, order_id: i64) -> Result<Option<TeamOrderAssignment>, DispatchError> {
        let assignment = self.db.fetch_current_assignment_for_order(order_id).await?;
        Ok(assignment)
    }

    /// Every assignment the order has had, oldest first.
    pub async fn assignment_history(&self, order_id: i64) -> Result<Vec<TeamOrderAssignment>, DispatchError> {
        let history = self.db.fetch_assignments_for_order(order_id).await?;
        Ok(history)
    }
}
