//! Checks and steps shared by more than one dispatch API.
use log::*;

use crate::{
    db_types::{NewAuditEntry, TeamMember, TeamOrderAssignment},
    dispatch_api::errors::DispatchError,
    traits::{AssignmentStore, AuditLogger, MembershipLookup},
};

/// Resolves `user_id`'s membership of `team_id` and insists that they are an active leader. A user that is not on the
/// team at all is refused the same way as an inactive or non-leader member.
pub(crate) async fn require_active_leader<B: MembershipLookup>(
    db: &B,
    team_id: i64,
    user_id: i64,
) -> Result<TeamMember, DispatchError> {
    match db.fetch_member(team_id, user_id).await? {
        Some(member) if member.is_active_leader() => Ok(member),
        Some(member) => {
            debug!("User #{user_id} is a {} ({}) of team #{team_id}, not an active leader", member.role, member.status);
            Err(DispatchError::PermissionDenied(format!("User #{user_id} is not an active leader of team #{team_id}")))
        },
        None => {
            debug!("User #{user_id} is not a member of team #{team_id}");
            Err(DispatchError::PermissionDenied(format!("User #{user_id} is not an active leader of team #{team_id}")))
        },
    }
}

/// Fetches the order's current assignment and checks that `team_id` owns it.
pub(crate) async fn require_team_assignment<B: AssignmentStore>(
    db: &B,
    order_id: i64,
    team_id: i64,
) -> Result<TeamOrderAssignment, DispatchError> {
    let assignment = db
        .fetch_current_assignment_for_order(order_id)
        .await?
        .ok_or_else(|| DispatchError::NotFound(format!("No team assignment for order #{order_id}")))?;
    if assignment.team_id != team_id {
        return Err(DispatchError::AssignmentConflict(format!(
            "Order #{order_id} is assigned to team #{}, not team #{team_id}",
            assignment.team_id
        )));
    }
    Ok(assignment)
}

/// Appends an audit entry. The audit trail is best-effort, so failures are logged and otherwise ignored.
pub(crate) async fn append_audit<B: AuditLogger>(db: &B, entry: NewAuditEntry) {
    let (entity, id, action) = (entry.entity_type, entry.entity_id, entry.action);
    if let Err(e) = db.append(entry).await {
        warn!("Could not record {action:?} audit entry for {entity:?} #{id}: {e}");
    }
}
