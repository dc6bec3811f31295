use std::{fmt::Debug, sync::Arc};

use log::*;
use serde_json::json;

use crate::{
    db_types::{
        AssignmentMember,
        AssignmentStatus,
        AuditAction,
        AuditEntity,
        MemberState,
        NewAuditEntry,
        TeamOrderAssignment,
    },
    dispatch_api::{
        assignment_objects::ConfirmationOutcome,
        errors::DispatchError,
        guards::{append_audit, require_active_leader, require_team_assignment},
    },
    helpers::Clock,
    traits::{AssignmentRoster, AssignmentStore, AuditLogger, MembershipLookup},
};

/// `ConfirmationApi` manages who takes part in a claimed order.
///
/// The leader invites team members onto the assignment's roster. Once every invited member has accepted, the
/// assignment is confirmed and is no longer subject to the dispatch deadline.
pub struct ConfirmationApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
}

impl<B> Debug for ConfirmationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfirmationApi")
    }
}

impl<B> ConfirmationApi<B> {
    pub fn new(db: B, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ConfirmationApi<B>
where B: MembershipLookup + AssignmentStore + AssignmentRoster + AuditLogger
{
    /// Replaces the roster of the order's current assignment with `member_ids`, all pending.
    ///
    /// Every id must belong to an active member of the team. Duplicate ids are collapsed.
    pub async fn invite_members(
        &self,
        leader_id: i64,
        order_id: i64,
        team_id: i64,
        member_ids: &[i64],
    ) -> Result<Vec<AssignmentMember>, DispatchError> {
        require_active_leader(&self.db, team_id, leader_id).await?;
        if member_ids.is_empty() {
            return Err(DispatchError::ValidationError("At least one member must be invited".into()));
        }
        let assignment = require_team_assignment(&self.db, order_id, team_id).await?;
        self.require_open(&assignment)?;
        let mut ids = member_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        for &user_id in &ids {
            let active = self.db.fetch_member(team_id, user_id).await?.map(|m| m.is_active()).unwrap_or(false);
            if !active {
                return Err(DispatchError::ValidationError(format!(
                    "User #{user_id} is not an active member of team #{team_id}"
                )));
            }
        }
        let roster = self.db.replace_members(assignment.id, &ids).await?;
        debug!("🏁️ Team #{team_id} invited {} members to assignment #{}", roster.len(), assignment.id);
        Ok(roster)
    }

    /// Records `user_id`'s answer to an invitation.
    ///
    /// When the last pending member accepts, the assignment moves from `Dispatching` to `Confirmed`. A decline leaves
    /// the assignment dispatching, so the leader can invite someone else before the deadline.
    pub async fn respond(
        &self,
        user_id: i64,
        assignment_id: i64,
        accept: bool,
    ) -> Result<ConfirmationOutcome, DispatchError> {
        let assignment = self
            .db
            .fetch_assignment(assignment_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("Assignment #{assignment_id}")))?;
        self.require_open(&assignment)?;
        let now = self.clock.now();
        let state = if accept { MemberState::Confirmed } else { MemberState::Declined };
        let member = self.db.update_member_state(assignment_id, user_id, state, now).await?.ok_or_else(|| {
            DispatchError::NotFound(format!("User #{user_id} is not on the roster of assignment #{assignment_id}"))
        })?;
        debug!("🏁️ User #{user_id} responded to assignment #{assignment_id}: {state}");
        if !accept {
            return Ok(ConfirmationOutcome { member, assignment });
        }
        let roster = self.db.fetch_members(assignment_id).await?;
        if roster.iter().any(|m| m.state != MemberState::Confirmed) {
            return Ok(ConfirmationOutcome { member, assignment });
        }
        let confirmed = self
            .db
            .transition_status(assignment_id, AssignmentStatus::Dispatching, AssignmentStatus::Confirmed, now)
            .await?;
        let Some(confirmed) = confirmed else {
            return self.settle_lost_confirmation(assignment_id, member).await;
        };
        let metadata = json!({ "order_id": confirmed.order_id, "team_id": confirmed.team_id, "members": roster.len() });
        let entry = NewAuditEntry::new(AuditEntity::Assignment, assignment_id, AuditAction::Confirm)
            .with_actor(user_id)
            .with_metadata(metadata);
        append_audit(&self.db, entry).await;
        info!("🏁️ Assignment #{assignment_id} for order #{} is confirmed", confirmed.order_id);
        Ok(ConfirmationOutcome { member, assignment: confirmed })
    }

    /// The roster was complete, but the guarded transition found the assignment no longer dispatching. That is
    /// expected when another member's acceptance confirmed it first; any other status means the claim was lost.
    async fn settle_lost_confirmation(
        &self,
        assignment_id: i64,
        member: AssignmentMember,
    ) -> Result<ConfirmationOutcome, DispatchError> {
        let current = self
            .db
            .fetch_assignment(assignment_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("Assignment #{assignment_id}")))?;
        if current.status == AssignmentStatus::Confirmed {
            debug!("🏁️ Assignment #{assignment_id} was confirmed by a concurrent acceptance");
            return Ok(ConfirmationOutcome { member, assignment: current });
        }
        warn!("🏁️ Roster of assignment #{assignment_id} is complete, but the assignment is {}", current.status);
        Err(DispatchError::AssignmentConflict(format!(
            "Assignment #{assignment_id} was {} before it could be confirmed",
            current.status
        )))
    }

    /// Invitations and responses are only accepted while the assignment is dispatching and inside its window.
    fn require_open(&self, assignment: &TeamOrderAssignment) -> Result<(), DispatchError> {
        if assignment.status != AssignmentStatus::Dispatching {
            return Err(DispatchError::AssignmentConflict(format!(
                "Assignment #{} is already {}",
                assignment.id, assignment.status
            )));
        }
        if assignment.is_expired(self.clock.now()) {
            return Err(DispatchError::AssignmentConflict(format!(
                "The dispatch deadline of assignment #{} has passed",
                assignment.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;
    use crate::{dispatch_api::mocks::*, helpers::ManualClock, traits::AuditLogError};

    fn member(assignment_id: i64, member_id: i64, state: MemberState) -> AssignmentMember {
        AssignmentMember { id: member_id, assignment_id, member_id, state, confirmed_at: None }
    }

    #[tokio::test]
    async fn last_acceptance_confirms_the_assignment() {
        let clock = ManualClock::default();
        let deadline = clock.now() + Duration::minutes(5);
        let mut db = MockBackend::new();
        db.expect_fetch_assignment().returning(move |id| Ok(Some(assignment(id, 900, 10, deadline))));
        db.expect_update_member_state().returning(|a, m, state, _| Ok(Some(member(a, m, state))));
        db.expect_fetch_members()
            .returning(|a| Ok(vec![member(a, 21, MemberState::Confirmed), member(a, 22, MemberState::Confirmed)]));
        db.expect_transition_status()
            .times(1)
            .returning(move |id, _, to, at| Ok(Some(transitioned(assignment(id, 900, 10, deadline), to, at))));
        db.expect_append().times(1).returning(|_| Err(AuditLogError::WriteError("read-only".into())));
        let api = ConfirmationApi::new(db, Arc::new(clock.clone()));
        let outcome = api.respond(22, 5, true).await.expect("acceptance recorded");
        assert_eq!(outcome.member.state, MemberState::Confirmed);
        assert_eq!(outcome.assignment.status, AssignmentStatus::Confirmed);
        assert_eq!(outcome.assignment.confirmed_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn simultaneous_last_acceptances_both_succeed() {
        let clock = ManualClock::default();
        let deadline = clock.now() + Duration::minutes(5);
        let confirmed_at = clock.now();
        let mut db = MockBackend::new();
        let mut seq = mockall::Sequence::new();
        db.expect_fetch_assignment()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |id| Ok(Some(assignment(id, 900, 10, deadline))));
        db.expect_update_member_state().returning(|a, m, state, _| Ok(Some(member(a, m, state))));
        db.expect_fetch_members()
            .returning(|a| Ok(vec![member(a, 21, MemberState::Confirmed), member(a, 22, MemberState::Confirmed)]));
        // The other member's acceptance won the transition
        db.expect_transition_status().times(1).in_sequence(&mut seq).returning(|_, _, _, _| Ok(None));
        db.expect_fetch_assignment().times(1).in_sequence(&mut seq).returning(move |id| {
            Ok(Some(transitioned(assignment(id, 900, 10, deadline), AssignmentStatus::Confirmed, confirmed_at)))
        });
        db.expect_append().never();
        let api = ConfirmationApi::new(db, Arc::new(clock));
        let outcome = api.respond(21, 5, true).await.expect("acceptance recorded and assignment confirmed");
        assert_eq!(outcome.member.state, MemberState::Confirmed);
        assert_eq!(outcome.assignment.status, AssignmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn complete_roster_on_a_released_assignment_is_a_conflict() {
        let clock = ManualClock::default();
        let deadline = clock.now() + Duration::minutes(5);
        let released_at = clock.now();
        let mut db = MockBackend::new();
        let mut seq = mockall::Sequence::new();
        db.expect_fetch_assignment()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |id| Ok(Some(assignment(id, 900, 10, deadline))));
        db.expect_update_member_state().returning(|a, m, state, _| Ok(Some(member(a, m, state))));
        db.expect_fetch_members().returning(|a| Ok(vec![member(a, 21, MemberState::Confirmed)]));
        db.expect_transition_status().times(1).in_sequence(&mut seq).returning(|_, _, _, _| Ok(None));
        db.expect_fetch_assignment().times(1).in_sequence(&mut seq).returning(move |id| {
            Ok(Some(transitioned(assignment(id, 900, 10, deadline), AssignmentStatus::Released, released_at)))
        });
        let api = ConfirmationApi::new(db, Arc::new(clock));
        let err = api.respond(21, 5, true).await.expect_err("leader released the claim first");
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn pending_members_keep_the_assignment_dispatching() {
        let clock = ManualClock::default();
        let deadline = clock.now() + Duration::minutes(5);
        let mut db = MockBackend::new();
        db.expect_fetch_assignment().returning(move |id| Ok(Some(assignment(id, 900, 10, deadline))));
        db.expect_update_member_state().returning(|a, m, state, _| Ok(Some(member(a, m, state))));
        db.expect_fetch_members()
            .returning(|a| Ok(vec![member(a, 21, MemberState::Confirmed), member(a, 22, MemberState::Pending)]));
        db.expect_transition_status().never();
        let api = ConfirmationApi::new(db, Arc::new(clock));
        let outcome = api.respond(21, 5, true).await.expect("acceptance recorded");
        assert_eq!(outcome.assignment.status, AssignmentStatus::Dispatching);
    }

    #[tokio::test]
    async fn responses_after_the_deadline_are_refused() {
        let clock = ManualClock::default();
        let deadline = clock.now() - Duration::seconds(1);
        let mut db = MockBackend::new();
        db.expect_fetch_assignment().returning(move |id| Ok(Some(assignment(id, 900, 10, deadline))));
        db.expect_update_member_state().never();
        let api = ConfirmationApi::new(db, Arc::new(clock));
        let err = api.respond(21, 5, true).await.expect_err("deadline has passed");
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn invitees_must_be_active_team_members() {
        let clock = ManualClock::default();
        let deadline = clock.now() + Duration::minutes(5);
        let mut db = MockBackend::new();
        db.expect_fetch_member().returning(|team, user| match user {
            1 => Ok(Some(leader(team, user))),
            _ => Ok(None),
        });
        db.expect_fetch_current_assignment_for_order()
            .returning(move |order| Ok(Some(assignment(5, order, 10, deadline))));
        db.expect_replace_members().never();
        let api = ConfirmationApi::new(db, Arc::new(clock));
        let err = api.invite_members(1, 900, 10, &[1, 2]).await.expect_err("user #2 is not on the team");
        assert!(matches!(err, DispatchError::ValidationError(_)));
    }
}
