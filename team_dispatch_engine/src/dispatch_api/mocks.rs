use chrono::{DateTime, Utc};
use mockall::mock;

use crate::{
    db_types::*,
    traits::{
        AssignmentRoster,
        AssignmentStore,
        AssignmentStoreError,
        AuditLogError,
        AuditLogger,
        MembershipError,
        MembershipLookup,
        OrderGateway,
        OrderGatewayError,
        PayoutPlanError,
        PayoutPlanStore,
        RosterError,
    },
};

mock! {
    pub Backend {}
    impl MembershipLookup for Backend {
        async fn fetch_member(&self, team_id: i64, user_id: i64) -> Result<Option<TeamMember>, MembershipError>;
    }
    impl OrderGateway for Backend {
        async fn read_for_claim(&self, order_id: i64) -> Result<Option<Order>, OrderGatewayError>;
        async fn update_partial(&self, order_id: i64, update: OrderUpdate) -> Result<(), OrderGatewayError>;
    }
    impl AssignmentStore for Backend {
        async fn create_assignment(&self, assignment: NewAssignment) -> Result<TeamOrderAssignment, AssignmentStoreError>;
        async fn fetch_assignment(&self, id: i64) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;
        async fn fetch_current_assignment_for_order(&self, order_id: i64) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;
        async fn fetch_assignments_for_order(&self, order_id: i64) -> Result<Vec<TeamOrderAssignment>, AssignmentStoreError>;
        async fn fetch_expired_assignments(&self, now: DateTime<Utc>) -> Result<Vec<TeamOrderAssignment>, AssignmentStoreError>;
        async fn transition_status(&self, id: i64, from: AssignmentStatus, to: AssignmentStatus, at: DateTime<Utc>) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;
        async fn release_assignment(&self, id: i64, at: DateTime<Utc>) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;
    }
    impl AssignmentRoster for Backend {
        async fn replace_members(&self, assignment_id: i64, member_ids: &[i64]) -> Result<Vec<AssignmentMember>, RosterError>;
        async fn fetch_members(&self, assignment_id: i64) -> Result<Vec<AssignmentMember>, RosterError>;
        async fn update_member_state(&self, assignment_id: i64, member_id: i64, state: MemberState, at: DateTime<Utc>) -> Result<Option<AssignmentMember>, RosterError>;
    }
    impl PayoutPlanStore for Backend {
        async fn upsert_payout_plan(&self, plan: NewPayoutPlan) -> Result<TeamPayoutPlan, PayoutPlanError>;
        async fn fetch_payout_plan(&self, assignment_id: i64) -> Result<Option<TeamPayoutPlan>, PayoutPlanError>;
    }
    impl AuditLogger for Backend {
        async fn append(&self, entry: NewAuditEntry) -> Result<(), AuditLogError>;
    }
}

pub fn leader(team_id: i64, user_id: i64) -> TeamMember {
    TeamMember {
        id: user_id,
        team_id,
        user_id,
        role: TeamRole::Leader,
        status: MemberStatus::Active,
        joined_at: None,
    }
}

pub fn team_order(order_id: i64) -> Order {
    let now = Utc::now();
    Order {
        id: order_id,
        status: OrderStatusType::Pending,
        queue_type: QueueType::Team,
        assigned_team_id: None,
        assignment_source: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn assignment(id: i64, order_id: i64, team_id: i64, deadline: DateTime<Utc>) -> TeamOrderAssignment {
    TeamOrderAssignment {
        id,
        order_id,
        team_id,
        status: AssignmentStatus::Dispatching,
        dispatch_deadline: deadline,
        locked_at: Some(deadline),
        confirmed_at: None,
        released_at: None,
        created_at: deadline,
        updated_at: deadline,
    }
}

/// Mimics a store that honours the status guard.
pub fn transitioned(
    mut row: TeamOrderAssignment,
    to: AssignmentStatus,
    at: DateTime<Utc>,
) -> TeamOrderAssignment {
    row.status = to;
    row.updated_at = at;
    match to {
        AssignmentStatus::Released => row.released_at = Some(at),
        AssignmentStatus::Confirmed => row.confirmed_at = Some(at),
        AssignmentStatus::Dispatching => {},
    }
    row
}
