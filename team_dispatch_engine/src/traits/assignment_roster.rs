use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{AssignmentMember, MemberState};

#[derive(Debug, Clone, Error)]
pub enum RosterError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for RosterError {
    fn from(e: sqlx::Error) -> Self {
        RosterError::DatabaseError(e.to_string())
    }
}

/// The members taking part in an assignment, and whether they have accepted.
#[allow(async_fn_in_trait)]
pub trait AssignmentRoster {
    /// Replaces the roster for the assignment. Every member starts out `Pending`.
    async fn replace_members(
        &self,
        assignment_id: i64,
        member_ids: &[i64],
    ) -> Result<Vec<AssignmentMember>, RosterError>;

    async fn fetch_members(&self, assignment_id: i64) -> Result<Vec<AssignmentMember>, RosterError>;

    /// Records a member's response. Returns `None` if the member is not on the assignment's roster.
    async fn update_member_state(
        &self,
        assignment_id: i64,
        member_id: i64,
        state: MemberState,
        at: DateTime<Utc>,
    ) -> Result<Option<AssignmentMember>, RosterError>;
}
