use thiserror::Error;

use crate::db_types::TeamMember;

#[derive(Debug, Clone, Error)]
pub enum MembershipError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for MembershipError {
    fn from(e: sqlx::Error) -> Self {
        MembershipError::DatabaseError(e.to_string())
    }
}

/// Read-only access to team membership.
#[allow(async_fn_in_trait)]
pub trait MembershipLookup {
    /// Fetches the membership record of `user_id` in `team_id`. If the user is not a member of the team, `None` is
    /// returned.
    async fn fetch_member(&self, team_id: i64, user_id: i64) -> Result<Option<TeamMember>, MembershipError>;
}
