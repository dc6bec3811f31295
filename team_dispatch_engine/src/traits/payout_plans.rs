use thiserror::Error;

use crate::db_types::{NewPayoutPlan, TeamPayoutPlan};

#[derive(Debug, Clone, Error)]
pub enum PayoutPlanError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PayoutPlanError {
    fn from(e: sqlx::Error) -> Self {
        PayoutPlanError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait PayoutPlanStore {
    /// Stores the plan for its assignment, replacing any previous plan (shares included). Last write wins.
    async fn upsert_payout_plan(&self, plan: NewPayoutPlan) -> Result<TeamPayoutPlan, PayoutPlanError>;

    async fn fetch_payout_plan(&self, assignment_id: i64) -> Result<Option<TeamPayoutPlan>, PayoutPlanError>;
}
