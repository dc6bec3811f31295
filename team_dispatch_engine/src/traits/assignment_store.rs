use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{AssignmentStatus, NewAssignment, TeamOrderAssignment};

#[derive(Debug, Clone, Error)]
pub enum AssignmentStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order #{0} already has an active team assignment")]
    ActiveAssignmentExists(i64),
    #[error("Assignment #{0} does not exist")]
    AssignmentNotFound(i64),
}

impl From<sqlx::Error> for AssignmentStoreError {
    fn from(e: sqlx::Error) -> Self {
        AssignmentStoreError::DatabaseError(e.to_string())
    }
}

/// Storage for [`TeamOrderAssignment`] rows.
///
/// Rows are never deleted. Their status only ever moves along the edges allowed by
/// [`AssignmentStatus::can_transition_to`].
#[allow(async_fn_in_trait)]
pub trait AssignmentStore {
    /// Creates a new `Dispatching` assignment for the order.
    ///
    /// This is a single atomic, store-level conditional write. It fails with
    /// [`AssignmentStoreError::ActiveAssignmentExists`] if the order already has an assignment that is not
    /// `Released`. Callers must not check for an existing assignment first; under contention, exactly one of many
    /// concurrent callers succeeds and the rest receive the conflict error.
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<TeamOrderAssignment, AssignmentStoreError>;

    async fn fetch_assignment(&self, id: i64) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;

    /// The most recently created assignment for the order, whatever its status.
    async fn fetch_current_assignment_for_order(
        &self,
        order_id: i64,
    ) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;

    /// Every assignment ever made for the order, oldest first.
    async fn fetch_assignments_for_order(&self, order_id: i64)
        -> Result<Vec<TeamOrderAssignment>, AssignmentStoreError>;

    /// All `Dispatching` assignments whose dispatch deadline is strictly before `now`.
    async fn fetch_expired_assignments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeamOrderAssignment>, AssignmentStoreError>;

    /// Moves the assignment from `from` to `to`, stamping the matching timestamp column with `at`.
    ///
    /// The write only happens if the row is still in status `from` at the time of the write. If it is not (because
    /// a concurrent writer got there first), nothing changes and `None` is returned. Otherwise, the updated row is
    /// returned.
    async fn transition_status(
        &self,
        id: i64,
        from: AssignmentStatus,
        to: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;

    /// Moves a `Dispatching` assignment to `Released`, stamping `released_at` with `at`, and removes its team from the
    /// order, as one atomic unit.
    ///
    /// The status change carries the same guard as [`AssignmentStore::transition_status`]: if the row is no longer
    /// `Dispatching`, nothing changes and `None` is returned. The order is only touched while it still names the
    /// released team and has no other assignment that is not `Released`, so a claim won in the meantime by another
    /// snatch is never wiped. If any part fails, neither write is applied and the row stays `Dispatching`.
    async fn release_assignment(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError>;
}
