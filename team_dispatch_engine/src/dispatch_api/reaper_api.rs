use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    dispatch_api::{
        assignment_objects::{SweepFailure, SweepResult},
        errors::DispatchError,
    },
    helpers::Clock,
    traits::AssignmentStore,
};

/// `ReaperApi` releases team claims that were not confirmed before their dispatch deadline.
///
/// It is meant to be driven by a scheduler at a fixed cadence (see the `team_dispatch_worker` crate). Each sweep is
/// idempotent: a second sweep at the same instant releases nothing.
pub struct ReaperApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
}

impl<B> Debug for ReaperApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReaperApi")
    }
}

impl<B> ReaperApi<B> {
    pub fn new(db: B, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReaperApi<B>
where B: AssignmentStore
{
    /// Releases every `Dispatching` assignment whose deadline is strictly before now, and clears the team from the
    /// order.
    ///
    /// Each release is its own atomic step (see [`AssignmentStore::release_assignment`]), conditional on the row
    /// still being `Dispatching`, so an assignment that is confirmed between the listing and the write is left alone
    /// and not counted. A failure on one row is recorded in [`SweepResult::failures`] and the sweep carries on with
    /// the rest. A failed row stays `Dispatching`, so the next sweep picks it up again. Only a failure to list the
    /// expired rows fails the sweep as a whole.
    pub async fn sweep(&self) -> Result<SweepResult, DispatchError> {
        let now = self.clock.now();
        let expired = self.db.fetch_expired_assignments(now).await?;
        let mut result = SweepResult::default();
        if expired.is_empty() {
            trace!("⏰️ No expired assignments at {now}");
            return Ok(result);
        }
        debug!("⏰️ {} assignments have passed their dispatch deadline", expired.len());
        for assignment in expired {
            match self.db.release_assignment(assignment.id, now).await {
                Ok(Some(released)) => {
                    debug!(
                        "⏰️ Released assignment #{} of team #{} on order #{}",
                        released.id, released.team_id, released.order_id
                    );
                    result.released.push(released);
                },
                Ok(None) => trace!("⏰️ Assignment #{} changed status before it could be released", assignment.id),
                Err(e) => {
                    let error = DispatchError::from(e);
                    warn!("⏰️ Could not release assignment #{}. {error}", assignment.id);
                    result.failures.push(SweepFailure {
                        assignment_id: assignment.id,
                        order_id: assignment.order_id,
                        error,
                    });
                },
            }
        }
        Ok(result)
    }
}
