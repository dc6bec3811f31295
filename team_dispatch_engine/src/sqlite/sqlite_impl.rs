//! The SQLite backend for the team dispatch engine.
//!
//! [`SqliteDatabase`] implements every collaborator trait in [`crate::traits`] on top of one connection pool.
//! Exclusivity of team claims is enforced by a partial unique index in the schema, so it holds across any number of
//! processes sharing the database file, not just within one process.
//!
//! Every write runs inside a transaction that is committed before the method returns, so the change is visible to
//! every other connection in the pool by the time the caller sees the result. Reads use a plain pooled connection.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{assignments, audit_log, db_url, new_pool, orders, payout_plans, roster, team_members};
use crate::{
    db_types::{
        AssignmentMember,
        AssignmentStatus,
        AuditEntity,
        AuditEntry,
        MemberState,
        MemberStatus,
        NewAssignment,
        NewAuditEntry,
        NewPayoutPlan,
        Order,
        OrderStatusType,
        OrderUpdate,
        QueueType,
        TeamMember,
        TeamOrderAssignment,
        TeamPayoutPlan,
        TeamRole,
    },
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

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MembershipLookup for SqliteDatabase {
    async fn fetch_member(&self, team_id: i64, user_id: i64) -> Result<Option<TeamMember>, MembershipError> {
        let mut conn = self.pool.acquire().await?;
        let member = team_members::fetch_member(team_id, user_id, &mut conn).await?;
        Ok(member)
    }
}

impl OrderGateway for SqliteDatabase {
    async fn read_for_claim(&self, order_id: i64) -> Result<Option<Order>, OrderGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_partial(&self, order_id: i64, update: OrderUpdate) -> Result<(), OrderGatewayError> {
        if update.is_empty() {
            debug!("🗃️ No fields to update for order #{order_id}. Update request skipped.");
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        trace!("🗃️ Order #{order_id} updating with new values: {update:?}");
        let rows = orders::update_order(order_id, update, Utc::now(), &mut tx).await?;
        if rows == 0 {
            return Err(OrderGatewayError::OrderNotFound(order_id));
        }
        tx.commit().await?;
        trace!("🗃️ Order #{order_id} has been updated.");
        Ok(())
    }
}

impl AssignmentStore for SqliteDatabase {
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<TeamOrderAssignment, AssignmentStoreError> {
        let mut tx = self.pool.begin().await?;
        let assignment = assignments::insert_assignment(assignment, &mut tx).await?;
        tx.commit().await?;
        Ok(assignment)
    }

    async fn fetch_assignment(&self, id: i64) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let assignment = assignments::fetch_assignment(id, &mut conn).await?;
        Ok(assignment)
    }

    async fn fetch_current_assignment_for_order(
        &self,
        order_id: i64,
    ) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let assignment = assignments::fetch_latest_for_order(order_id, &mut conn).await?;
        Ok(assignment)
    }

    async fn fetch_assignments_for_order(
        &self,
        order_id: i64,
    ) -> Result<Vec<TeamOrderAssignment>, AssignmentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let history = assignments::fetch_all_for_order(order_id, &mut conn).await?;
        Ok(history)
    }

    async fn fetch_expired_assignments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeamOrderAssignment>, AssignmentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let expired = assignments::fetch_expired(now, &mut conn).await?;
        trace!("🗃️ {} assignments are past their dispatch deadline", expired.len());
        Ok(expired)
    }

    async fn transition_status(
        &self,
        id: i64,
        from: AssignmentStatus,
        to: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = assignments::update_status(id, from, to, at, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn release_assignment(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<TeamOrderAssignment>, AssignmentStoreError> {
        let mut tx = self.pool.begin().await?;
        let (from, to) = (AssignmentStatus::Dispatching, AssignmentStatus::Released);
        let released = assignments::update_status(id, from, to, at, &mut tx).await?;
        let Some(released) = released else {
            tx.rollback().await?;
            return Ok(None);
        };
        let cleared = orders::clear_released_team(released.order_id, released.team_id, at, &mut tx).await?;
        tx.commit().await?;
        if cleared == 0 {
            debug!(
                "🗃️ Assignment #{id} released. Order #{} no longer named team #{}, so it was left as is",
                released.order_id, released.team_id
            );
        }
        Ok(Some(released))
    }
}

impl AssignmentRoster for SqliteDatabase {
    async fn replace_members(
        &self,
        assignment_id: i64,
        member_ids: &[i64],
    ) -> Result<Vec<AssignmentMember>, RosterError> {
        let mut tx = self.pool.begin().await?;
        let members = roster::replace_members(assignment_id, member_ids, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Assignment #{assignment_id} roster replaced with {} members", members.len());
        Ok(members)
    }

    async fn fetch_members(&self, assignment_id: i64) -> Result<Vec<AssignmentMember>, RosterError> {
        let mut conn = self.pool.acquire().await?;
        let members = roster::fetch_members(assignment_id, &mut conn).await?;
        Ok(members)
    }

    async fn update_member_state(
        &self,
        assignment_id: i64,
        member_id: i64,
        state: MemberState,
        at: DateTime<Utc>,
    ) -> Result<Option<AssignmentMember>, RosterError> {
        let mut tx = self.pool.begin().await?;
        let member = roster::update_member_state(assignment_id, member_id, state, at, &mut tx).await?;
        tx.commit().await?;
        Ok(member)
    }
}

impl PayoutPlanStore for SqliteDatabase {
    async fn upsert_payout_plan(&self, plan: NewPayoutPlan) -> Result<TeamPayoutPlan, PayoutPlanError> {
        let mut tx = self.pool.begin().await?;
        let plan = payout_plans::upsert_plan(plan, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payout plan for assignment #{} saved ({})", plan.assignment_id, plan.profit_mode);
        Ok(plan)
    }

    async fn fetch_payout_plan(&self, assignment_id: i64) -> Result<Option<TeamPayoutPlan>, PayoutPlanError> {
        let mut conn = self.pool.acquire().await?;
        let plan = payout_plans::fetch_plan_for_assignment(assignment_id, &mut conn).await?;
        Ok(plan)
    }
}

impl AuditLogger for SqliteDatabase {
    async fn append(&self, entry: NewAuditEntry) -> Result<(), AuditLogError> {
        let mut tx = self.pool.begin().await?;
        audit_log::insert_entry(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `TDE_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in the binary.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }

    /// Seeds an order row. In production, orders are written by the marketplace.
    pub async fn insert_order(
        &self,
        order_id: i64,
        status: OrderStatusType,
        queue_type: QueueType,
    ) -> Result<Order, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order_id, status, queue_type, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Seeds a team membership. In production, membership is managed by the marketplace.
    pub async fn upsert_team_member(
        &self,
        team_id: i64,
        user_id: i64,
        role: TeamRole,
        status: MemberStatus,
    ) -> Result<TeamMember, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let member = team_members::upsert_member(team_id, user_id, role, status, &mut tx).await?;
        tx.commit().await?;
        Ok(member)
    }

    pub async fn audit_entries_for(
        &self,
        entity_type: AuditEntity,
        entity_id: i64,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        audit_log::fetch_entries_for(entity_type, entity_id, &mut conn).await
    }
}
