use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::db_types::{NewPayoutPlan, PayoutShare, ProfitMode, TeamPayoutPlan};

#[derive(Debug, FromRow)]
struct PayoutPlanRow {
    id: i64,
    assignment_id: i64,
    profit_mode: ProfitMode,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PayoutPlanRow {
    fn with_shares(self, shares: Vec<PayoutShare>) -> TeamPayoutPlan {
        TeamPayoutPlan {
            id: self.id,
            assignment_id: self.assignment_id,
            profit_mode: self.profit_mode,
            shares,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Writes the plan header and replaces its shares. This is not atomic on its own; embed the call in a transaction and
/// pass `&mut *tx` as the connection.
pub async fn upsert_plan(plan: NewPayoutPlan, conn: &mut SqliteConnection) -> Result<TeamPayoutPlan, sqlx::Error> {
    let row: PayoutPlanRow = sqlx::query_as(
        r#"
            INSERT INTO team_payout_plans (assignment_id, profit_mode, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assignment_id) DO UPDATE SET
                profit_mode = excluded.profit_mode,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(plan.assignment_id)
    .bind(plan.profit_mode)
    .bind(plan.updated_at)
    .bind(plan.updated_at)
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM team_payout_shares WHERE plan_id = $1").bind(row.id).execute(&mut *conn).await?;
    for share in &plan.shares {
        sqlx::query("INSERT INTO team_payout_shares (plan_id, member_id, percent) VALUES ($1, $2, $3)")
            .bind(row.id)
            .bind(share.member_id)
            .bind(share.percent)
            .execute(&mut *conn)
            .await?;
    }
    trace!("🗃️ Payout plan #{} stored with {} shares", row.id, plan.shares.len());
    Ok(row.with_shares(plan.shares))
}

pub async fn fetch_plan_for_assignment(
    assignment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<TeamPayoutPlan>, sqlx::Error> {
    let row: Option<PayoutPlanRow> = sqlx::query_as("SELECT * FROM team_payout_plans WHERE assignment_id = $1")
        .bind(assignment_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let shares: Vec<PayoutShare> =
        sqlx::query_as("SELECT member_id, percent FROM team_payout_shares WHERE plan_id = $1 ORDER BY id ASC")
            .bind(row.id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(Some(row.with_shares(shares)))
}
