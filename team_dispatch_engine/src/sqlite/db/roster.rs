use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{AssignmentMember, MemberState};

/// Deletes the current roster for the assignment and inserts `member_ids` as `Pending`. Run this inside a transaction
/// so that readers never see a half-written roster.
pub async fn replace_members(
    assignment_id: i64,
    member_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<AssignmentMember>, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM team_assignment_members WHERE assignment_id = $1")
        .bind(assignment_id)
        .execute(&mut *conn)
        .await?;
    trace!("🗃️ Removed {} roster entries for assignment #{assignment_id}", removed.rows_affected());
    let mut members = Vec::with_capacity(member_ids.len());
    for member_id in member_ids {
        let member: AssignmentMember = sqlx::query_as(
            r#"
                INSERT INTO team_assignment_members (assignment_id, member_id, state)
                VALUES ($1, $2, $3)
                RETURNING *;
            "#,
        )
        .bind(assignment_id)
        .bind(*member_id)
        .bind(MemberState::Pending)
        .fetch_one(&mut *conn)
        .await?;
        members.push(member);
    }
    Ok(members)
}

pub async fn fetch_members(
    assignment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AssignmentMember>, sqlx::Error> {
    let members = sqlx::query_as("SELECT * FROM team_assignment_members WHERE assignment_id = $1 ORDER BY id ASC")
        .bind(assignment_id)
        .fetch_all(conn)
        .await?;
    Ok(members)
}

pub async fn update_member_state(
    assignment_id: i64,
    member_id: i64,
    state: MemberState,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<AssignmentMember>, sqlx::Error> {
    let confirmed_at = (state == MemberState::Confirmed).then_some(at);
    let member = sqlx::query_as(
        r#"
            UPDATE team_assignment_members SET state = $1, confirmed_at = $2
            WHERE assignment_id = $3 AND member_id = $4
            RETURNING *;
        "#,
    )
    .bind(state)
    .bind(confirmed_at)
    .bind(assignment_id)
    .bind(member_id)
    .fetch_optional(conn)
    .await?;
    Ok(member)
}
