use sqlx::SqliteConnection;

use crate::db_types::{MemberStatus, TeamMember, TeamRole};

pub async fn fetch_member(
    team_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<TeamMember>, sqlx::Error> {
    let member = sqlx::query_as("SELECT * FROM team_members WHERE team_id = $1 AND user_id = $2")
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(member)
}

/// Adds (or replaces) a user's membership of a team. Membership is normally managed by the surrounding system; this
/// exists for seeding and tests.
pub async fn upsert_member(
    team_id: i64,
    user_id: i64,
    role: TeamRole,
    status: MemberStatus,
    conn: &mut SqliteConnection,
) -> Result<TeamMember, sqlx::Error> {
    let member = sqlx::query_as(
        r#"
            INSERT INTO team_members (team_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (team_id, user_id) DO UPDATE SET role = excluded.role, status = excluded.status
            RETURNING *;
        "#,
    )
    .bind(team_id)
    .bind(user_id)
    .bind(role)
    .bind(status)
    .bind(chrono::Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(member)
}
