use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{AssignmentStatus, NewAssignment, TeamOrderAssignment},
    traits::AssignmentStoreError,
};

/// Inserts a new `Dispatching` assignment in a single statement.
///
/// The partial unique index on `(order_id) WHERE status <> 'Released'` rejects the insert if the order already has a
/// live assignment. That violation is translated into [`AssignmentStoreError::ActiveAssignmentExists`]. There is no
/// preceding existence check; the index alone decides the winner.
pub async fn insert_assignment(
    assignment: NewAssignment,
    conn: &mut SqliteConnection,
) -> Result<TeamOrderAssignment, AssignmentStoreError> {
    let order_id = assignment.order_id;
    let result: Result<TeamOrderAssignment, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO team_order_assignments (
                order_id,
                team_id,
                status,
                dispatch_deadline,
                locked_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(assignment.order_id)
    .bind(assignment.team_id)
    .bind(AssignmentStatus::Dispatching)
    .bind(assignment.dispatch_deadline)
    .bind(assignment.locked_at)
    .bind(assignment.locked_at)
    .bind(assignment.locked_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(row) => {
            debug!("🗃️ Assignment #{} created for order #{order_id}, team #{}", row.id, row.team_id);
            Ok(row)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            trace!("🗃️ Order #{order_id} already has an active assignment. {e}");
            Err(AssignmentStoreError::ActiveAssignmentExists(order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_assignment(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<TeamOrderAssignment>, sqlx::Error> {
    let assignment =
        sqlx::query_as("SELECT * FROM team_order_assignments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(assignment)
}

pub async fn fetch_latest_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<TeamOrderAssignment>, sqlx::Error> {
    let assignment =
        sqlx::query_as("SELECT * FROM team_order_assignments WHERE order_id = $1 ORDER BY id DESC LIMIT 1")
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    Ok(assignment)
}

pub async fn fetch_all_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TeamOrderAssignment>, sqlx::Error> {
    let assignments = sqlx::query_as("SELECT * FROM team_order_assignments WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(assignments)
}

pub async fn fetch_expired(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<TeamOrderAssignment>, sqlx::Error> {
    let assignments = sqlx::query_as(
        r#"
            SELECT * FROM team_order_assignments
            WHERE status = $1 AND dispatch_deadline < $2
            ORDER BY dispatch_deadline ASC
        "#,
    )
    .bind(AssignmentStatus::Dispatching)
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(assignments)
}

/// Conditionally moves an assignment from `from` to `to`. The `WHERE status = from` clause is the guard: if another
/// writer changed the status first, no row matches and `None` is returned.
pub async fn update_status(
    id: i64,
    from: AssignmentStatus,
    to: AssignmentStatus,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<TeamOrderAssignment>, sqlx::Error> {
    let stamp_column = match to {
        AssignmentStatus::Confirmed => "confirmed_at",
        AssignmentStatus::Released => "released_at",
        AssignmentStatus::Dispatching => "locked_at",
    };
    let sql = format!(
        "UPDATE team_order_assignments SET status = $1, {stamp_column} = $2, updated_at = $3 WHERE id = $4 AND status \
         = $5 RETURNING *"
    );
    let assignment: Option<TeamOrderAssignment> = sqlx::query_as(&sql)
        .bind(to)
        .bind(at)
        .bind(at)
        .bind(id)
        .bind(from)
        .fetch_optional(conn)
        .await?;
    match &assignment {
        Some(_) => trace!("🗃️ Assignment #{id} moved from {from} to {to}"),
        None => trace!("🗃️ Assignment #{id} was not {from}. Status left unchanged"),
    }
    Ok(assignment)
}
