use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::{AssignmentStatus, Order, OrderStatusType, OrderUpdate, QueueType};

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Inserts an order row. Orders are created by the surrounding marketplace; this exists for seeding and tests.
pub async fn insert_order(
    order_id: i64,
    status: OrderStatusType,
    queue_type: QueueType,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let now = Utc::now();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (id, status, queue_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(queue_type)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order #{order_id} inserted into the {queue_type} queue");
    Ok(order)
}

/// Applies the fields set in `update` to the order. Returns the number of rows affected, which is zero if the order
/// does not exist.
pub async fn update_order(
    order_id: i64,
    update: OrderUpdate,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE orders SET updated_at = ");
    builder.push_bind(at);
    if let Some(team_id) = update.assigned_team_id {
        builder.push(", assigned_team_id = ");
        builder.push_bind(team_id);
    }
    if let Some(source) = update.assignment_source {
        builder.push(", assignment_source = ");
        builder.push_bind(source);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order_id);
    trace!("📝️ Executing query: {}", builder.sql());
    let res = builder.build().execute(conn).await?;
    trace!("📝️ Result of update_order: {res:?}");
    Ok(res.rows_affected())
}

/// Removes `team_id` from the order, but only while the order still names that team and has no assignment other
/// than a released one. A claim recorded by a later winner is left in place. Returns the number of rows affected.
pub async fn clear_released_team(
    order_id: i64,
    team_id: i64,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        r#"
            UPDATE orders SET assigned_team_id = NULL, updated_at = $1
            WHERE id = $2 AND assigned_team_id = $3 AND NOT EXISTS (
                SELECT 1 FROM team_order_assignments WHERE order_id = $4 AND status <> $5
            )
        "#,
    )
    .bind(at)
    .bind(order_id)
    .bind(team_id)
    .bind(order_id)
    .bind(AssignmentStatus::Released)
    .execute(conn)
    .await?;
    trace!("📝️ Cleared team #{team_id} from order #{order_id}: {} rows", res.rows_affected());
    Ok(res.rows_affected())
}
