use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{AuditEntity, AuditEntry, NewAuditEntry};

pub async fn insert_entry(entry: NewAuditEntry, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let metadata = entry.metadata.map(|m| m.to_string());
    sqlx::query(
        r#"
            INSERT INTO operation_logs (entity_type, entity_id, action, actor_user_id, reason, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.action)
    .bind(entry.actor_user_id)
    .bind(entry.reason)
    .bind(metadata)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_entries_for(
    entity_type: AuditEntity,
    entity_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AuditEntry>, sqlx::Error> {
    let entries =
        sqlx::query_as("SELECT * FROM operation_logs WHERE entity_type = $1 AND entity_id = $2 ORDER BY id ASC")
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(conn)
            .await?;
    Ok(entries)
}
