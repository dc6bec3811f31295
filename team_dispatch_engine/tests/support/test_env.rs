use std::sync::Arc;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use team_dispatch_engine::{
    db_types::{MemberStatus, Order, OrderStatusType, QueueType, TeamRole},
    helpers::ManualClock,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};

/// A migrated, empty database and a clock the test controls.
pub struct TestEnv {
    pub db: SqliteDatabase,
    pub clock: ManualClock,
}

impl TestEnv {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating database");
        Self { db, clock: ManualClock::default() }
    }

    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::new(self.clock.clone())
    }

    /// A second, independent connection pool on the same database file.
    pub async fn second_handle(&self) -> SqliteDatabase {
        SqliteDatabase::new_with_url(self.db.url(), 2).await.expect("Error opening second connection pool")
    }

    pub async fn team_order(&self, order_id: i64) -> Order {
        self.db.insert_order(order_id, OrderStatusType::Pending, QueueType::Team).await.expect("Error inserting order")
    }

    /// Creates `leader_id` as the active leader of `team_id`.
    pub async fn leader(&self, team_id: i64, leader_id: i64) {
        self.db
            .upsert_team_member(team_id, leader_id, TeamRole::Leader, MemberStatus::Active)
            .await
            .expect("Error adding leader");
    }

    pub async fn member(&self, team_id: i64, user_id: i64, status: MemberStatus) {
        self.db.upsert_team_member(team_id, user_id, TeamRole::Member, status).await.expect("Error adding member");
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        self.db.close().await;
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Failed to drop database {url}: {e}");
        }
    }
}
