//! # Low-level SQLite queries
//!
//! Each table gets a module of free functions that take a `&mut SqliteConnection`. [`crate::SqliteDatabase`] calls
//! them with a pooled connection for single statements, or with an open transaction when several statements must
//! land together (a payout plan and its shares, or a roster replacement).
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod assignments;
pub mod audit_log;
pub mod orders;
pub mod payout_plans;
pub mod roster;
pub mod team_members;

const SQLITE_DB_URL: &str = "sqlite://data/team_dispatch.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn db_url() -> String {
    let result = env::var("TDE_DATABASE_URL").unwrap_or_else(|_| {
        info!("TDE_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Opens a pool on `url`, creating the database file if it does not exist yet.
///
/// Connections use WAL journalling so that readers are not blocked by a writer, and wait up to [`BUSY_TIMEOUT`] for
/// the write lock. Snatches for the same order are serialised by SQLite on that lock.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
