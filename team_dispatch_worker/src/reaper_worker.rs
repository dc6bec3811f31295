use std::{sync::Arc, time::Duration};

use log::*;
use team_dispatch_engine::{
    assignment_objects::SweepResult,
    helpers::{Clock, SystemClock},
    ReaperApi,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::{config::WorkerConfig, errors::WorkerError};

/// Opens the database and runs the reaper until Ctrl-C is pressed.
pub async fn run_worker(config: WorkerConfig) -> Result<(), WorkerError> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| WorkerError::DatabaseError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| WorkerError::MigrationError(e.to_string()))?;
    }
    let worker = start_reaper_worker(db.clone(), Arc::new(SystemClock), config.sweep_interval);
    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutting down");
    worker.abort();
    let result = match worker.await {
        Err(e) if e.is_panic() => Err(WorkerError::InitializeError(format!("The reaper worker panicked. {e}"))),
        _ => Ok(()),
    };
    db.close().await;
    result
}

/// Starts the reaper worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_reaper_worker(db: SqliteDatabase, clock: Arc<dyn Clock>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = ReaperApi::new(db, clock);
        info!("⏰️ Dispatch deadline reaper started. Sweeping every {}s", interval.as_secs_f32());
        loop {
            timer.tick().await;
            trace!("⏰️ Running dispatch deadline sweep");
            match api.sweep().await {
                Ok(result) => log_sweep(&result),
                Err(e) => {
                    error!("⏰️ Error running dispatch deadline sweep: {e}");
                },
            }
        }
    })
}

fn log_sweep(result: &SweepResult) {
    if result.released_count() > 0 {
        info!("⏰️ {} expired assignments released", result.released_count());
    }
    for a in &result.released {
        debug!(
            "⏰️ Released assignment #{} (order #{}, team #{}), deadline was {}",
            a.id, a.order_id, a.team_id, a.dispatch_deadline
        );
    }
    for failure in &result.failures {
        warn!(
            "⏰️ Could not release assignment #{} for order #{}. {}",
            failure.assignment_id, failure.order_id, failure.error
        );
    }
}
