use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use newsbridge_core::scheduler::watch_settings;
use newsbridge_core::{storage::Database, AppConfig, Orchestrator, Scheduler};

const SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Foreground daemon: keeps a scheduler alive and follows schedule
/// changes made through the settings record until Ctrl-C.
pub async fn run(db: Database, config: AppConfig) -> Result<()> {
    let orchestrator: Arc<Orchestrator> = Arc::new(Orchestrator::new(db.clone(), config)?);
    let scheduler = Scheduler::new(orchestrator);

    tracing::info!("Daemon started, watching settings for schedule changes");

    tokio::select! {
        _ = watch_settings(&scheduler, &db, SETTINGS_POLL_INTERVAL) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    scheduler.shutdown().await;
    Ok(())
}
