use anyhow::Result;

use newsbridge_core::{storage::Database, AppConfig, Orchestrator};

pub async fn run(db: Database, config: AppConfig) -> Result<()> {
    let retention_days = config.general.article_retention_days;
    let orchestrator = Orchestrator::new(db, config)?;
    let deleted = orchestrator.cleanup().await?;

    println!(
        "Deleted {} articles older than {} days",
        deleted, retention_days
    );
    Ok(())
}
