use anyhow::Result;

use newsbridge_core::{storage::Database, AppConfig, Orchestrator};

pub async fn run(db: Database, config: AppConfig) -> Result<()> {
    let orchestrator = Orchestrator::new(db, config)?;
    let summary = orchestrator.run().await?;

    println!(
        "Sources:      {} ok, {} failed",
        summary.sources_ok, summary.sources_failed
    );
    println!(
        "Items:        {} seen, {} extracted",
        summary.items_seen, summary.items_extracted
    );
    println!(
        "Articles:     {} inserted, {} already known",
        summary.inserted, summary.skipped
    );
    println!(
        "Translations: {} succeeded, {} failed",
        summary.translations_succeeded, summary.translations_failed
    );
    if let Some(reason) = summary.translation_aborted {
        println!("Translation phase aborted early: {}", reason);
    }

    Ok(())
}
