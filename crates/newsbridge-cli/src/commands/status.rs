use anyhow::Result;

use newsbridge_core::storage::{ArticleRepository, Database, SettingsRepository};

pub async fn run(db: &Database) -> Result<()> {
    let stats = ArticleRepository::new(db).stats().await?;
    let settings = SettingsRepository::new(db).load().await?;

    println!(
        "Articles: {} total, {} translated, {} pending",
        stats.total, stats.translated, stats.untranslated
    );
    for (source, count) in &stats.by_source {
        println!("  {:<20} {}", source, count);
    }

    match settings {
        Some(s) => {
            println!(
                "Auto-run: {} (every {} minutes, {} per source)",
                if s.auto_crawl_enabled { "enabled" } else { "disabled" },
                s.crawl_interval_minutes,
                s.articles_per_source_limit
            );
            if let Some(last) = s.last_run_time {
                println!("Last run: {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            if let Some(next) = s.next_run_time {
                println!("Next run: {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => println!("Auto-run: not configured"),
    }

    Ok(())
}
