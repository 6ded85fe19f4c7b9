use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::retry::write_with_retry;
use super::Database;
use crate::Result;

/// The admin-mutable run configuration. The pipeline only reads it;
/// an external admin surface owns all writes except run timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub crawl_interval_minutes: u32,
    pub articles_per_source_limit: u32,
    pub auto_crawl_enabled: bool,
    pub interest_keywords: Vec<String>,
    pub last_run_time: Option<DateTime<Utc>>,
    pub next_run_time: Option<DateTime<Utc>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            crawl_interval_minutes: 240,
            articles_per_source_limit: 20,
            auto_crawl_enabled: false,
            interest_keywords: Vec::new(),
            last_run_time: None,
            next_run_time: None,
        }
    }
}

impl RunConfig {
    /// The fields the scheduler cares about; used to detect changes
    /// worth reconfiguring the timer for.
    pub fn schedule_key(&self) -> (bool, u32) {
        (self.auto_crawl_enabled, self.crawl_interval_minutes)
    }
}

#[derive(FromRow)]
struct SettingsRow {
    crawl_interval_minutes: i64,
    articles_per_source_limit: i64,
    auto_crawl_enabled: i64,
    interest_keywords: String,
    last_run_time: Option<DateTime<Utc>>,
    next_run_time: Option<DateTime<Utc>>,
}

impl From<SettingsRow> for RunConfig {
    fn from(row: SettingsRow) -> Self {
        RunConfig {
            crawl_interval_minutes: row.crawl_interval_minutes.max(1) as u32,
            articles_per_source_limit: row.articles_per_source_limit.max(1) as u32,
            auto_crawl_enabled: row.auto_crawl_enabled != 0,
            interest_keywords: serde_json::from_str(&row.interest_keywords)
                .unwrap_or_default(),
            last_run_time: row.last_run_time,
            next_run_time: row.next_run_time,
        }
    }
}

/// Repository for the single persisted settings record.
pub struct SettingsRepository<'a> {
    db: &'a Database,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load the settings record. None means no admin has configured
    /// anything yet; the scheduler treats that as auto-run disabled.
    pub async fn load(&self) -> Result<Option<RunConfig>> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            SELECT crawl_interval_minutes, articles_per_source_limit,
                   auto_crawl_enabled, interest_keywords,
                   last_run_time, next_run_time
            FROM settings WHERE id = 1
            "#,
        )
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(RunConfig::from))
    }

    /// Load settings, seeding the default record on first access.
    pub async fn load_or_default(&self) -> Result<RunConfig> {
        if let Some(config) = self.load().await? {
            return Ok(config);
        }

        let defaults = RunConfig::default();
        self.save(&defaults).await?;
        tracing::info!("Seeded default settings record");
        Ok(defaults)
    }

    /// Write the full settings record. Used by the admin surface and by
    /// tests; the pipeline itself only calls record_run.
    pub async fn save(&self, config: &RunConfig) -> Result<()> {
        let keywords = serde_json::to_string(&config.interest_keywords)?;

        write_with_retry(|| {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO settings
                (id, crawl_interval_minutes, articles_per_source_limit,
                 auto_crawl_enabled, interest_keywords, last_run_time, next_run_time)
                VALUES (1, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(config.crawl_interval_minutes as i64)
            .bind(config.articles_per_source_limit as i64)
            .bind(config.auto_crawl_enabled as i64)
            .bind(&keywords)
            .bind(config.last_run_time)
            .bind(config.next_run_time)
            .execute(self.db.pool())
        })
        .await?;

        Ok(())
    }

    /// Record run timestamps after an orchestrator invocation.
    pub async fn record_run(
        &self,
        last_run: DateTime<Utc>,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<()> {
        write_with_retry(|| {
            sqlx::query(
                "UPDATE settings SET last_run_time = ?, next_run_time = ? WHERE id = 1",
            )
            .bind(last_run)
            .bind(next_run)
            .execute(self.db.pool())
        })
        .await?;

        Ok(())
    }
}
