//! The run orchestrator: ingest every configured source, persist new
//! articles, then translate whatever is still pending.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use crate::config::AppConfig;
use crate::extract::{first_paragraph, summary_snippet, ExtractorSet};
use crate::feed::{sources::SOURCES, FeedReader, SourceDescriptor};
use crate::rank::{CandidateSelector, Candidate, RelevanceScorer};
use crate::storage::{
    ArticleRepository, Database, NewArticle, RunConfig, SettingsRepository,
};
use crate::translate::Translator;
use crate::Result;

const SUMMARY_SNIPPET_CHARS: usize = 300;

/// Per-run counters reported to the caller and the logs.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sources_ok: u32,
    pub sources_failed: u32,
    pub items_seen: u32,
    pub items_extracted: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub translations_attempted: u32,
    pub translations_succeeded: u32,
    pub translations_failed: u32,
    /// Set when a rate-limit response cut the translation phase short.
    pub translation_aborted: Option<String>,
}

/// Anything the scheduler can fire. Implemented by [`Orchestrator`];
/// tests substitute their own.
#[async_trait]
pub trait RunTrigger: Send + Sync {
    async fn trigger(&self) -> RunSummary;
}

/// Owns the full source-to-database flow for one process.
pub struct Orchestrator {
    db: Database,
    config: AppConfig,
    reader: FeedReader,
    extractors: ExtractorSet,
    translator: Translator,
}

impl Orchestrator {
    pub fn new(db: Database, config: AppConfig) -> Result<Self> {
        let reader = FeedReader::new(&config)?;
        let client = reader.client();
        let extractors = ExtractorSet::new(client.clone(), &config);
        let translator = Translator::new(&client, &config.translation);

        Ok(Self {
            db,
            config,
            reader,
            extractors,
            translator,
        })
    }

    #[cfg(test)]
    fn from_parts(db: Database, config: AppConfig, translator: Translator) -> Self {
        let reader = FeedReader::new(&config).unwrap();
        let extractors = ExtractorSet::new(reader.client(), &config);
        Self {
            db,
            config,
            reader,
            extractors,
            translator,
        }
    }

    /// One full run: ingest, translate pending, record run timestamps.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Utc::now();
        let settings = SettingsRepository::new(&self.db).load_or_default().await?;

        let mut summary = RunSummary::default();
        self.ingest(SOURCES, &settings, &mut summary).await?;
        self.translate_pending(&mut summary).await?;

        let next_run = settings.auto_crawl_enabled.then(|| {
            started + ChronoDuration::minutes(settings.crawl_interval_minutes as i64)
        });
        SettingsRepository::new(&self.db)
            .record_run(started, next_run)
            .await?;

        tracing::info!(
            sources_ok = summary.sources_ok,
            sources_failed = summary.sources_failed,
            inserted = summary.inserted,
            skipped = summary.skipped,
            translated = summary.translations_succeeded,
            "Run finished"
        );

        Ok(summary)
    }

    /// Fetch, extract, score, and persist. Each source fails in
    /// isolation; a broken feed only bumps the failure counter.
    async fn ingest(
        &self,
        sources: &[SourceDescriptor],
        settings: &RunConfig,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let scorer = RelevanceScorer::new(&settings.interest_keywords);
        let mut selector = CandidateSelector::new(
            self.config.crawl.cap_mode,
            settings.articles_per_source_limit as usize,
        );

        for source in sources {
            let items = match self.reader.fetch_source(source).await {
                Ok(items) => {
                    summary.sources_ok += 1;
                    items
                }
                Err(e) => {
                    tracing::warn!(source = source.name, error = %e, "Source fetch failed");
                    summary.sources_failed += 1;
                    continue;
                }
            };

            for item in items {
                summary.items_seen += 1;

                // Skip extraction work for items past a per-source cap.
                if selector.at_capacity(&item.source) {
                    continue;
                }

                let Some(extractor) = self.extractors.get(source.strategy) else {
                    continue;
                };
                let Some(content) = extractor.extract(&item).await else {
                    continue;
                };
                summary.items_extracted += 1;

                let (score, category) = scorer.score(&item.title, &item.source);
                selector.push(Candidate {
                    item,
                    content,
                    score,
                    category,
                });
            }
        }

        let repo = ArticleRepository::new(&self.db);
        for candidate in selector.finish() {
            let summary_text = candidate.content.summary.clone().unwrap_or_else(|| {
                first_paragraph(&candidate.content.body)
                    .map(|p| summary_snippet(p, SUMMARY_SNIPPET_CHARS))
                    .unwrap_or_default()
            });

            let article = NewArticle {
                title: candidate.item.title,
                body: candidate.content.body,
                summary: summary_text,
                url: candidate.item.url,
                source: candidate.item.source,
                category: candidate.category,
                score: candidate.score,
                published_at: candidate.item.published_at,
            };

            match repo.insert_new(&article).await? {
                Some(id) => {
                    tracing::debug!(id = %id, url = %article.url, "Inserted article");
                    summary.inserted += 1;
                }
                None => summary.skipped += 1,
            }
        }

        Ok(())
    }

    /// Translate everything still pending, one article at a time with a
    /// fixed delay in between. An article counts as translated once its
    /// title succeeds; a failed body or summary persists as empty. A
    /// rate-limit response aborts the rest of the queue for this run.
    async fn translate_pending(&self, summary: &mut RunSummary) -> Result<()> {
        let repo = ArticleRepository::new(&self.db);
        let pending = repo.list_untranslated().await?;
        if pending.is_empty() {
            return Ok(());
        }

        tracing::info!(count = pending.len(), "Translating pending articles");
        let delay = Duration::from_millis(self.config.translation.inter_item_delay_ms);

        for (index, article) in pending.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            summary.translations_attempted += 1;

            let title = match self.translator.translate(&article.title).await {
                Ok(t) if !t.is_empty() => t,
                Ok(_) => {
                    tracing::warn!(url = %article.url, "Title translated to empty text");
                    summary.translations_failed += 1;
                    continue;
                }
                Err(e) if e.is_rate_limited() => {
                    summary.translations_failed += 1;
                    summary.translation_aborted = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    tracing::warn!(url = %article.url, error = %e, "Title translation failed");
                    summary.translations_failed += 1;
                    continue;
                }
            };

            let mut aborted = None;
            let body = match self.translator.translate(&article.body).await {
                Ok(t) => t,
                Err(e) => {
                    if e.is_rate_limited() {
                        aborted = Some(e.to_string());
                    }
                    String::new()
                }
            };
            let article_summary = if aborted.is_some() {
                String::new()
            } else {
                match self.translator.translate(&article.summary).await {
                    Ok(t) => t,
                    Err(e) => {
                        if e.is_rate_limited() {
                            aborted = Some(e.to_string());
                        }
                        String::new()
                    }
                }
            };

            repo.update_translation(article.id, &title, &body, &article_summary)
                .await?;
            summary.translations_succeeded += 1;

            if let Some(reason) = aborted {
                summary.translation_aborted = Some(reason);
                break;
            }
        }

        if let Some(reason) = &summary.translation_aborted {
            tracing::warn!(reason = %reason, "Translation phase aborted by rate limit");
        }

        Ok(())
    }

    /// Delete articles past the configured retention window.
    pub async fn cleanup(&self) -> Result<u32> {
        let deleted = ArticleRepository::new(&self.db)
            .cleanup_old_articles(self.config.general.article_retention_days)
            .await?;
        tracing::info!(deleted, "Cleanup finished");
        Ok(deleted)
    }
}

#[async_trait]
impl RunTrigger for Orchestrator {
    async fn trigger(&self) -> RunSummary {
        match self.run().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Scheduled run failed");
                RunSummary::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Category;
    use crate::translate::TranslationProvider;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Succeeds for the first `succeed` calls, then reports a quota hit.
    struct QuotaProvider {
        succeed: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranslationProvider for QuotaProvider {
        fn name(&self) -> &'static str {
            "quota"
        }

        fn max_chars(&self) -> usize {
            4500
        }

        async fn translate(&self, _text: &str, _target_lang: &str) -> crate::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.succeed {
                Ok("译文".to_string())
            } else {
                Err(Error::RateLimited("quota exhausted".to_string()))
            }
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.translation.inter_item_delay_ms = 0;
        config
    }

    async fn seed(db: &Database, n: usize) {
        let repo = ArticleRepository::new(db);
        for i in 0..n {
            // Empty body and summary keep the translator to one call
            // per article (the title).
            let article = NewArticle {
                title: format!("Article number {}", i),
                body: String::new(),
                summary: String::new(),
                url: format!("https://example.com/{}", i),
                source: "OpenAI Blog".to_string(),
                category: Category::General,
                score: 10,
                published_at: Some(Utc::now()),
            };
            repo.insert_new(&article).await.unwrap();
        }
    }

    fn orchestrator_with(db: Database, succeed: usize) -> (Orchestrator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(QuotaProvider {
            succeed,
            calls: calls.clone(),
        });
        let translator = Translator::with_providers(vec![provider], "zh-CN");
        (
            Orchestrator::from_parts(db, test_config(), translator),
            calls,
        )
    }

    #[tokio::test]
    async fn failing_sources_are_isolated() {
        use crate::feed::ExtractionStrategy;

        // Connection-refused endpoints fail fast without touching the
        // network beyond loopback.
        const BROKEN: &[SourceDescriptor] = &[
            SourceDescriptor {
                name: "Broken A",
                url: "http://127.0.0.1:1/a.xml",
                strategy: ExtractionStrategy::Rss,
            },
            SourceDescriptor {
                name: "Broken B",
                url: "http://127.0.0.1:1/b.xml",
                strategy: ExtractionStrategy::Rss,
            },
        ];

        let db = Database::new_in_memory().await.unwrap();
        let (orchestrator, _) = orchestrator_with(db, 0);

        let mut summary = RunSummary::default();
        orchestrator
            .ingest(BROKEN, &RunConfig::default(), &mut summary)
            .await
            .unwrap();

        assert_eq!(summary.sources_failed, 2);
        assert_eq!(summary.sources_ok, 0);
        assert_eq!(summary.inserted, 0);
    }

    #[tokio::test]
    async fn broken_source_never_blocks_a_healthy_one() {
        use crate::feed::ExtractionStrategy;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Long enough that the extractor never attempts a secondary
        // page fetch.
        let filler = "Retrieval quality depends on the index. ".repeat(20);
        let feed = format!(
            r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Healthy Blog</title>
    <item>
      <title>LLM evaluation results</title>
      <link>https://example.com/eval</link>
      <description>{}</description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#,
            filler
        );

        // One-shot loopback HTTP server for the healthy feed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                feed.len(),
                feed
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });

        let sources = [
            SourceDescriptor {
                name: "Healthy Blog",
                url: Box::leak(format!("http://{}/feed.xml", addr).into_boxed_str()),
                strategy: ExtractionStrategy::Rss,
            },
            SourceDescriptor {
                name: "Broken Blog",
                url: "http://127.0.0.1:1/feed.xml",
                strategy: ExtractionStrategy::Rss,
            },
        ];

        let db = Database::new_in_memory().await.unwrap();
        let (orchestrator, _) = orchestrator_with(db.clone(), 0);

        let mut summary = RunSummary::default();
        orchestrator
            .ingest(&sources, &RunConfig::default(), &mut summary)
            .await
            .unwrap();

        assert_eq!(summary.sources_ok, 1);
        assert_eq!(summary.sources_failed, 1);
        assert_eq!(summary.items_seen, 1);
        assert_eq!(summary.inserted, 1);

        let stored = ArticleRepository::new(&db)
            .find_by_url("https://example.com/eval")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.source, "Healthy Blog");
    }

    #[tokio::test]
    async fn rate_limit_aborts_remaining_translations() {
        let db = Database::new_in_memory().await.unwrap();
        seed(&db, 5).await;

        let (orchestrator, _) = orchestrator_with(db.clone(), 1);
        let mut summary = RunSummary::default();
        orchestrator.translate_pending(&mut summary).await.unwrap();

        assert_eq!(summary.translations_attempted, 2);
        assert_eq!(summary.translations_succeeded, 1);
        assert_eq!(summary.translations_failed, 1);
        assert!(summary.translation_aborted.is_some());

        let repo = ArticleRepository::new(&db);
        assert_eq!(repo.list_untranslated().await.unwrap().len(), 4);
        assert_eq!(repo.stats().await.unwrap().translated, 1);
    }

    #[tokio::test]
    async fn all_pending_articles_are_translated() {
        let db = Database::new_in_memory().await.unwrap();
        seed(&db, 3).await;

        let (orchestrator, calls) = orchestrator_with(db.clone(), 100);
        let mut summary = RunSummary::default();
        orchestrator.translate_pending(&mut summary).await.unwrap();

        assert_eq!(summary.translations_succeeded, 3);
        assert!(summary.translation_aborted.is_none());
        // Empty body and summary never reach the provider.
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let repo = ArticleRepository::new(&db);
        assert!(repo.list_untranslated().await.unwrap().is_empty());
        let stored = repo
            .find_by_url("https://example.com/0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.translated_title.as_deref(), Some("译文"));
        assert_eq!(stored.translated_body.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn translated_articles_are_never_revisited() {
        let db = Database::new_in_memory().await.unwrap();
        seed(&db, 2).await;

        let (orchestrator, _) = orchestrator_with(db.clone(), 100);
        let mut first = RunSummary::default();
        orchestrator.translate_pending(&mut first).await.unwrap();
        assert_eq!(first.translations_attempted, 2);

        let mut second = RunSummary::default();
        orchestrator.translate_pending(&mut second).await.unwrap();
        assert_eq!(second.translations_attempted, 0);
    }
}
