use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use super::models::{ExtractionStrategy, RawItem, SourceDescriptor};
use super::sources::ARXIV_SEARCH_QUERY;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Reads one source into raw items. Network failures surface as a
/// per-source error; the caller isolates them so one broken source
/// never aborts a run.
pub struct FeedReader {
    client: Client,
    page_delay: Duration,
    page_size: usize,
    lookback_days: u32,
}

impl FeedReader {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(
            config.crawl.request_timeout_secs,
            config.crawl.max_redirects,
        )?;

        Ok(Self {
            client,
            page_delay: Duration::from_millis(config.crawl.page_delay_ms),
            page_size: config.crawl.page_size.max(1),
            lookback_days: config.crawl.lookback_days,
        })
    }

    /// Build HTTP client with bounded timeout and redirect count
    fn build_client(timeout_secs: u64, max_redirects: usize) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/html,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8,zh;q=0.7"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .default_headers(headers)
            .build()
            .map_err(Error::Http)
    }

    /// Share the underlying HTTP client with extractors that perform
    /// secondary page fetches.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Fetch and parse one source into raw items. Any failure is
    /// wrapped with the source name so callers can report and isolate
    /// it per source.
    pub async fn fetch_source(&self, source: &SourceDescriptor) -> Result<Vec<RawItem>> {
        let items = match source.strategy {
            ExtractionStrategy::Rss => self.fetch_feed(source).await,
            ExtractionStrategy::ArxivApi => self.fetch_paginated(source).await,
        };

        items.map_err(|e| Error::Source {
            source: source.name.to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch_feed(&self, source: &SourceDescriptor) -> Result<Vec<RawItem>> {
        tracing::info!("Fetching feed from: {}", source.url);

        let bytes = self.get_bytes(source.url).await?;
        parse_items(&bytes, source.name)
    }

    /// Fetch an offset-paginated API source, page by page, until an
    /// empty page is returned. A fixed delay separates page requests.
    async fn fetch_paginated(&self, source: &SourceDescriptor) -> Result<Vec<RawItem>> {
        let window_start = Utc::now() - ChronoDuration::days(self.lookback_days as i64);
        let date_query = format!(
            "({}) AND submittedDate:[{} TO {}]",
            ARXIV_SEARCH_QUERY,
            window_start.format("%Y%m%d0000"),
            Utc::now().format("%Y%m%d2359"),
        );

        let mut items = Vec::new();
        let mut start = 0usize;

        loop {
            tracing::debug!("Fetching {} page at offset {}", source.name, start);

            let response = self
                .client
                .get(source.url)
                .query(&[
                    ("search_query", date_query.as_str()),
                    ("sortBy", "submittedDate"),
                    ("sortOrder", "descending"),
                    ("start", &start.to_string()),
                    ("max_results", &self.page_size.to_string()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::FeedParse(format!(
                    "HTTP {} for URL: {}",
                    status, source.url
                )));
            }

            let bytes = response.bytes().await?;
            self.ensure_content_size(bytes.len(), source.url)?;

            let page = parse_items(&bytes, source.name)?;
            if page.is_empty() {
                break;
            }

            start += page.len();
            items.extend(page);

            tokio::time::sleep(self.page_delay).await;
        }

        tracing::info!("Source '{}': {} items across pages", source.name, items.len());
        Ok(items)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        let bytes = response.bytes().await?;
        self.ensure_content_size(bytes.len(), url)?;

        Ok(bytes.to_vec())
    }

    fn ensure_content_size(&self, size: usize, url: &str) -> Result<()> {
        if size > MAX_FEED_BYTES {
            return Err(Error::FeedParse(format!(
                "Feed too large ({} bytes) for URL: {}",
                size, url
            )));
        }
        Ok(())
    }
}

/// Parse RSS/Atom bytes into raw items. Entries without a resolvable
/// link are skipped; they cannot be deduplicated downstream.
fn parse_items(content: &[u8], source_name: &str) -> Result<Vec<RawItem>> {
    let feed = feed_rs::parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            let content = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content))
                .unwrap_or_default();

            let published_at = entry.published.or(entry.updated);

            Some(RawItem {
                title,
                url,
                content,
                published_at,
                source: source_name.to_string(),
            })
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <item>
      <title>First post</title>
      <link>https://example.com/first</link>
      <description>&lt;p&gt;Hello world&lt;/p&gt;</description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No link entry</title>
      <description>dropped</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_entries_and_skips_linkless() {
        let items = parse_items(SAMPLE_RSS.as_bytes(), "Example Blog").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "First post");
        assert_eq!(items[0].url, "https://example.com/first");
        assert_eq!(items[0].source, "Example Blog");
        assert!(items[0].content.contains("Hello world"));
        assert!(items[0].published_at.is_some());
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(parse_items(b"not a feed at all", "x").is_err());
    }

    #[test]
    fn builds_client_with_bounds() {
        let config = AppConfig::default();
        assert!(FeedReader::new(&config).is_ok());
    }

    #[tokio::test]
    async fn fetch_failures_carry_the_source_name() {
        let reader = FeedReader::new(&AppConfig::default()).unwrap();
        let source = SourceDescriptor {
            name: "Unreachable Blog",
            // Port 1 refuses the connection immediately.
            url: "http://127.0.0.1:1/feed.xml",
            strategy: ExtractionStrategy::Rss,
        };

        let err = reader.fetch_source(&source).await.unwrap_err();
        match err {
            Error::Source { source, .. } => assert_eq!(source, "Unreachable Blog"),
            other => panic!("expected Error::Source, got {}", other),
        }
    }
}
