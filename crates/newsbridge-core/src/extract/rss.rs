use reqwest::Client;

use super::html::normalize_html;
use super::{Extractor, NormalizedContent};
use crate::feed::RawItem;

/// Extractor for plain RSS/Atom sources: normalize the feed fragment,
/// with one secondary fetch of the article page when the fragment is
/// too short to be the full story.
pub struct RssExtractor {
    client: Client,
    min_content_length: usize,
}

impl RssExtractor {
    pub fn new(client: Client, min_content_length: usize) -> Self {
        Self {
            client,
            min_content_length,
        }
    }

    async fn fetch_page(&self, url: &str) -> crate::Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(crate::Error::FeedParse(format!(
                "HTTP {} for URL: {}",
                status, url
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl Extractor for RssExtractor {
    async fn extract(&self, item: &RawItem) -> Option<NormalizedContent> {
        let mut body = normalize_html(&item.content);

        if body.chars().count() < self.min_content_length {
            match self.fetch_page(&item.url).await {
                Ok(page) => {
                    let full = normalize_html(&page);
                    if full.chars().count() > body.chars().count() {
                        body = full;
                    }
                }
                Err(e) => {
                    tracing::debug!("Secondary fetch failed for {}: {}", item.url, e);
                }
            }
        }

        if body.trim().is_empty() {
            tracing::warn!("Dropping '{}': no extractable content", item.title);
            return None;
        }

        Some(NormalizedContent {
            body,
            summary: None,
        })
    }
}
