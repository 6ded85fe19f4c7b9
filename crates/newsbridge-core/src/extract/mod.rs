mod arxiv;
mod html;
mod rss;

pub use arxiv::ArxivExtractor;
pub use html::{first_paragraph, normalize_html, summary_snippet};
pub use rss::RssExtractor;

use std::collections::HashMap;

use reqwest::Client;

use crate::config::AppConfig;
use crate::feed::{ExtractionStrategy, RawItem};

/// Structured text produced by an extractor.
#[derive(Debug, Clone)]
pub struct NormalizedContent {
    pub body: String,
    /// Abstract for sources that carry one; callers fall back to a
    /// body snippet otherwise.
    pub summary: Option<String>,
}

/// Per-source extraction strategy.
///
/// `None` drops the item with a logged reason; extraction never
/// propagates errors past this trait.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, item: &RawItem) -> Option<NormalizedContent>;
}

/// Strategy-to-extractor map. New sources pick an existing strategy or
/// register a new one here; shared logic stays untouched.
pub struct ExtractorSet {
    map: HashMap<ExtractionStrategy, Box<dyn Extractor>>,
}

impl ExtractorSet {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        let min_len = config.crawl.min_content_length;

        let mut map: HashMap<ExtractionStrategy, Box<dyn Extractor>> = HashMap::new();
        map.insert(
            ExtractionStrategy::Rss,
            Box::new(RssExtractor::new(client.clone(), min_len)),
        );
        map.insert(
            ExtractionStrategy::ArxivApi,
            Box::new(ArxivExtractor::new(client, min_len)),
        );

        Self { map }
    }

    pub fn get(&self, strategy: ExtractionStrategy) -> Option<&dyn Extractor> {
        self.map.get(&strategy).map(|b| b.as_ref())
    }
}
