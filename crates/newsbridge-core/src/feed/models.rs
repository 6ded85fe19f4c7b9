use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How raw items from a source are turned into normalized content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Plain RSS/Atom feed; content comes from the entry body.
    Rss,
    /// Offset-paginated arXiv export API; content comes from the
    /// paper's HTML rendering.
    ArxivApi,
}

/// One externally configured feed or API ingested by the pipeline.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: &'static str,
    pub url: &'static str,
    pub strategy: ExtractionStrategy,
}

/// A raw feed entry before extraction. Pipeline-local, never persisted.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    /// Raw HTML/XML fragment from the feed entry
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
}
