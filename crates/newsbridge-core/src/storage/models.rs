use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rank::Category;

/// The persisted canonical representation of one ingested item.
///
/// Created only by the dedup gate on first sighting of a URL. The
/// translation phase is the sole writer of the translated_* fields and
/// the is_translated flag; engagement counters belong to the external
/// read surface and are never touched by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: Uuid,
    pub title: String,
    /// Structured plain text with heading/list/quote markers
    pub body: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    pub score: i32,
    pub is_translated: bool,
    pub translated_title: Option<String>,
    pub translated_body: Option<String>,
    pub translated_summary: Option<String>,
    pub likes: i64,
    pub views: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    pub score: i32,
    pub published_at: Option<DateTime<Utc>>,
}

/// Store-level counts for the status surface
#[derive(Debug, Clone, Default)]
pub struct ArticleStats {
    pub total: i64,
    pub translated: i64,
    pub untranslated: i64,
    pub by_source: Vec<(String, i64)>,
}
