use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::models::{ArticleStats, NewArticle, NewsArticle};
use super::retry::write_with_retry;
use super::Database;
use crate::rank::Category;
use crate::Result;

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, body, summary, url, source, category, score,
           is_translated, translated_title, translated_body, translated_summary,
           likes, views, published_at, created_at, updated_at
    FROM articles
"#;

/// Repository for the persisted article store. Insert-only during
/// ingestion; the translation phase performs the only field updates.
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: String,
    title: String,
    body: String,
    summary: String,
    url: String,
    source: String,
    category: String,
    score: i32,
    is_translated: i32,
    translated_title: Option<String>,
    translated_body: Option<String>,
    translated_summary: Option<String>,
    likes: i64,
    views: i64,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ArticleRow> for NewsArticle {
    fn from(row: ArticleRow) -> Self {
        NewsArticle {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            title: row.title,
            body: row.body,
            summary: row.summary,
            url: row.url,
            source: row.source,
            category: Category::parse(&row.category),
            score: row.score,
            is_translated: row.is_translated != 0,
            translated_title: row.translated_title,
            translated_body: row.translated_body,
            translated_summary: row.translated_summary,
            likes: row.likes,
            views: row.views,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new article unless one already exists for the same url
    /// (secondary check: exact title). Returns the new id, or None when
    /// the article was already present. A lost insert race counts as
    /// "already exists", never as an error.
    pub async fn insert_new(&self, article: &NewArticle) -> Result<Option<Uuid>> {
        if self.find_by_url(&article.url).await?.is_some() {
            return Ok(None);
        }
        if self.find_by_title(&article.title).await?.is_some() {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let result = write_with_retry(|| {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO articles
                (id, title, body, summary, url, source, category, score,
                 published_at, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(&article.title)
            .bind(&article.body)
            .bind(&article.summary)
            .bind(&article.url)
            .bind(&article.source)
            .bind(article.category.as_str())
            .bind(article.score)
            .bind(article.published_at)
            .bind(now)
            .bind(now)
            .execute(self.db.pool())
        })
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<NewsArticle>> {
        let row: Option<ArticleRow> =
            sqlx::query_as(&format!("{} WHERE url = ?", SELECT_COLUMNS))
                .bind(url)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(NewsArticle::from))
    }

    pub async fn find_by_title(&self, title: &str) -> Result<Option<NewsArticle>> {
        let row: Option<ArticleRow> =
            sqlx::query_as(&format!("{} WHERE title = ?", SELECT_COLUMNS))
                .bind(title)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(NewsArticle::from))
    }

    /// All records awaiting translation, newest first.
    pub async fn list_untranslated(&self) -> Result<Vec<NewsArticle>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "{} WHERE is_translated = 0 ORDER BY published_at DESC, created_at DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(NewsArticle::from).collect())
    }

    /// Write the outcome of one translation pass. All translated fields
    /// land together and the is_translated flag flips to true; nothing
    /// else ever reverts it.
    pub async fn update_translation(
        &self,
        id: Uuid,
        title: &str,
        body: &str,
        summary: &str,
    ) -> Result<()> {
        let now = Utc::now();

        write_with_retry(|| {
            sqlx::query(
                r#"
                UPDATE articles
                SET translated_title = ?,
                    translated_body = ?,
                    translated_summary = ?,
                    is_translated = 1,
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(title)
            .bind(body)
            .bind(summary)
            .bind(now)
            .bind(id.to_string())
            .execute(self.db.pool())
        })
        .await?;

        Ok(())
    }

    /// Delete articles older than the retention window.
    pub async fn cleanup_old_articles(&self, retention_days: u32) -> Result<u32> {
        let cutoff = Utc::now() - Duration::days(retention_days as i64);

        let result = write_with_retry(|| {
            sqlx::query("DELETE FROM articles WHERE published_at < ?")
                .bind(cutoff)
                .execute(self.db.pool())
        })
        .await?;

        Ok(result.rows_affected() as u32)
    }

    /// Counts for the status surface.
    pub async fn stats(&self) -> Result<ArticleStats> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.db.pool())
            .await?;

        let (translated,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE is_translated = 1")
                .fetch_one(self.db.pool())
                .await?;

        let by_source: Vec<(String, i64)> = sqlx::query_as(
            "SELECT source, COUNT(*) FROM articles GROUP BY source ORDER BY COUNT(*) DESC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(ArticleStats {
            total,
            translated,
            untranslated: total - translated,
            by_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(url: &str, title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            body: "# Heading\n\nBody text.".to_string(),
            summary: "Body text.".to_string(),
            url: url.to_string(),
            source: "Example Blog".to_string(),
            category: Category::AiResearch,
            score: 100,
            published_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn insert_then_duplicate_url_is_skipped() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let first = repo.insert_new(&sample("https://x/a", "A")).await.unwrap();
        assert!(first.is_some());

        // Same url, different title: dedup by url wins.
        let second = repo.insert_new(&sample("https://x/a", "A2")).await.unwrap();
        assert!(second.is_none());

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn duplicate_title_is_skipped() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        repo.insert_new(&sample("https://x/a", "Same Title"))
            .await
            .unwrap();
        let second = repo
            .insert_new(&sample("https://x/b", "Same Title"))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn translation_update_marks_record() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let id = repo
            .insert_new(&sample("https://x/a", "A"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(repo.list_untranslated().await.unwrap().len(), 1);

        repo.update_translation(id, "标题", "正文", "").await.unwrap();

        assert!(repo.list_untranslated().await.unwrap().is_empty());
        let stored = repo.find_by_url("https://x/a").await.unwrap().unwrap();
        assert!(stored.is_translated);
        assert_eq!(stored.translated_title.as_deref(), Some("标题"));
        assert_eq!(stored.translated_summary.as_deref(), Some(""));
        assert_eq!(stored.category, Category::AiResearch);
    }

    #[tokio::test]
    async fn cleanup_removes_only_old_articles() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let mut old = sample("https://x/old", "Old");
        old.published_at = Some(Utc::now() - Duration::days(120));
        repo.insert_new(&old).await.unwrap();
        repo.insert_new(&sample("https://x/new", "New")).await.unwrap();

        let deleted = repo.cleanup_old_articles(90).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.find_by_url("https://x/old").await.unwrap().is_none());
        assert!(repo.find_by_url("https://x/new").await.unwrap().is_some());
    }
}
