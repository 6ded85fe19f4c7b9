mod article_repo;
mod database;
mod models;
mod retry;
mod settings_repo;

pub use article_repo::ArticleRepository;
pub use database::Database;
pub use models::{ArticleStats, NewArticle, NewsArticle};
pub use settings_repo::{RunConfig, SettingsRepository};
