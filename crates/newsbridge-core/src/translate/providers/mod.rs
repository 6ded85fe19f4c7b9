mod google;
mod mymemory;

pub use google::GoogleWebProvider;
pub use mymemory::MyMemoryProvider;

use async_trait::async_trait;
use reqwest::Client;

use crate::Result;

/// One translation backend. Implementations return `Error::RateLimited`
/// for quota-class failures so callers can abort instead of retrying.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Maximum characters accepted in a single request.
    fn max_chars(&self) -> usize;

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

/// Build the provider chain from configured names, preserving order.
/// Unknown names are logged and skipped.
pub fn build_providers(client: &Client, names: &[String]) -> Vec<Box<dyn TranslationProvider>> {
    let mut providers: Vec<Box<dyn TranslationProvider>> = Vec::new();
    for name in names {
        match name.as_str() {
            "google" => providers.push(Box::new(GoogleWebProvider::new(client.clone()))),
            "mymemory" => providers.push(Box::new(MyMemoryProvider::new(client.clone()))),
            other => tracing::warn!("Unknown translation provider '{}', skipping", other),
        }
    }
    providers
}
