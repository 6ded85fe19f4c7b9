use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::TranslationProvider;
use crate::{Error, Result};

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// The keyless web endpoint behind the Google Translate widget. It
/// rate-limits aggressively; a 429 here surfaces as `RateLimited` and
/// is never retried.
pub struct GoogleWebProvider {
    client: Client,
}

impl GoogleWebProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranslationProvider for GoogleWebProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn max_chars(&self) -> usize {
        4500
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let response = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("google web endpoint returned 429".to_string()));
        }
        if !response.status().is_success() {
            return Err(Error::Translation(format!(
                "google web endpoint returned status {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        join_segments(&payload).ok_or_else(|| {
            Error::Translation("unexpected google response shape".to_string())
        })
    }
}

/// The endpoint answers with nested arrays; the first element holds
/// per-segment `[translated, original, ...]` pairs.
fn join_segments(payload: &Value) -> Option<String> {
    let segments = payload.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            out.push_str(piece);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
