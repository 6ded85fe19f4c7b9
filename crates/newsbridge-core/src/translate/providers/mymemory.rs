use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::TranslationProvider;
use crate::{Error, Result};

const ENDPOINT: &str = "https://api.mymemory.translated.net/get";

/// MyMemory's free tier. Small request limit and a daily quota; quota
/// exhaustion arrives either as status 429 or as a warning string in
/// the translated text itself.
pub struct MyMemoryProvider {
    client: Client,
}

impl MyMemoryProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct Payload {
    // Number on success, sometimes a string on error.
    #[serde(rename = "responseStatus")]
    status: Value,
    #[serde(rename = "responseData")]
    data: PayloadData,
}

#[derive(Deserialize)]
struct PayloadData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    fn max_chars(&self) -> usize {
        450
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let langpair = format!("en|{}", target_lang);
        let response = self
            .client
            .get(ENDPOINT)
            .query(&[("q", text), ("langpair", &langpair)])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("mymemory returned 429".to_string()));
        }
        if !response.status().is_success() {
            return Err(Error::Translation(format!(
                "mymemory returned status {}",
                response.status()
            )));
        }

        let payload: Payload = response.json().await?;
        interpret(payload)
    }
}

fn interpret(payload: Payload) -> Result<String> {
    let status = payload
        .status
        .as_i64()
        .or_else(|| payload.status.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(0);

    let text = payload.data.translated_text;

    if status == 429 || text.to_uppercase().contains("MYMEMORY WARNING") {
        return Err(Error::RateLimited("mymemory quota exhausted".to_string()));
    }
    if status != 200 {
        return Err(Error::Translation(format!(
            "mymemory responseStatus {}",
            status
        )));
    }
    if text.is_empty() {
        return Err(Error::Translation("mymemory returned empty text".to_string()));
    }
    Ok(text)
}
