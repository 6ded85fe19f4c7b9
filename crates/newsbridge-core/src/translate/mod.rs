//! Translation of stored article fields into the configured target
//! language, via an ordered chain of free providers.

mod providers;
mod segment;

pub use providers::{build_providers, GoogleWebProvider, MyMemoryProvider, TranslationProvider};

use std::time::Duration;

use reqwest::Client;

use crate::config::TranslationConfig;
use crate::{Error, Result};

/// Drives provider selection, chunking, marker protection, and retry
/// for a single text field.
pub struct Translator {
    providers: Vec<Box<dyn TranslationProvider>>,
    target_lang: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl Translator {
    pub fn new(client: &Client, config: &TranslationConfig) -> Self {
        Self {
            providers: build_providers(client, &config.providers),
            target_lang: config.target_lang.clone(),
            max_retries: config.max_retries.max(1),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_providers(
        providers: Vec<Box<dyn TranslationProvider>>,
        target_lang: &str,
    ) -> Self {
        Self {
            providers,
            target_lang: target_lang.to_string(),
            max_retries: 1,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    /// Translate one field. Empty input short-circuits to an empty
    /// result without touching any provider. A rate-limited provider
    /// propagates immediately, skipping the rest of the chain, so the
    /// caller can abort its remaining work.
    pub async fn translate(&self, text: &str) -> Result<String> {
        let normalized = segment::normalize_whitespace(text);
        if normalized.is_empty() {
            return Ok(String::new());
        }
        if self.providers.is_empty() {
            return Err(Error::Translation(
                "no translation providers configured".to_string(),
            ));
        }

        let (protected, markers) = segment::protect_markers(&normalized);

        let mut last_error = None;
        for provider in &self.providers {
            match self.translate_with(provider.as_ref(), &protected).await {
                Ok(result) => {
                    let restored = segment::restore_markers(&result, &markers);
                    if self.looks_untranslated(&normalized, &restored) {
                        tracing::debug!(
                            provider = provider.name(),
                            "Provider returned the input unchanged"
                        );
                        last_error = Some(Error::Translation(format!(
                            "{} returned the text unchanged",
                            provider.name()
                        )));
                        continue;
                    }
                    return Ok(restored);
                }
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Translation provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Translation("all providers failed".to_string())))
    }

    async fn translate_with(
        &self,
        provider: &dyn TranslationProvider,
        text: &str,
    ) -> Result<String> {
        let chunks = segment::split_chunks(text, provider.max_chars());
        let mut out = String::new();
        for chunk in &chunks {
            out.push_str(&self.call_with_retry(provider, chunk).await?);
        }
        Ok(out)
    }

    /// Linear backoff: base delay on the first retry, doubled base on
    /// the second, and so on. Rate-limit errors skip retry entirely.
    async fn call_with_retry(
        &self,
        provider: &dyn TranslationProvider,
        chunk: &str,
    ) -> Result<String> {
        let mut attempt = 1;
        loop {
            match provider.translate(chunk, &self.target_lang).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.retry_base_delay * attempt;
                    tracing::debug!(
                        provider = provider.name(),
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Translation call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A provider that echoes the input back, or produces no target-
    /// script characters for a CJK target, did not actually translate.
    fn looks_untranslated(&self, source: &str, result: &str) -> bool {
        if result.trim() == source.trim() {
            return true;
        }
        if self.target_lang.starts_with("zh") && !has_cjk(result) {
            return true;
        }
        false
    }
}

fn has_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behavior {
        Echo,
        Fixed(&'static str),
        Prefix(&'static str),
        RateLimited,
        Fail,
    }

    struct MockProvider {
        label: &'static str,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn boxed(label: &'static str, behavior: Behavior) -> (Box<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Box::new(Self {
                label,
                behavior,
                calls: calls.clone(),
            });
            (provider, calls)
        }
    }

    #[async_trait]
    impl TranslationProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.label
        }

        fn max_chars(&self) -> usize {
            4500
        }

        async fn translate(&self, text: &str, _target_lang: &str) -> crate::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Echo => Ok(text.to_string()),
                Behavior::Fixed(s) => Ok((*s).to_string()),
                Behavior::Prefix(p) => Ok(format!("{}{}", p, text)),
                Behavior::RateLimited => Err(Error::RateLimited("quota".to_string())),
                Behavior::Fail => Err(Error::Translation("boom".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn empty_input_never_reaches_a_provider() {
        let (provider, calls) = MockProvider::boxed("mock", Behavior::Fixed("中文"));
        let translator = Translator::with_providers(vec![provider], "zh-CN");

        assert_eq!(translator.translate("   \n\n ").await.unwrap(), "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rate_limit_skips_remaining_providers() {
        let (first, _) = MockProvider::boxed("limited", Behavior::RateLimited);
        let (second, second_calls) = MockProvider::boxed("fallback", Behavior::Fixed("中文"));
        let translator = Translator::with_providers(vec![first, second], "zh-CN");

        let err = translator.translate("Hello").await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plain_failure_falls_back_to_next_provider() {
        let (first, _) = MockProvider::boxed("broken", Behavior::Fail);
        let (second, _) = MockProvider::boxed("fallback", Behavior::Fixed("翻译结果"));
        let translator = Translator::with_providers(vec![first, second], "zh-CN");

        assert_eq!(translator.translate("Hello").await.unwrap(), "翻译结果");
    }

    #[tokio::test]
    async fn echoed_input_counts_as_failure() {
        let (provider, _) = MockProvider::boxed("echo", Behavior::Echo);
        let translator = Translator::with_providers(vec![provider], "zh-CN");

        assert!(translator.translate("Hello world").await.is_err());
    }

    #[tokio::test]
    async fn structure_markers_survive_translation() {
        let (provider, _) = MockProvider::boxed("prefix", Behavior::Prefix("译"));
        let translator = Translator::with_providers(vec![provider], "zh-CN");

        let result = translator
            .translate("### Heading\n\nSome **bold** text.")
            .await
            .unwrap();
        assert!(result.contains("### "));
        assert!(result.contains("**"));
        assert!(result.starts_with('译'));
    }
}
