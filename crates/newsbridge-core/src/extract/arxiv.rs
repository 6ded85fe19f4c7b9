use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use super::html::{first_paragraph, normalize_html};
use super::{Extractor, NormalizedContent};
use crate::feed::RawItem;

static ARXIV_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}\.\d{4,5}").unwrap());

static SECTION_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".ltx_section").unwrap());
static SECTION_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".ltx_title").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Ordered abstract locators, tried first to last.
static ABSTRACT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "blockquote.abstract",
        ".abstract",
        r#"meta[name="citation_abstract"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

/// Extractor for the arXiv API source. The Atom summary carries the
/// abstract; the full body comes from the paper's HTML rendering on
/// arxiv.org, fetched once when the feed fragment is too short.
pub struct ArxivExtractor {
    client: Client,
    min_content_length: usize,
}

impl ArxivExtractor {
    pub fn new(client: Client, min_content_length: usize) -> Self {
        Self {
            client,
            min_content_length,
        }
    }

    fn arxiv_id(url: &str) -> Option<&str> {
        ARXIV_ID_RE.find(url).map(|m| m.as_str())
    }

    async fn fetch_paper_html(&self, arxiv_id: &str) -> crate::Result<String> {
        let url = format!("https://arxiv.org/html/{}", arxiv_id);
        let response = self.client.get(&url).send().await?;
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

/// Parse a paper's HTML rendering into (body, abstract).
fn parse_paper(html: &str) -> (String, Option<String>) {
    let doc = Html::parse_document(html);

    let abstract_text = locate_abstract(&doc);

    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for section in doc.select(&SECTION_SELECTOR) {
        if let Some(title) = section.select(&SECTION_TITLE_SELECTOR).next() {
            let title = collapse(&title.text().collect::<String>());
            if !title.is_empty() {
                blocks.push(format!("### {}", title));
            }
        }
        for paragraph in section.select(&PARAGRAPH_SELECTOR) {
            let text = collapse(&paragraph.text().collect::<String>());
            if !text.is_empty() && seen.insert(text.clone()) {
                blocks.push(text);
            }
        }
    }

    (blocks.join("\n\n"), abstract_text)
}

fn locate_abstract(doc: &Html) -> Option<String> {
    for selector in ABSTRACT_SELECTORS.iter() {
        if let Some(el) = doc.select(selector).next() {
            let raw = el
                .value()
                .attr("content")
                .map(str::to_string)
                .unwrap_or_else(|| el.text().collect::<String>());
            let text = collapse(raw.trim_start_matches("Abstract:").trim());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait::async_trait]
impl Extractor for ArxivExtractor {
    async fn extract(&self, item: &RawItem) -> Option<NormalizedContent> {
        // The feed fragment is the abstract; it doubles as the fallback body.
        let snippet = normalize_html(&item.content);

        let mut body = snippet.clone();
        let mut summary = None;

        if body.chars().count() < self.min_content_length {
            if let Some(id) = Self::arxiv_id(&item.url) {
                match self.fetch_paper_html(id).await {
                    Ok(html) => {
                        let (full_body, abstract_text) = parse_paper(&html);
                        if full_body.chars().count() > body.chars().count() {
                            body = full_body;
                        }
                        summary = abstract_text;
                    }
                    Err(e) => {
                        tracing::debug!("Paper fetch failed for {}: {}", item.url, e);
                    }
                }
            } else {
                tracing::warn!("No arXiv id in url: {}", item.url);
            }
        }

        if body.trim().is_empty() {
            tracing::warn!("Dropping '{}': no extractable content", item.title);
            return None;
        }

        let summary = summary
            .or_else(|| first_paragraph(&snippet).map(str::to_string))
            .or_else(|| first_paragraph(&body).map(str::to_string));

        Some(NormalizedContent { body, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_arxiv_id_in_abs_url() {
        assert_eq!(
            ArxivExtractor::arxiv_id("http://arxiv.org/abs/2401.12345v2"),
            Some("2401.12345")
        );
        assert_eq!(ArxivExtractor::arxiv_id("https://example.com/paper"), None);
    }

    #[test]
    fn parses_sections_with_level_markers() {
        let html = r#"
            <div class="ltx_section">
              <h2 class="ltx_title">Introduction</h2>
              <p>First paragraph.</p>
              <p>First paragraph.</p>
              <p>Second paragraph.</p>
            </div>
        "#;
        let (body, _) = parse_paper(html);
        assert_eq!(
            body,
            "### Introduction\n\nFirst paragraph.\n\nSecond paragraph."
        );
    }

    #[test]
    fn abstract_locators_tried_in_order() {
        let html = r#"
            <blockquote class="abstract">Abstract: We study things.</blockquote>
            <div class="abstract">should not win</div>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(locate_abstract(&doc), Some("We study things.".to_string()));
    }

    #[test]
    fn abstract_from_meta_content() {
        let html = r#"<head><meta name="citation_abstract" content="Meta abstract."></head>"#;
        let doc = Html::parse_document(html);
        assert_eq!(locate_abstract(&doc), Some("Meta abstract.".to_string()));
    }
}
