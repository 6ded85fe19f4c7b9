//! Shared HTML-to-structured-text normalization.
//!
//! Produces plain text with lightweight structural markers: `#`-prefixed
//! level-aware headings, `- ` bullets, `> ` quote lines, `**emphasis**`
//! spans and `text (url)` links, with paragraphs separated by blank
//! lines. The markers survive translation via placeholder protection in
//! the translate module.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Convert an HTML fragment into normalized structured text.
pub fn normalize_html(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let mut collector = Collector::default();
    walk(doc.tree.root(), &mut collector);
    collector.finish()
}

/// First block that reads as prose (no heading/bullet/quote marker).
pub fn first_paragraph(text: &str) -> Option<&str> {
    text.split("\n\n").map(str::trim).find(|block| {
        !block.is_empty()
            && !block.starts_with('#')
            && !block.starts_with("- ")
            && !block.starts_with('>')
    })
}

/// Char-boundary-safe snippet used as a summary fallback.
pub fn summary_snippet(text: &str, max_chars: usize) -> String {
    let flat = collapse_ws(text);
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[derive(Default)]
struct Collector {
    blocks: Vec<String>,
    pending: String,
}

impl Collector {
    fn flush(&mut self) {
        let text = collapse_ws(&self.pending);
        if !text.is_empty() {
            self.blocks.push(text);
        }
        self.pending.clear();
    }

    fn push_block(&mut self, block: String) {
        self.flush();
        if !block.trim().is_empty() {
            self.blocks.push(block);
        }
    }

    /// Drop exact-duplicate blocks, keeping first-seen order.
    fn finish(mut self) -> String {
        self.flush();
        let mut seen = HashSet::new();
        let unique: Vec<String> = self
            .blocks
            .into_iter()
            .filter(|block| seen.insert(block.clone()))
            .collect();
        unique.join("\n\n")
    }
}

fn walk(node: NodeRef<'_, Node>, out: &mut Collector) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.pending.push_str(&text),
            Node::Element(el) => match el.name() {
                "script" | "style" | "noscript" | "head" | "template" | "iframe" => {}
                name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                    let level: usize = name[1..].parse().unwrap_or(1);
                    let text = inline_text(child);
                    if !text.is_empty() {
                        out.push_block(format!("{} {}", "#".repeat(level), text));
                    }
                }
                "p" => {
                    let text = inline_text(child);
                    if !text.is_empty() {
                        out.push_block(text);
                    }
                }
                "li" => {
                    let text = inline_text(child);
                    if !text.is_empty() {
                        out.push_block(format!("- {}", text));
                    }
                }
                "blockquote" => {
                    let text = inline_text(child);
                    if !text.is_empty() {
                        out.push_block(format!("> {}", text));
                    }
                }
                "br" => out.pending.push(' '),
                "hr" => out.flush(),
                "a" => {
                    let link = link_text(child, el.attr("href"));
                    out.pending.push_str(&link);
                    out.pending.push(' ');
                }
                "strong" | "b" | "em" | "i" => {
                    let text = inline_text(child);
                    if !text.is_empty() {
                        out.pending.push_str(&format!("**{}** ", text));
                    }
                }
                _ => walk(child, out),
            },
            _ => {}
        }
    }
}

fn inline_text(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    inline_into(node, &mut out);
    collapse_ws(&out)
}

fn inline_into(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text),
            Node::Element(el) => match el.name() {
                "script" | "style" | "noscript" => {}
                "a" => {
                    out.push_str(&link_text(child, el.attr("href")));
                    out.push(' ');
                }
                "strong" | "b" | "em" | "i" => {
                    let mut inner = String::new();
                    inline_into(child, &mut inner);
                    let inner = collapse_ws(&inner);
                    if !inner.is_empty() {
                        out.push_str(&format!("**{}** ", inner));
                    }
                }
                "br" => out.push(' '),
                _ => inline_into(child, out),
            },
            _ => {}
        }
    }
}

/// Render a link element as "text (url)".
fn link_text(node: NodeRef<'_, Node>, href: Option<&str>) -> String {
    let mut inner = String::new();
    inline_into(node, &mut inner);
    let inner = collapse_ws(&inner);

    match href {
        Some(href) if !href.is_empty() && !inner.is_empty() && inner != href => {
            format!("{} ({})", inner, href)
        }
        Some(href) if inner.is_empty() => href.to_string(),
        _ => inner,
    }
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style() {
        let html = "<p>keep</p><script>var x = 1;</script><style>.a{}</style>";
        let text = normalize_html(html);
        assert_eq!(text, "keep");
    }

    #[test]
    fn headings_are_level_aware_and_ordered() {
        let html = "<h1>Top</h1><p>intro</p><h3>Deep</h3><p>body</p>";
        let text = normalize_html(html);
        assert_eq!(text, "# Top\n\nintro\n\n### Deep\n\nbody");
    }

    #[test]
    fn lists_and_quotes_get_prefixes() {
        let html = "<ul><li>one</li><li>two</li></ul><blockquote>wise words</blockquote>";
        let text = normalize_html(html);
        assert_eq!(text, "- one\n\n- two\n\n> wise words");
    }

    #[test]
    fn links_become_text_and_url() {
        let html = r#"<p>see <a href="https://example.com">the docs</a> for more</p>"#;
        let text = normalize_html(html);
        assert_eq!(text, "see the docs (https://example.com) for more");
    }

    #[test]
    fn emphasis_becomes_marked_span() {
        let html = "<p>a <strong>bold</strong> claim</p>";
        let text = normalize_html(html);
        assert_eq!(text, "a **bold** claim");
    }

    #[test]
    fn duplicate_paragraphs_dropped_first_seen_kept() {
        let html = "<p>repeat</p><p>middle</p><p>repeat</p>";
        let text = normalize_html(html);
        assert_eq!(text, "repeat\n\nmiddle");
    }

    #[test]
    fn loose_text_becomes_a_paragraph() {
        let text = normalize_html("just plain text, no tags");
        assert_eq!(text, "just plain text, no tags");
    }

    #[test]
    fn first_paragraph_skips_markers() {
        let body = "# Heading\n\n- bullet\n\nActual prose here.\n\nMore.";
        assert_eq!(first_paragraph(body), Some("Actual prose here."));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let text = "天地玄黄宇宙洪荒".repeat(20);
        let snippet = summary_snippet(&text, 10);
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), 13);
    }
}
