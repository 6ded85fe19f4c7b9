//! Text preparation for translation providers.
//!
//! Structure markers from extraction (heading prefixes, bold
//! delimiters) would be mangled by machine translation, so they travel
//! through the providers as indexed placeholder tokens. Long bodies are
//! split at sentence boundaries so each request stays under the
//! provider's size limit.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^#{1,6}[ \t])|(\*\*)").unwrap());

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"⦃(\d+)⦄").unwrap());

static EXCESS_NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse Windows line endings and runs of blank lines, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");
    EXCESS_NEWLINES_RE
        .replace_all(&unified, "\n\n")
        .trim()
        .to_string()
}

/// Replace structure markers with indexed tokens the providers leave
/// alone. Returns the protected text and the marker table for
/// [`restore_markers`].
pub fn protect_markers(text: &str) -> (String, Vec<String>) {
    let mut markers = Vec::new();
    let protected = MARKER_RE
        .replace_all(text, |caps: &regex::Captures| {
            let token = format!("⦃{}⦄", markers.len());
            markers.push(caps[0].to_string());
            token
        })
        .into_owned();
    (protected, markers)
}

/// Swap placeholder tokens back for their original markers. Tokens a
/// provider dropped or garbled simply disappear from the output.
pub fn restore_markers(text: &str, markers: &[String]) -> String {
    TOKEN_RE
        .replace_all(text, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| markers.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Split text into chunks of at most `max_chars` characters, breaking
/// at sentence boundaries where possible. A single oversized sentence
/// gets hard-split on character boundaries.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        if current_len + len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if len > max_chars {
            let chars: Vec<char> = sentence.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
        } else {
            current.push_str(sentence);
            current_len += len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?' | '。' | '！' | '？' | '\n') {
            let end = idx + ch.len_utf8();
            sentences.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}
