use super::models::{ExtractionStrategy, SourceDescriptor};

/// Static source registry, loaded once at orchestrator start.
///
/// New sources need an entry here and, when the shared HTML
/// normalization is not enough, an extractor registered for their
/// strategy. Nothing else changes.
pub const SOURCES: &[SourceDescriptor] = &[
    SourceDescriptor {
        name: "OpenAI Blog",
        url: "https://openai.com/blog/rss.xml",
        strategy: ExtractionStrategy::Rss,
    },
    SourceDescriptor {
        name: "Google AI Blog",
        url: "http://ai.googleblog.com/feeds/posts/default",
        strategy: ExtractionStrategy::Rss,
    },
    SourceDescriptor {
        name: "arXiv RAG Papers",
        url: "http://export.arxiv.org/api/query",
        strategy: ExtractionStrategy::ArxivApi,
    },
];

/// Search term for the arXiv API source.
pub const ARXIV_SEARCH_QUERY: &str = r#"all:"Retrieval Augmented Generation" OR all:RAG"#;
