use serde::{Deserialize, Serialize};

/// Discrete relevance bucket assigned at ingestion, immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AiResearch,
    DevTooling,
    VendorNews,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AiResearch => "ai_research",
            Category::DevTooling => "dev_tooling",
            Category::VendorNews => "vendor_news",
            Category::General => "general",
        }
    }

    /// Parse a stored category, defaulting to General for unknown text.
    pub fn parse(s: &str) -> Category {
        match s {
            "ai_research" => Category::AiResearch,
            "dev_tooling" => Category::DevTooling,
            "vendor_news" => Category::VendorNews,
            _ => Category::General,
        }
    }
}

/// Priority-ordered category table: the first row with any keyword hit
/// wins; scores never aggregate across rows.
const CATEGORY_RULES: &[(Category, i32, &[&str])] = &[
    (
        Category::AiResearch,
        100,
        &[
            "retrieval augmented",
            "retrieval-augmented",
            "rag",
            "large language model",
            "llm",
            "transformer",
            "fine-tun",
            "embedding",
            "benchmark",
            "reasoning",
        ],
    ),
    (
        Category::DevTooling,
        80,
        &[
            "sdk",
            "api",
            "framework",
            "open source",
            "open-source",
            "library",
            "toolkit",
            "release",
        ],
    ),
    (
        Category::VendorNews,
        60,
        &[
            "openai",
            "google",
            "deepmind",
            "anthropic",
            "meta",
            "microsoft",
            "nvidia",
        ],
    ),
    (
        Category::General,
        40,
        &["ai", "machine learning", "neural", "model"],
    ),
];

/// Fixed per-source bonus added on top of the category base score.
/// Bonuses stay below the gap between adjacent category weights so a
/// source can never promote a title past a higher-priority match.
const SOURCE_BONUS: &[(&str, i32)] = &[
    ("arXiv RAG Papers", 15),
    ("OpenAI Blog", 10),
    ("Google AI Blog", 5),
];

/// Deterministic title scorer. Matching is a case-insensitive substring
/// test against per-category keyword lists.
pub struct RelevanceScorer {
    rules: Vec<(Category, i32, Vec<String>)>,
}

impl RelevanceScorer {
    /// Build the scorer from the static table, extending the
    /// top-priority category with the configured interest keywords.
    pub fn new(interest_keywords: &[String]) -> Self {
        let mut rules: Vec<(Category, i32, Vec<String>)> = CATEGORY_RULES
            .iter()
            .map(|(category, weight, keywords)| {
                (
                    *category,
                    *weight,
                    keywords.iter().map(|k| k.to_lowercase()).collect(),
                )
            })
            .collect();

        if let Some(top) = rules.first_mut() {
            top.2.extend(
                interest_keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty()),
            );
        }

        Self { rules }
    }

    pub fn score(&self, title: &str, source: &str) -> (i32, Category) {
        let title = title.to_lowercase();
        let bonus = source_bonus(source);

        for (category, weight, keywords) in &self.rules {
            if keywords.iter().any(|k| title.contains(k.as_str())) {
                return (weight + bonus, *category);
            }
        }

        (bonus, Category::General)
    }
}

fn source_bonus(source: &str) -> i32 {
    SOURCE_BONUS
        .iter()
        .find(|(name, _)| *name == source)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}
