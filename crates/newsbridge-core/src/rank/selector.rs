use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Category;
use crate::extract::NormalizedContent;
use crate::feed::RawItem;

/// How the run budget truncates candidates.
///
/// `PerSource` is the contract default: the cap applies during
/// collection, bounding total per-run work. `Global` collects
/// everything, then keeps the top-scored candidates overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapMode {
    PerSource,
    Global,
}

/// A scored, extracted item awaiting persistence.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item: RawItem,
    pub content: NormalizedContent,
    pub score: i32,
    pub category: Category,
}

/// Collects scored candidates for one run and truncates to the budget.
pub struct CandidateSelector {
    mode: CapMode,
    limit: usize,
    per_source: HashMap<String, usize>,
    candidates: Vec<Candidate>,
}

impl CandidateSelector {
    pub fn new(mode: CapMode, limit: usize) -> Self {
        Self {
            mode,
            limit: limit.max(1),
            per_source: HashMap::new(),
            candidates: Vec::new(),
        }
    }

    /// In per-source mode, lets the pipeline skip extraction work for
    /// items beyond a source's cap.
    pub fn at_capacity(&self, source: &str) -> bool {
        self.mode == CapMode::PerSource
            && self.per_source.get(source).copied().unwrap_or(0) >= self.limit
    }

    /// Returns false when the candidate was rejected by a per-source cap.
    pub fn push(&mut self, candidate: Candidate) -> bool {
        if self.mode == CapMode::PerSource {
            let count = self.per_source.entry(candidate.item.source.clone()).or_insert(0);
            if *count >= self.limit {
                return false;
            }
            *count += 1;
        }
        self.candidates.push(candidate);
        true
    }

    /// Finish the run. Global mode sorts descending by score (stable,
    /// so ties keep discovery order) and truncates to the budget.
    pub fn finish(mut self) -> Vec<Candidate> {
        if self.mode == CapMode::Global {
            self.candidates.sort_by(|a, b| b.score.cmp(&a.score));
            self.candidates.truncate(self.limit);
        }
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(source: &str, url: &str, score: i32) -> Candidate {
        Candidate {
            item: RawItem {
                title: url.to_string(),
                url: url.to_string(),
                content: String::new(),
                published_at: Some(Utc::now()),
                source: source.to_string(),
            },
            content: NormalizedContent {
                body: "body".into(),
                summary: None,
            },
            score,
            category: Category::General,
        }
    }

    #[test]
    fn per_source_cap_applies_during_collection() {
        let mut selector = CandidateSelector::new(CapMode::PerSource, 2);
        assert!(selector.push(candidate("a", "a1", 10)));
        assert!(selector.push(candidate("a", "a2", 20)));
        assert!(!selector.push(candidate("a", "a3", 99)));
        assert!(selector.push(candidate("b", "b1", 5)));
        assert!(selector.at_capacity("a"));
        assert!(!selector.at_capacity("b"));

        let kept = selector.finish();
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn global_cap_sorts_then_truncates() {
        let mut selector = CandidateSelector::new(CapMode::Global, 2);
        selector.push(candidate("a", "a1", 10));
        selector.push(candidate("b", "b1", 30));
        selector.push(candidate("a", "a2", 20));
        assert!(!selector.at_capacity("a"));

        let kept = selector.finish();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].item.url, "b1");
        assert_eq!(kept[1].item.url, "a2");
    }

    #[test]
    fn global_sort_is_stable_on_ties() {
        let mut selector = CandidateSelector::new(CapMode::Global, 3);
        selector.push(candidate("a", "first", 10));
        selector.push(candidate("a", "second", 10));
        selector.push(candidate("a", "third", 10));

        let kept = selector.finish();
        let urls: Vec<&str> = kept.iter().map(|c| c.item.url.as_str()).collect();
        assert_eq!(urls, vec!["first", "second", "third"]);
    }
}
