mod scorer;
mod selector;

pub use scorer::{Category, RelevanceScorer};
pub use selector::{Candidate, CandidateSelector, CapMode};
