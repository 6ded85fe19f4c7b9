mod fetcher;
mod models;
pub mod sources;

pub use fetcher::FeedReader;
pub use models::{ExtractionStrategy, RawItem, SourceDescriptor};
