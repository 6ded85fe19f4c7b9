pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod pipeline;
pub mod rank;
pub mod scheduler;
pub mod storage;
pub mod translate;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use pipeline::{Orchestrator, RunSummary};
pub use scheduler::Scheduler;
