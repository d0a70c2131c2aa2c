use offerwatch_core::{ConfigError, StoreError};
use offerwatch_scraper::FetchError;
use thiserror::Error;

/// Failures that stop a whole run before or outside per-variant work.
///
/// A fetch or store failure inside one variant is recorded on that
/// variant's report instead of surfacing here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}
