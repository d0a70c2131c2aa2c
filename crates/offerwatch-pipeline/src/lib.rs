//! Fetch → extract → canonicalize → reconcile, for a set of crawl variants.

pub mod error;
pub mod memory;
pub mod reconcile;
pub mod run;
pub mod source;

pub use error::PipelineError;
pub use memory::{MemoryOffer, MemoryOfferStore, MemoryVersion};
pub use reconcile::{reconcile, Classification, MAX_RECONCILE_ATTEMPTS};
pub use run::{run_scrape, RunReport, ScrapeRequest, VariantReport};
pub use source::{FixtureOfferSource, LiveOfferSource, OfferSource};
