pub mod app_config;
pub mod config;
pub mod offers;
pub mod store;
pub mod variants;

pub use app_config::{AppConfig, Environment, ScrapeConfig};
pub use config::{load_app_config, load_app_config_from_env, load_scrape_config};
pub use offers::{CanonicalOffer, FingerprintedOffer, OfferCounts, RawOffer};
pub use store::{OfferStore, ScrapeLogEntry, StoreError, StoredOffer};
pub use variants::{cookie_preset, resolve_variants, BaseUrls, Source, Variant, VariantPreset};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("unsupported source selector '{0}'")]
    UnknownSource(String),
}
