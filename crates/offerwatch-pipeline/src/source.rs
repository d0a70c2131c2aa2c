//! Where a variant's raw offers come from.

use std::collections::HashMap;

use async_trait::async_trait;
use offerwatch_core::{RawOffer, ScrapeConfig, Variant, VariantPreset};
use offerwatch_scraper::{extract_offers, FetchError, Transport, TransportConfig};

/// Produces the raw offers for one variant pass.
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`FetchError`] when the listing page cannot be obtained. This
    /// fails only the variant being fetched.
    async fn raw_offers(&self, preset: &VariantPreset) -> Result<Vec<RawOffer>, FetchError>;
}

/// Fetches the variant's listing page over HTTP and extracts offer blocks.
pub struct LiveOfferSource {
    transport: Transport,
}

impl LiveOfferSource {
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn from_scrape_config(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let transport = Transport::new(TransportConfig::from_scrape_config(config))?;
        Ok(Self::new(transport))
    }
}

#[async_trait]
impl OfferSource for LiveOfferSource {
    async fn raw_offers(&self, preset: &VariantPreset) -> Result<Vec<RawOffer>, FetchError> {
        let body = self
            .transport
            .fetch_page(&preset.base_url, &preset.cookies)
            .await?;
        let offers = extract_offers(&body, &preset.base_url);
        tracing::info!(
            variant = %preset.variant,
            bytes = body.len(),
            offers = offers.len(),
            "fetched listing page"
        );
        Ok(offers)
    }
}

/// Fixed raw offers per variant. A variant with no entry yields nothing.
#[derive(Debug, Clone, Default)]
pub struct FixtureOfferSource {
    offers: HashMap<Variant, Vec<RawOffer>>,
}

impl FixtureOfferSource {
    #[must_use]
    pub fn new(offers: HashMap<Variant, Vec<RawOffer>>) -> Self {
        Self { offers }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: Variant, offers: Vec<RawOffer>) -> Self {
        self.offers.insert(variant, offers);
        self
    }

    /// Parses `{"<variant>": [{"title", "text", "link", "category"?}, ...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] for malformed JSON or unknown variant keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

#[async_trait]
impl OfferSource for FixtureOfferSource {
    async fn raw_offers(&self, preset: &VariantPreset) -> Result<Vec<RawOffer>, FetchError> {
        Ok(self.offers.get(&preset.variant).cloned().unwrap_or_default())
    }
}
