//! Persistence seam between the reconcile engine and a concrete store.
//!
//! Every write is conditional so that two overlapping runs cannot create
//! duplicate rows for one `(source, variant, link)` key, and a stale
//! classification can never overwrite a newer change. A write whose
//! condition no longer holds reports `false`/`None` and the caller
//! re-reads before deciding again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::offers::FingerprintedOffer;
use crate::variants::{Source, Variant};

/// The slice of a persisted offer needed to classify an incoming one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOffer {
    pub id: i64,
    pub hash: String,
}

/// One audit row per variant per non-dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeLogEntry {
    pub run_time: DateTime<Utc>,
    pub variant: Variant,
    pub offers_found: usize,
    pub offers_new: usize,
    pub offers_changed: usize,
    pub offers_unchanged: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("offer {link} changed concurrently on each of {attempts} attempts")]
    Contention { link: String, attempts: u32 },
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Point lookup by identity key.
    async fn find_offer(
        &self,
        source: Source,
        variant: Variant,
        link: &str,
    ) -> Result<Option<StoredOffer>, StoreError>;

    /// Inserts a new offer with `first_seen = last_seen = last_changed = now`
    /// and appends its first version, atomically.
    ///
    /// Returns `None` without writing if the key already exists.
    async fn insert_offer(
        &self,
        offer: &FingerprintedOffer,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, StoreError>;

    /// Overwrites fields and hash, sets `last_seen = last_changed = now`,
    /// and appends a version, atomically, but only while the stored hash is
    /// still `expected_hash`.
    async fn update_offer_if_hash(
        &self,
        id: i64,
        expected_hash: &str,
        offer: &FingerprintedOffer,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Sets `last_seen = now` while the stored hash is still `expected_hash`.
    async fn touch_offer_if_hash(
        &self,
        id: i64,
        expected_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn record_scrape_log(&self, entry: &ScrapeLogEntry) -> Result<(), StoreError>;
}
