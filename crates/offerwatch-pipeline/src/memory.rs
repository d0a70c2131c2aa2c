//! In-process [`OfferStore`] for fixture runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offerwatch_core::{
    FingerprintedOffer, OfferStore, ScrapeLogEntry, Source, StoreError, StoredOffer, Variant,
};
use tokio::sync::Mutex;

/// Current state of one offer held by [`MemoryOfferStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryOffer {
    pub id: i64,
    pub offer: FingerprintedOffer,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_changed: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryVersion {
    pub offer_id: i64,
    pub offer: FingerprintedOffer,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    keys: HashMap<(Source, Variant, String), i64>,
    offers: HashMap<i64, MemoryOffer>,
    versions: Vec<MemoryVersion>,
    log: Vec<ScrapeLogEntry>,
    writes: usize,
}

/// Same conditional-write semantics as the Postgres store, backed by maps
/// behind one lock.
#[derive(Debug, Default)]
pub struct MemoryOfferStore {
    state: Mutex<State>,
}

impl MemoryOfferStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn offers(&self) -> Vec<MemoryOffer> {
        let state = self.state.lock().await;
        let mut offers: Vec<_> = state.offers.values().cloned().collect();
        offers.sort_by_key(|o| o.id);
        offers
    }

    pub async fn get(&self, source: Source, variant: Variant, link: &str) -> Option<MemoryOffer> {
        let state = self.state.lock().await;
        let id = state.keys.get(&(source, variant, link.to_owned()))?;
        state.offers.get(id).cloned()
    }

    pub async fn versions(&self) -> Vec<MemoryVersion> {
        self.state.lock().await.versions.clone()
    }

    pub async fn scrape_log(&self) -> Vec<ScrapeLogEntry> {
        self.state.lock().await.log.clone()
    }

    /// Number of successful mutating calls, including scrape log rows.
    pub async fn writes(&self) -> usize {
        self.state.lock().await.writes
    }
}

impl State {
    fn append_version(&mut self, offer_id: i64, offer: &FingerprintedOffer, now: DateTime<Utc>) {
        self.versions.push(MemoryVersion {
            offer_id,
            offer: offer.clone(),
            captured_at: now,
        });
    }
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    async fn find_offer(
        &self,
        source: Source,
        variant: Variant,
        link: &str,
    ) -> Result<Option<StoredOffer>, StoreError> {
        Ok(self.get(source, variant, link).await.map(|o| StoredOffer {
            id: o.id,
            hash: o.offer.hash,
        }))
    }

    async fn insert_offer(
        &self,
        offer: &FingerprintedOffer,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, StoreError> {
        let mut state = self.state.lock().await;
        let fields = &offer.offer;
        let key = (fields.source, fields.variant, fields.link.clone());
        if state.keys.contains_key(&key) {
            return Ok(None);
        }

        state.next_id += 1;
        let id = state.next_id;
        state.keys.insert(key, id);
        state.offers.insert(
            id,
            MemoryOffer {
                id,
                offer: offer.clone(),
                first_seen: now,
                last_seen: now,
                last_changed: now,
            },
        );
        state.append_version(id, offer, now);
        state.writes += 1;
        Ok(Some(id))
    }

    async fn update_offer_if_hash(
        &self,
        id: i64,
        expected_hash: &str,
        offer: &FingerprintedOffer,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(current) = state.offers.get_mut(&id) else {
            return Ok(false);
        };
        if current.offer.hash != expected_hash {
            return Ok(false);
        }

        current.offer = offer.clone();
        current.last_seen = current.last_seen.max(now);
        current.last_changed = now;
        state.append_version(id, offer, now);
        state.writes += 1;
        Ok(true)
    }

    async fn touch_offer_if_hash(
        &self,
        id: i64,
        expected_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(current) = state.offers.get_mut(&id) else {
            return Ok(false);
        };
        if current.offer.hash != expected_hash {
            return Ok(false);
        }

        current.last_seen = current.last_seen.max(now);
        state.writes += 1;
        Ok(true)
    }

    async fn record_scrape_log(&self, entry: &ScrapeLogEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.log.push(entry.clone());
        state.writes += 1;
        Ok(())
    }
}
