//! [`OfferStore`] backed by Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offerwatch_core::{
    FingerprintedOffer, OfferStore, ScrapeLogEntry, Source, StoreError, StoredOffer, Variant,
};
use sqlx::PgPool;

use crate::DbError;

impl From<DbError> for StoreError {
    fn from(error: DbError) -> Self {
        StoreError::Backend(Box::new(error))
    }
}

#[derive(Debug, Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn find_offer(
        &self,
        source: Source,
        variant: Variant,
        link: &str,
    ) -> Result<Option<StoredOffer>, StoreError> {
        let row = crate::find_offer(&self.pool, source.as_str(), variant.as_str(), link).await?;
        Ok(row.map(|row| StoredOffer {
            id: row.id,
            hash: row.hash,
        }))
    }

    async fn insert_offer(
        &self,
        offer: &FingerprintedOffer,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, StoreError> {
        Ok(crate::insert_offer_with_version(&self.pool, offer, now).await?)
    }

    async fn update_offer_if_hash(
        &self,
        id: i64,
        expected_hash: &str,
        offer: &FingerprintedOffer,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(
            crate::update_offer_with_version_if_hash(&self.pool, id, expected_hash, offer, now)
                .await?,
        )
    }

    async fn touch_offer_if_hash(
        &self,
        id: i64,
        expected_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(crate::touch_offer_if_hash(&self.pool, id, expected_hash, now).await?)
    }

    async fn record_scrape_log(&self, entry: &ScrapeLogEntry) -> Result<(), StoreError> {
        let id = crate::insert_scrape_log(&self.pool, entry).await?;
        tracing::debug!(id, variant = %entry.variant, "recorded scrape log entry");
        Ok(())
    }
}
