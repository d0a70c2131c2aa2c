//! Hash-based change detection and upsert against an [`OfferStore`].

use chrono::{DateTime, Utc};
use offerwatch_core::{FingerprintedOffer, OfferCounts, OfferStore, StoreError, StoredOffer};

/// Re-reads allowed when a conditional write loses to a concurrent run.
pub const MAX_RECONCILE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Changed,
    Unchanged,
}

impl Classification {
    fn of(existing: Option<&StoredOffer>, hash: &str) -> Self {
        match existing {
            None => Classification::New,
            Some(stored) if stored.hash != hash => Classification::Changed,
            Some(_) => Classification::Unchanged,
        }
    }

    fn count(self, counts: &mut OfferCounts) {
        match self {
            Classification::New => counts.new += 1,
            Classification::Changed => counts.changed += 1,
            Classification::Unchanged => counts.unchanged += 1,
        }
    }
}

/// Classifies each offer as new, changed, or unchanged and, unless
/// `dry_run`, writes the result.
///
/// New and changed offers get one version row each; unchanged offers only
/// have `last_seen` refreshed. In dry-run mode the store is only read.
///
/// # Errors
///
/// Returns the first [`StoreError`]; offers after it are not processed.
pub async fn reconcile(
    store: &dyn OfferStore,
    offers: &[FingerprintedOffer],
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<OfferCounts, StoreError> {
    let mut counts = OfferCounts {
        found: offers.len(),
        ..OfferCounts::default()
    };

    for offer in offers {
        let classification = reconcile_one(store, offer, dry_run, now).await?;
        classification.count(&mut counts);
    }

    Ok(counts)
}

/// Read, classify, and conditionally write one offer. A write whose
/// condition was invalidated between read and write starts over.
async fn reconcile_one(
    store: &dyn OfferStore,
    offer: &FingerprintedOffer,
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<Classification, StoreError> {
    let key = &offer.offer;

    for attempt in 1..=MAX_RECONCILE_ATTEMPTS {
        let existing = store.find_offer(key.source, key.variant, &key.link).await?;
        let classification = Classification::of(existing.as_ref(), &offer.hash);

        if dry_run {
            return Ok(classification);
        }

        let applied = match existing {
            None => store.insert_offer(offer, now).await?.is_some(),
            Some(stored) if stored.hash != offer.hash => {
                store
                    .update_offer_if_hash(stored.id, &stored.hash, offer, now)
                    .await?
            }
            Some(stored) => store.touch_offer_if_hash(stored.id, &stored.hash, now).await?,
        };

        if applied {
            return Ok(classification);
        }

        tracing::debug!(
            variant = %key.variant,
            link = %key.link,
            attempt,
            ?classification,
            "offer changed between read and write; re-reading"
        );
    }

    tracing::warn!(variant = %key.variant, link = %key.link, "giving up on contended offer");
    Err(StoreError::Contention {
        link: key.link.clone(),
        attempts: MAX_RECONCILE_ATTEMPTS,
    })
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
