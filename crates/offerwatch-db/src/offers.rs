//! Database operations for `offers` and `offer_versions`.
//!
//! Writes that classify an offer are conditional on the state the caller
//! read: an insert does nothing when the identity key already exists, and
//! an update or touch applies only while the stored hash is unchanged. Each
//! reports whether it took effect so the caller can re-read and retry.

use chrono::{DateTime, Utc};
use offerwatch_core::FingerprintedOffer;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `offers` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OfferRow {
    pub id: i64,
    pub source: String,
    pub variant: String,
    pub title: String,
    pub text: String,
    pub link: String,
    pub category: Option<String>,
    pub hash: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_changed: DateTime<Utc>,
}

/// A row from the `offer_versions` table. Never updated once written.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OfferVersionRow {
    pub id: i64,
    pub offer_id: i64,
    pub source: String,
    pub variant: String,
    pub hash: String,
    pub captured_at: DateTime<Utc>,
    pub title: String,
    pub text: String,
    pub link: String,
    pub category: Option<String>,
}

const OFFER_COLUMNS: &str = "id, source, variant, title, text, link, category, hash, \
                             first_seen, last_seen, last_changed";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Looks up an offer by its identity key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_offer(
    pool: &PgPool,
    source: &str,
    variant: &str,
    link: &str,
) -> Result<Option<OfferRow>, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers \
         WHERE source = $1 AND variant = $2 AND link = $3"
    ))
    .bind(source)
    .bind(variant)
    .bind(link)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches one offer by primary key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_offer(pool: &PgPool, id: i64) -> Result<Option<OfferRow>, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists current offers, most recently observed first, optionally limited to
/// one variant.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_offers(
    pool: &PgPool,
    variant: Option<&str>,
    limit: i64,
) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers \
         WHERE ($1::text IS NULL OR variant = $1) \
         ORDER BY last_seen DESC, id DESC \
         LIMIT $2"
    ))
    .bind(variant)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists the version history of one offer, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_offer_versions(
    pool: &PgPool,
    offer_id: i64,
) -> Result<Vec<OfferVersionRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferVersionRow>(
        "SELECT id, offer_id, source, variant, hash, captured_at, title, text, link, category \
         FROM offer_versions \
         WHERE offer_id = $1 \
         ORDER BY captured_at DESC, id DESC",
    )
    .bind(offer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Conditional writes
// ---------------------------------------------------------------------------

/// Inserts a new offer and its first version in one transaction.
///
/// Returns the new id, or `None` (with nothing written) when a row with the
/// same `(source, variant, link)` already exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn insert_offer_with_version(
    pool: &PgPool,
    offer: &FingerprintedOffer,
    now: DateTime<Utc>,
) -> Result<Option<i64>, DbError> {
    let mut tx = pool.begin().await?;
    let fields = &offer.offer;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO offers \
             (source, variant, title, text, link, category, hash, \
              first_seen, last_seen, last_changed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $8) \
         ON CONFLICT ON CONSTRAINT offers_identity_key DO NOTHING \
         RETURNING id",
    )
    .bind(fields.source.as_str())
    .bind(fields.variant.as_str())
    .bind(&fields.title)
    .bind(&fields.text)
    .bind(&fields.link)
    .bind(fields.category.as_deref())
    .bind(&offer.hash)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(id) = id else {
        tx.rollback().await?;
        return Ok(None);
    };

    append_version(&mut tx, id, offer, now).await?;
    tx.commit().await?;
    Ok(Some(id))
}

/// Overwrites an offer's fields and hash and appends a version, in one
/// transaction, only while its stored hash is still `expected_hash`.
///
/// Returns `false` with nothing written if the condition no longer holds.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn update_offer_with_version_if_hash(
    pool: &PgPool,
    id: i64,
    expected_hash: &str,
    offer: &FingerprintedOffer,
    now: DateTime<Utc>,
) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;
    let fields = &offer.offer;

    let rows_affected = sqlx::query(
        "UPDATE offers \
         SET title = $3, text = $4, category = $5, hash = $6, \
             last_seen = GREATEST(last_seen, $7), last_changed = $7 \
         WHERE id = $1 AND hash = $2",
    )
    .bind(id)
    .bind(expected_hash)
    .bind(&fields.title)
    .bind(&fields.text)
    .bind(fields.category.as_deref())
    .bind(&offer.hash)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    append_version(&mut tx, id, offer, now).await?;
    tx.commit().await?;
    Ok(true)
}

/// Refreshes `last_seen` while the stored hash is still `expected_hash`.
/// `last_seen` never moves backwards.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn touch_offer_if_hash(
    pool: &PgPool,
    id: i64,
    expected_hash: &str,
    now: DateTime<Utc>,
) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "UPDATE offers SET last_seen = GREATEST(last_seen, $3) \
         WHERE id = $1 AND hash = $2",
    )
    .bind(id)
    .bind(expected_hash)
    .bind(now)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

async fn append_version(
    tx: &mut Transaction<'_, Postgres>,
    offer_id: i64,
    offer: &FingerprintedOffer,
    captured_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let fields = &offer.offer;
    sqlx::query(
        "INSERT INTO offer_versions \
             (offer_id, source, variant, hash, captured_at, title, text, link, category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(offer_id)
    .bind(fields.source.as_str())
    .bind(fields.variant.as_str())
    .bind(&offer.hash)
    .bind(captured_at)
    .bind(&fields.title)
    .bind(&fields.text)
    .bind(&fields.link)
    .bind(fields.category.as_deref())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
