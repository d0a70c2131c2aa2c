//! Database operations for the `scrape_log` audit table.

use chrono::{DateTime, Utc};
use offerwatch_core::ScrapeLogEntry;
use serde::Serialize;
use sqlx::PgPool;

use crate::{count_to_i32, DbError};

/// A row from the `scrape_log` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ScrapeLogRow {
    pub id: i64,
    pub run_time: DateTime<Utc>,
    pub variant: String,
    pub offers_found: i32,
    pub offers_new: i32,
    pub offers_changed: i32,
    pub offers_unchanged: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Appends one audit row and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scrape_log(pool: &PgPool, entry: &ScrapeLogEntry) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scrape_log \
             (run_time, variant, offers_found, offers_new, offers_changed, \
              offers_unchanged, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(entry.run_time)
    .bind(entry.variant.as_str())
    .bind(count_to_i32(entry.offers_found))
    .bind(count_to_i32(entry.offers_new))
    .bind(count_to_i32(entry.offers_changed))
    .bind(count_to_i32(entry.offers_unchanged))
    .bind(entry.error_message.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Lists the most recent audit rows, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_log(pool: &PgPool, limit: i64) -> Result<Vec<ScrapeLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeLogRow>(
        "SELECT id, run_time, variant, offers_found, offers_new, offers_changed, \
                offers_unchanged, error_message, created_at \
         FROM scrape_log \
         ORDER BY run_time DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
