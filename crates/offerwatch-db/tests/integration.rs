//! Offline unit tests for offerwatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use offerwatch_core::{AppConfig, Environment, ScrapeConfig, StoreError};
use offerwatch_db::{DbError, OfferRow, PoolConfig, ScrapeLogRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scrape: ScrapeConfig {
            base_urls: offerwatch_core::BaseUrls::default(),
            fetch_timeout_secs: 10,
            max_redirects: 10,
            user_agent: "ua".to_string(),
            dry_run: false,
            schedule: "0 0 */6 * * *".to_string(),
        },
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn offer_row_serializes_for_api_responses() {
    use chrono::Utc;

    let now = Utc::now();
    let row = OfferRow {
        id: 1,
        source: "us".to_string(),
        variant: "us-florida".to_string(),
        title: "Save up to 25%".to_string(),
        text: "On rooms".to_string(),
        link: "https://example.com/deal".to_string(),
        category: None,
        hash: "a".repeat(64),
        first_seen: now,
        last_seen: now,
        last_changed: now,
    };
    let json = serde_json::to_value(&row).expect("serialize OfferRow");
    assert_eq!(json["variant"], "us-florida");
    assert!(json["category"].is_null());
}

#[test]
fn scrape_log_row_has_expected_fields() {
    use chrono::Utc;

    let row = ScrapeLogRow {
        id: 1,
        run_time: Utc::now(),
        variant: "ca".to_string(),
        offers_found: 3,
        offers_new: 1,
        offers_changed: 1,
        offers_unchanged: 1,
        error_message: Some("timed out".to_string()),
        created_at: Utc::now(),
    };
    assert_eq!(row.offers_found, row.offers_new + row.offers_changed + row.offers_unchanged);
}

#[test]
fn db_error_converts_into_store_backend_error() {
    let error: StoreError = DbError::Sqlx(sqlx::Error::RowNotFound).into();
    assert!(matches!(error, StoreError::Backend(_)));
    assert!(error.to_string().contains("store backend error"));
}
