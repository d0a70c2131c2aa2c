//! Live integration tests for offerwatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/offerwatch-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{Duration, TimeZone, Utc};
use offerwatch_core::{
    CanonicalOffer, FingerprintedOffer, OfferStore, ScrapeLogEntry, Source, Variant,
};
use offerwatch_db::{
    find_offer, get_offer, insert_offer_with_version, insert_scrape_log, list_offer_versions,
    list_offers, list_scrape_log, run_migrations, touch_offer_if_hash,
    update_offer_with_version_if_hash, PgOfferStore,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_offer(variant: Variant, link: &str, title: &str, hash_char: char) -> FingerprintedOffer {
    FingerprintedOffer {
        offer: CanonicalOffer {
            source: variant.source(),
            variant,
            title: title.to_string(),
            text: "Save on rooms".to_string(),
            link: link.to_string(),
            category: Some("Rooms".to_string()),
        },
        hash: hash_char.to_string().repeat(64),
    }
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn run_migrations_is_a_no_op_on_migrated_database(pool: sqlx::PgPool) {
    let applied = run_migrations(&pool).await.expect("run_migrations");
    assert_eq!(applied, 0);
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_creates_offer_and_first_version(pool: sqlx::PgPool) {
    let offer = make_offer(Variant::UsFlorida, "https://example.com/a", "Deal", 'a');

    let id = insert_offer_with_version(&pool, &offer, t0())
        .await
        .expect("insert")
        .expect("new id");

    let row = find_offer(&pool, "us", "us-florida", "https://example.com/a")
        .await
        .expect("find")
        .expect("row exists");
    assert_eq!(row.id, id);
    assert_eq!(row.hash, offer.hash);
    assert_eq!(row.first_seen, t0());
    assert_eq!(row.last_seen, t0());
    assert_eq!(row.last_changed, t0());
    assert_eq!(row.category.as_deref(), Some("Rooms"));

    let versions = list_offer_versions(&pool, id).await.expect("versions");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].hash, offer.hash);
    assert_eq!(versions[0].captured_at, t0());
    assert_eq!(versions[0].source, "us");
    assert_eq!(versions[0].variant, "us-florida");
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_of_existing_key_writes_nothing(pool: sqlx::PgPool) {
    let first = make_offer(Variant::Us, "https://example.com/a", "Deal", 'a');
    let second = make_offer(Variant::Us, "https://example.com/a", "Other", 'b');

    let id = insert_offer_with_version(&pool, &first, t0())
        .await
        .expect("insert")
        .expect("new id");
    let again = insert_offer_with_version(&pool, &second, t0() + Duration::hours(1))
        .await
        .expect("insert");
    assert!(again.is_none());

    let row = get_offer(&pool, id).await.expect("get").expect("row");
    assert_eq!(row.title, "Deal");
    assert_eq!(list_offer_versions(&pool, id).await.expect("versions").len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn same_link_in_other_variant_is_a_separate_offer(pool: sqlx::PgPool) {
    let us = make_offer(Variant::Us, "https://example.com/a", "Deal", 'a');
    let fl = make_offer(Variant::UsFlorida, "https://example.com/a", "Deal", 'b');

    let a = insert_offer_with_version(&pool, &us, t0()).await.expect("insert");
    let b = insert_offer_with_version(&pool, &fl, t0()).await.expect("insert");
    assert!(a.is_some());
    assert!(b.is_some());
    assert_ne!(a, b);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_applies_only_while_hash_matches(pool: sqlx::PgPool) {
    let original = make_offer(Variant::Ca, "https://example.com/ca", "Deal", 'a');
    let id = insert_offer_with_version(&pool, &original, t0())
        .await
        .expect("insert")
        .expect("new id");

    let changed = make_offer(Variant::Ca, "https://example.com/ca", "Better deal", 'b');
    let later = t0() + Duration::hours(6);

    let stale = update_offer_with_version_if_hash(&pool, id, &"z".repeat(64), &changed, later)
        .await
        .expect("update");
    assert!(!stale);
    assert_eq!(list_offer_versions(&pool, id).await.expect("versions").len(), 1);

    let applied = update_offer_with_version_if_hash(&pool, id, &original.hash, &changed, later)
        .await
        .expect("update");
    assert!(applied);

    let row = get_offer(&pool, id).await.expect("get").expect("row");
    assert_eq!(row.title, "Better deal");
    assert_eq!(row.hash, changed.hash);
    assert_eq!(row.first_seen, t0());
    assert_eq!(row.last_seen, later);
    assert_eq!(row.last_changed, later);

    let versions = list_offer_versions(&pool, id).await.expect("versions");
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].title, "Better deal", "newest version first");
    assert_eq!(versions[1].title, "Deal");
}

#[sqlx::test(migrations = "../../migrations")]
async fn touch_moves_last_seen_only(pool: sqlx::PgPool) {
    let offer = make_offer(Variant::Us, "https://example.com/t", "Deal", 'a');
    let id = insert_offer_with_version(&pool, &offer, t0())
        .await
        .expect("insert")
        .expect("new id");

    let later = t0() + Duration::days(1);
    assert!(touch_offer_if_hash(&pool, id, &offer.hash, later)
        .await
        .expect("touch"));
    assert!(!touch_offer_if_hash(&pool, id, &"c".repeat(64), later)
        .await
        .expect("touch"));

    // An older observation never rewinds last_seen.
    assert!(touch_offer_if_hash(&pool, id, &offer.hash, t0())
        .await
        .expect("touch"));

    let row = get_offer(&pool, id).await.expect("get").expect("row");
    assert_eq!(row.last_seen, later);
    assert_eq!(row.last_changed, t0());
    assert_eq!(list_offer_versions(&pool, id).await.expect("versions").len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn offer_versions_reject_updates(pool: sqlx::PgPool) {
    let offer = make_offer(Variant::Us, "https://example.com/v", "Deal", 'a');
    let id = insert_offer_with_version(&pool, &offer, t0())
        .await
        .expect("insert")
        .expect("new id");

    let result = sqlx::query("UPDATE offer_versions SET title = 'tampered' WHERE offer_id = $1")
        .bind(id)
        .execute(&pool)
        .await;
    assert!(result.is_err(), "offer_versions must be append-only");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_offers_filters_by_variant(pool: sqlx::PgPool) {
    for (variant, link, c) in [
        (Variant::Us, "https://example.com/1", 'a'),
        (Variant::UsFlorida, "https://example.com/2", 'b'),
        (Variant::Ca, "https://example.com/3", 'c'),
    ] {
        insert_offer_with_version(&pool, &make_offer(variant, link, "Deal", c), t0())
            .await
            .expect("insert");
    }

    let all = list_offers(&pool, None, 50).await.expect("list");
    assert_eq!(all.len(), 3);

    let ca = list_offers(&pool, Some("ca"), 50).await.expect("list");
    assert_eq!(ca.len(), 1);
    assert_eq!(ca[0].link, "https://example.com/3");

    let limited = list_offers(&pool, None, 2).await.expect("list");
    assert_eq!(limited.len(), 2);
}

// ---------------------------------------------------------------------------
// Scrape log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scrape_log_lists_newest_first(pool: sqlx::PgPool) {
    for (hours, variant, error) in [
        (0, Variant::Us, None),
        (6, Variant::Ca, Some("fetch of https://example.com timed out")),
    ] {
        insert_scrape_log(
            &pool,
            &ScrapeLogEntry {
                run_time: t0() + Duration::hours(hours),
                variant,
                offers_found: 4,
                offers_new: 1,
                offers_changed: 1,
                offers_unchanged: 2,
                error_message: error.map(str::to_string),
            },
        )
        .await
        .expect("insert log");
    }

    let rows = list_scrape_log(&pool, 10).await.expect("list log");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].variant, "ca");
    assert!(rows[0].error_message.is_some());
    assert_eq!(rows[1].variant, "us");
    assert_eq!(rows[1].offers_unchanged, 2);
}

// ---------------------------------------------------------------------------
// PgOfferStore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pg_store_round_trips_through_trait(pool: sqlx::PgPool) {
    let store = PgOfferStore::new(pool.clone());
    let offer = make_offer(Variant::UsFlorida, "https://example.com/s", "Deal", 'a');

    assert!(store
        .find_offer(Source::Us, Variant::UsFlorida, "https://example.com/s")
        .await
        .expect("find")
        .is_none());

    let id = store
        .insert_offer(&offer, t0())
        .await
        .expect("insert")
        .expect("new id");

    let stored = store
        .find_offer(Source::Us, Variant::UsFlorida, "https://example.com/s")
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(stored.id, id);
    assert_eq!(stored.hash, offer.hash);

    assert!(store
        .touch_offer_if_hash(id, &offer.hash, t0() + Duration::hours(1))
        .await
        .expect("touch"));

    store
        .record_scrape_log(&ScrapeLogEntry {
            run_time: t0(),
            variant: Variant::UsFlorida,
            offers_found: 1,
            offers_new: 1,
            offers_changed: 0,
            offers_unchanged: 0,
            error_message: None,
        })
        .await
        .expect("log");
    assert_eq!(list_scrape_log(&pool, 5).await.expect("list").len(), 1);
}
