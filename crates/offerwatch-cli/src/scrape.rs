//! `scrape` command handler.
//!
//! Without `--fixture` the run fetches live listings and reconciles into
//! Postgres. With `--fixture` it reads raw offers from a JSON file and
//! reconciles into an in-memory store, so no database is needed.

use std::path::{Path, PathBuf};

use anyhow::Context;
use offerwatch_core::{ScrapeConfig, Variant};
use offerwatch_db::PgOfferStore;
use offerwatch_pipeline::{
    run_scrape, FixtureOfferSource, LiveOfferSource, MemoryOfferStore, RunReport, ScrapeRequest,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct ScrapeOptions {
    pub selector: Option<String>,
    pub dry_run: bool,
    pub fixture: Option<PathBuf>,
}

/// Builds the pipeline request. `--dry-run` forces a dry run; otherwise the
/// configured default applies.
pub(crate) fn build_request(options: &ScrapeOptions, config: &ScrapeConfig) -> ScrapeRequest {
    ScrapeRequest {
        selector: options.selector.clone(),
        dry_run: options.dry_run || config.dry_run,
        base_urls: config.base_urls.clone(),
    }
}

/// Runs a scrape and prints the report as JSON on stdout.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unknown selector, an
/// unreadable fixture, or when any variant failed.
pub(crate) async fn run_scrape_command(options: &ScrapeOptions) -> anyhow::Result<()> {
    let report = match &options.fixture {
        Some(path) => run_fixture(options, path).await?,
        None => run_live(options).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    let failed = report.failed_variants();
    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().copied().map(Variant::as_str).collect();
        anyhow::bail!("scrape failed for variants: {}", names.join(", "));
    }
    Ok(())
}

async fn run_fixture(options: &ScrapeOptions, path: &Path) -> anyhow::Result<RunReport> {
    let config = offerwatch_core::load_scrape_config()?;
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let source = FixtureOfferSource::from_json(&json)
        .with_context(|| format!("failed to parse fixture {}", path.display()))?;
    let store = MemoryOfferStore::new();
    let request = build_request(options, &config);

    tracing::info!(fixture = %path.display(), source = ?request.selector, "running fixture scrape");
    let report = run_scrape(&store, &source, &request).await?;
    Ok(report)
}

async fn run_live(options: &ScrapeOptions) -> anyhow::Result<RunReport> {
    let config = offerwatch_core::load_app_config()?;
    let pool_config = offerwatch_db::PoolConfig::from_app_config(&config);
    let pool = offerwatch_db::connect_pool(&config.database_url, pool_config).await?;
    let store = PgOfferStore::new(pool);
    let source = LiveOfferSource::from_scrape_config(&config.scrape)?;
    let request = build_request(options, &config.scrape);

    tracing::info!(source = ?request.selector, dry_run = request.dry_run, "running live scrape");
    let report = run_scrape(&store, &source, &request).await?;
    Ok(report)
}
