//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring scrape of every variant.

use std::sync::Arc;

use offerwatch_core::ScrapeConfig;
use offerwatch_db::PgOfferStore;
use offerwatch_pipeline::{run_scrape, OfferSource, ScrapeRequest};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the scrape job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    source: Arc<dyn OfferSource>,
    scrape: Arc<ScrapeConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_scrape_job(&scheduler, pool, source, scrape).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the scrape job on `OFFERWATCH_SCRAPE_SCHEDULE`.
///
/// Each tick runs all variants with the configured dry-run default.
async fn register_scrape_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    source: Arc<dyn OfferSource>,
    scrape: Arc<ScrapeConfig>,
) -> Result<(), JobSchedulerError> {
    let cron = scrape.schedule.clone();
    let store = Arc::new(PgOfferStore::new(pool));

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let store = Arc::clone(&store);
        let source = Arc::clone(&source);
        let scrape = Arc::clone(&scrape);

        Box::pin(async move {
            tracing::info!("scheduler: starting scrape run");
            run_scrape_job(&store, source.as_ref(), &scrape).await;
            tracing::info!("scheduler: scrape run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered scrape job");
    Ok(())
}

/// Errors are logged rather than propagated; the next tick tries again.
async fn run_scrape_job(store: &PgOfferStore, source: &dyn OfferSource, scrape: &ScrapeConfig) {
    let request = ScrapeRequest {
        selector: None,
        dry_run: scrape.dry_run,
        base_urls: scrape.base_urls.clone(),
    };

    match run_scrape(store, source, &request).await {
        Ok(report) => {
            let failed = report.failed_variants();
            if failed.is_empty() {
                tracing::info!(
                    found = report.counts.found,
                    new = report.counts.new,
                    changed = report.counts.changed,
                    unchanged = report.counts.unchanged,
                    dry_run = report.dry_run,
                    "scheduler: scrape finished"
                );
            } else {
                tracing::warn!(
                    found = report.counts.found,
                    new = report.counts.new,
                    changed = report.counts.changed,
                    failed = ?failed,
                    "scheduler: scrape finished with failed variants"
                );
            }
        }
        Err(e) => tracing::error!(error = %e, "scheduler: scrape run failed"),
    }
}
