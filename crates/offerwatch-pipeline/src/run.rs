//! One scrape run across a selected set of variants.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use offerwatch_core::{
    resolve_variants, BaseUrls, OfferCounts, OfferStore, ScrapeLogEntry, Variant, VariantPreset,
};
use offerwatch_scraper::canonicalize_offers;
use serde::Serialize;

use crate::error::PipelineError;
use crate::reconcile::reconcile;
use crate::source::OfferSource;

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    /// Source selector; `None` runs every variant.
    pub selector: Option<String>,
    pub dry_run: bool,
    pub base_urls: BaseUrls,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantReport {
    #[serde(flatten)]
    pub counts: OfferCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// `true` whenever the run completed; per-variant failures are reported
    /// under `variants`.
    pub ok: bool,
    pub requested: String,
    pub dry_run: bool,
    pub counts: OfferCounts,
    pub variants: BTreeMap<Variant, VariantReport>,
}

impl RunReport {
    #[must_use]
    pub fn failed_variants(&self) -> Vec<Variant> {
        self.variants
            .iter()
            .filter(|(_, report)| report.error.is_some())
            .map(|(variant, _)| *variant)
            .collect()
    }
}

/// Runs every variant selected by `request`, one after another.
///
/// A fetch or store failure fails only its own variant. Outside dry-run,
/// one `scrape_log` row is written per variant; a failed log write is
/// logged and otherwise ignored.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for an unknown source selector, before
/// any variant runs.
pub async fn run_scrape(
    store: &dyn OfferStore,
    source: &dyn OfferSource,
    request: &ScrapeRequest,
) -> Result<RunReport, PipelineError> {
    let variants = resolve_variants(request.selector.as_deref())?;
    let requested = request
        .selector
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "all".to_string());

    tracing::info!(
        requested = %requested,
        variants = variants.len(),
        dry_run = request.dry_run,
        "scrape run starting"
    );

    let mut report = RunReport {
        ok: true,
        requested,
        dry_run: request.dry_run,
        counts: OfferCounts::default(),
        variants: BTreeMap::new(),
    };

    for variant in variants {
        let preset = VariantPreset::new(variant, &request.base_urls);
        let variant_report = run_variant(store, source, &preset, request.dry_run).await;

        if !request.dry_run {
            record_log(store, variant, &variant_report, Utc::now()).await;
        }

        report.counts.add(&variant_report.counts);
        report.variants.insert(variant, variant_report);
    }

    tracing::info!(
        found = report.counts.found,
        new = report.counts.new,
        changed = report.counts.changed,
        unchanged = report.counts.unchanged,
        failed = report.failed_variants().len(),
        "scrape run complete"
    );

    Ok(report)
}

async fn run_variant(
    store: &dyn OfferStore,
    source: &dyn OfferSource,
    preset: &VariantPreset,
    dry_run: bool,
) -> VariantReport {
    let variant = preset.variant;

    let raws = match source.raw_offers(preset).await {
        Ok(raws) => raws,
        Err(e) => {
            tracing::error!(%variant, error = %e, "variant fetch failed; skipping");
            return VariantReport {
                counts: OfferCounts::default(),
                error: Some(e.to_string()),
            };
        }
    };

    let offers = canonicalize_offers(preset.source, variant, &preset.base_url, &raws);
    tracing::debug!(%variant, raw = raws.len(), canonical = offers.len(), "canonicalized offers");

    if offers.is_empty() {
        return VariantReport::default();
    }

    match reconcile(store, &offers, dry_run, Utc::now()).await {
        Ok(counts) => VariantReport {
            counts,
            error: None,
        },
        Err(e) => {
            tracing::error!(%variant, error = %e, "variant reconcile failed");
            VariantReport {
                counts: OfferCounts {
                    found: offers.len(),
                    ..OfferCounts::default()
                },
                error: Some(e.to_string()),
            }
        }
    }
}

async fn record_log(
    store: &dyn OfferStore,
    variant: Variant,
    report: &VariantReport,
    run_time: DateTime<Utc>,
) {
    let entry = ScrapeLogEntry {
        run_time,
        variant,
        offers_found: report.counts.found,
        offers_new: report.counts.new,
        offers_changed: report.counts.changed,
        offers_unchanged: report.counts.unchanged,
        error_message: report.error.clone(),
    };
    if let Err(e) = store.record_scrape_log(&entry).await {
        tracing::error!(%variant, error = %e, "failed to record scrape log entry");
    }
}
