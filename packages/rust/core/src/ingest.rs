//! The ingestion pipeline: listing → existence check → detail → store.

use std::time::{Duration, Instant};

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, error, info, instrument};
use url::Url;

use ordertrack_fetcher::{DetailOutcome, OrderFetcher};
use ordertrack_shared::{AppConfig, OrderCandidate, OrderRecord, OrderTrackError, Result};
use ordertrack_storage::OrderStore;

use crate::policy::{KnownTitlePolicy, Step};

// ---------------------------------------------------------------------------
// Options & summary
// ---------------------------------------------------------------------------

/// Runtime options for [`ingest`], derived from the app config.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Listing page to read candidates from.
    pub listing_url: Url,
    /// Provenance tag stored on each record.
    pub source_tag: String,
    /// Politeness pause after the candidate loop.
    pub request_delay: Duration,
    /// What to do on a title that is already stored.
    pub policy: KnownTitlePolicy,
}

impl TryFrom<&AppConfig> for IngestOptions {
    type Error = OrderTrackError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let listing_url = Url::parse(&config.source.listing_url).map_err(|e| {
            OrderTrackError::validation(format!(
                "invalid listing_url '{}': {e}",
                config.source.listing_url
            ))
        })?;

        Ok(Self {
            listing_url,
            source_tag: config.source.source_tag.clone(),
            request_delay: Duration::from_millis(config.ingest.request_delay_ms),
            policy: config.ingest.on_known.into(),
        })
    }
}

/// Outcome of one [`ingest`] call.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// Records written.
    pub inserted: usize,
    /// Known candidates passed over (only under `SkipKnown`).
    pub skipped_known: usize,
    /// Records written with fallback date and empty content.
    pub degraded: usize,
    /// Title at which iteration stopped, if it stopped early.
    pub stopped_at: Option<String>,
    /// Why the listing could not be fetched, if it could not.
    pub listing_error: Option<String>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait IngestProgress: Send + Sync {
    /// The listing page could not be fetched; the run ends here.
    fn listing_failed(&self, error: &OrderTrackError);
    /// A record was written. `index` is 1-based.
    fn order_stored(&self, index: usize, record: &OrderRecord, degraded: bool);
    /// Iteration stopped at an already stored title.
    fn known_reached(&self, title: &str);
    /// Called once at the end of every run.
    fn finished(&self, summary: &IngestSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl IngestProgress for SilentProgress {
    fn listing_failed(&self, _error: &OrderTrackError) {}
    fn order_stored(&self, _index: usize, _record: &OrderRecord, _degraded: bool) {}
    fn known_reached(&self, _title: &str) {}
    fn finished(&self, _summary: &IngestSummary) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the ingestion pipeline once.
///
/// 1. Fetch the listing (failure ends the run with zero inserts, not an error)
/// 2. For each candidate, newest first, check the store by title
/// 3. Known title: apply the policy (default: stop)
/// 4. New title: fetch detail, assemble the record, write it
/// 5. Pause for the politeness delay
///
/// Store errors propagate. Records written before the error stay written.
#[instrument(skip_all, fields(url = %options.listing_url))]
pub async fn ingest<S: OrderStore>(
    fetcher: &OrderFetcher,
    store: &S,
    options: &IngestOptions,
    progress: &dyn IngestProgress,
) -> Result<IngestSummary> {
    let start = Instant::now();
    let mut summary = IngestSummary::default();

    let candidates = match fetcher.fetch_listing(&options.listing_url).await {
        Ok(candidates) => candidates,
        Err(e) => {
            error!(error = %e, "listing fetch failed");
            progress.listing_failed(&e);
            summary.listing_error = Some(e.to_string());
            summary.elapsed = start.elapsed();
            progress.finished(&summary);
            return Ok(summary);
        }
    };

    for candidate in candidates {
        if store.find_by_title(&candidate.title).await?.is_some() {
            match options.policy.on_known() {
                Step::Stop => {
                    info!(title = %candidate.title, "reached stored order, stopping");
                    progress.known_reached(&candidate.title);
                    summary.stopped_at = Some(candidate.title);
                    break;
                }
                Step::Skip => {
                    debug!(title = %candidate.title, "already stored, skipping");
                    summary.skipped_known += 1;
                    continue;
                }
            }
        }

        let outcome = fetcher.fetch_detail(&candidate.link).await;
        let degraded = outcome.is_degraded();
        let record = assemble_record(candidate, outcome, Utc::now(), &options.source_tag);

        store.insert_order(&record).await?;

        summary.inserted += 1;
        if degraded {
            summary.degraded += 1;
        }
        debug!(title = %record.title, degraded, "order stored");
        progress.order_stored(summary.inserted, &record, degraded);
    }

    if !options.request_delay.is_zero() {
        tokio::time::sleep(options.request_delay).await;
    }

    summary.elapsed = start.elapsed();

    info!(
        inserted = summary.inserted,
        skipped_known = summary.skipped_known,
        degraded = summary.degraded,
        stopped_at = summary.stopped_at.as_deref().unwrap_or(""),
        elapsed_ms = summary.elapsed.as_millis(),
        "ingest completed"
    );
    progress.finished(&summary);

    Ok(summary)
}

/// Build the record for a new candidate.
///
/// `now` is truncated to microseconds, the precision the store keeps.
pub fn assemble_record(
    candidate: OrderCandidate,
    detail: DetailOutcome,
    now: DateTime<Utc>,
    source_tag: &str,
) -> OrderRecord {
    let now = now.trunc_subsecs(6);
    let (order_date, content) = detail.resolve(now);
    OrderRecord {
        title: candidate.title,
        link: candidate.link,
        created_at: now,
        order_date,
        content,
        source: source_tag.to_string(),
    }
}
