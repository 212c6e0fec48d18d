//! One complete collection run: open store → ingest → read back latest → release.

use tracing::{info, instrument};

use ordertrack_fetcher::OrderFetcher;
use ordertrack_shared::{AppConfig, OrderRecord, Result};
use ordertrack_storage::{OrderStore, Storage};

use crate::ingest::{IngestOptions, IngestProgress, IngestSummary, ingest};

/// Result of [`run_collection`].
#[derive(Debug)]
pub struct CollectionRun {
    /// Ingest counts.
    pub summary: IngestSummary,
    /// Most recently ingested order after this run, if any are stored.
    pub latest: Option<OrderRecord>,
}

/// Run one collection against the configured source and store.
///
/// The store is opened here and dropped before returning on every path,
/// including errors. Scheduled runs call this afresh each time.
#[instrument(skip_all, fields(url = %config.source.listing_url))]
pub async fn run_collection(
    config: &AppConfig,
    progress: &dyn IngestProgress,
) -> Result<CollectionRun> {
    info!("order collection started");

    let options = IngestOptions::try_from(config)?;
    let fetcher = OrderFetcher::new(&config.source)?;

    let db_path = config.storage.resolved_db_path()?;
    let storage = Storage::open(&db_path).await?;

    let summary = ingest(&fetcher, &storage, &options, progress).await?;
    let latest = storage.most_recent().await?;
    drop(storage);

    info!(inserted = summary.inserted, "order collection finished");
    Ok(CollectionRun { summary, latest })
}
