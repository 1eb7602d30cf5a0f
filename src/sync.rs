use crate::db::{self, Pool};
use crate::model::Batch;
use crate::upstream::{
    pick_collection, CatalogSource, UpstreamBatch, DOCUMENT_FIELDS, LECTURE_FIELDS,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Pass-wide failures. Per-batch fetch failures never surface here; they are
/// degraded to empty collections instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list upstream batches: {0:#}")]
    ListBatches(anyhow::Error),
    #[error("failed to store batch {batch_id}: {error:#}")]
    Store {
        batch_id: String,
        error: anyhow::Error,
    },
}

/// Counters for one completed pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub batches_seen: usize,
    pub batches_written: usize,
    /// Lecture or document fetches that failed and were stored as empty.
    pub degraded_fetches: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run one full reconciliation pass: list upstream batches, fetch each batch's
/// lectures and documents, and upsert every batch into the store.
///
/// At most `concurrency` batches are in flight at once; `1` processes them
/// strictly in listing order.
#[instrument(skip_all)]
pub async fn run_sync(
    pool: &Pool,
    source: &dyn CatalogSource,
    concurrency: usize,
) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();
    info!("sync pass started");

    let batches = match source.list_batches().await {
        Ok(batches) => batches,
        Err(err) => {
            error!(?err, "sync pass aborted: upstream batch list unavailable");
            return Err(SyncError::ListBatches(err));
        }
    };
    let total = batches.len();
    info!(total, "upstream batch list fetched");

    let mut batches_written = 0;
    let mut degraded_fetches = 0;
    let mut outcomes = stream::iter(batches.into_iter().enumerate())
        .map(move |(index, batch)| sync_batch(pool, source, batch, index + 1, total))
        .buffered(concurrency.max(1));
    while let Some(outcome) = outcomes.next().await {
        degraded_fetches += outcome?;
        batches_written += 1;
    }

    let report = SyncReport {
        batches_seen: total,
        batches_written,
        degraded_fetches,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        batches = report.batches_written,
        degraded = report.degraded_fetches,
        "sync pass complete"
    );
    Ok(report)
}

/// Fetch and store a single batch. Returns the number of degraded fetches.
async fn sync_batch(
    pool: &Pool,
    source: &dyn CatalogSource,
    upstream: UpstreamBatch,
    position: usize,
    total: usize,
) -> Result<usize, SyncError> {
    let UpstreamBatch { id, title, banner } = upstream;
    let title = title.unwrap_or_default();
    info!(batch_id = %id, %title, position, total, "syncing batch");

    let (lectures, documents) =
        tokio::join!(source.fetch_lectures(&id), source.fetch_documents(&id));
    let (lectures, lectures_degraded) =
        collect_or_empty(lectures, LECTURE_FIELDS, &id, "lectures");
    let (documents, documents_degraded) =
        collect_or_empty(documents, DOCUMENT_FIELDS, &id, "documents");

    let batch = Batch {
        id,
        title,
        banner: banner.unwrap_or_default(),
        lectures,
        documents,
        last_updated: Utc::now(),
    };
    if let Err(err) = db::upsert_batch(pool, &batch).await {
        error!(?err, batch_id = %batch.id, "sync pass aborted: failed to store batch");
        return Err(SyncError::Store {
            batch_id: batch.id,
            error: err,
        });
    }
    debug!(
        batch_id = %batch.id,
        lectures = batch.lectures.len(),
        documents = batch.documents.len(),
        "batch stored"
    );

    Ok(usize::from(lectures_degraded) + usize::from(documents_degraded))
}

fn collect_or_empty(
    payload: anyhow::Result<Value>,
    candidates: &[&str],
    batch_id: &str,
    what: &'static str,
) -> (Vec<Value>, bool) {
    match payload {
        Ok(payload) => (pick_collection(&payload, candidates), false),
        Err(err) => {
            warn!(?err, batch_id, what, "fetch failed; storing empty collection");
            (Vec::new(), true)
        }
    }
}
