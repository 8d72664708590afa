//! Metadata extraction fan-out.
//!
//! Every entry of an upload notification batch is processed concurrently:
//! fetch the object, decode its image header, strip the upload prefix
//! from the key, and upsert the record.  Entries are independent; a
//! failing entry never stops its siblings.
//!
//! Concurrency is capped by a semaphore (`pipeline.max_workers` permits)
//! and all tasks live in a `JoinSet` that is drained before returning, so
//! the report reflects every entry's outcome.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{error, info, warn};

use crate::errors::PipelineError;
use crate::events::{strip_upload_prefix, NotificationBatch, NotificationEntry};
use crate::metadata::store::MetadataRecord;
use crate::{metrics, probe, AppState};

/// Outcome of one fan-out invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// True when the batch was well-formed and every entry was dispatched.
    pub success: bool,
    /// Entries whose record was written.
    pub processed: usize,
    /// Entries that failed, in completion order.
    pub failed: Vec<FailedEntry>,
}

/// A notification entry that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEntry {
    pub key: String,
    pub stage: String,
    pub error: String,
}

impl ExtractionReport {
    fn accepted() -> Self {
        Self {
            success: true,
            processed: 0,
            failed: Vec::new(),
        }
    }

    fn rejected() -> Self {
        Self {
            success: false,
            processed: 0,
            failed: Vec::new(),
        }
    }
}

/// Entry point for a raw trigger payload.
///
/// A payload that is not an S3 notification is rejected as a whole and
/// nothing is processed.
pub async fn extract_metadata(
    state: Arc<AppState>,
    payload: serde_json::Value,
) -> ExtractionReport {
    match NotificationBatch::from_json(payload) {
        Ok(batch) => process_batch(state, batch).await,
        Err(e) => {
            error!("Rejected notification batch: {e:#}");
            ExtractionReport::rejected()
        }
    }
}

/// Process every entry of `batch` and wait for all of them.
pub async fn process_batch(state: Arc<AppState>, batch: NotificationBatch) -> ExtractionReport {
    let total = batch.len();
    metrics::record_batch_size(total);

    let semaphore = Arc::new(Semaphore::new(state.config.pipeline.max_workers));
    let mut tasks = JoinSet::new();
    // Task id -> entry key, so a panicked task can still be named.
    let mut keys: HashMap<Id, String> = HashMap::with_capacity(total);

    for entry in batch.entries {
        let state = Arc::clone(&state);
        let semaphore = Arc::clone(&semaphore);
        let key = entry.display_key().to_string();
        let handle = tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => extract_one(&state, &entry).await,
                Err(e) => Err(PipelineError::Internal(e.into())),
            };
            (entry, result)
        });
        keys.insert(handle.id(), key);
    }

    let mut report = ExtractionReport::accepted();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (_, Ok(record)))) => {
                metrics::record_extract_item("ok");
                tracing::debug!(
                    "Stored metadata: key={} {}x{} type={:?} size={}",
                    record.object_key,
                    record.width,
                    record.height,
                    record.format,
                    record.size
                );
                report.processed += 1;
            }
            Ok((_, (entry, Err(err)))) => {
                metrics::record_extract_item(err.stage());
                warn!(
                    key = entry.display_key(),
                    stage = err.stage(),
                    "Metadata extraction failed: {err}"
                );
                report.failed.push(FailedEntry {
                    key: entry.display_key().to_string(),
                    stage: err.stage().to_string(),
                    error: err.to_string(),
                });
            }
            Err(join_err) => {
                metrics::record_extract_item("panic");
                let key = keys
                    .remove(&join_err.id())
                    .unwrap_or_else(|| "<unknown>".to_string());
                error!(key = %key, "Metadata extraction task aborted: {join_err}");
                report.failed.push(FailedEntry {
                    key,
                    stage: "panic".to_string(),
                    error: join_err.to_string(),
                });
            }
        }
    }

    info!(
        "Notification batch done: entries={} processed={} failed={}",
        total,
        report.processed,
        report.failed.len()
    );
    report
}

/// Fetch, decode and store one entry.
pub async fn extract_one(
    state: &AppState,
    entry: &NotificationEntry,
) -> Result<MetadataRecord, PipelineError> {
    let (bucket, key) = entry.location()?;

    let object = state
        .storage
        .get(bucket, key)
        .await
        .map_err(|source| PipelineError::Fetch {
            key: key.to_string(),
            source,
        })?;

    let info = probe::probe(&object.data).map_err(|source| PipelineError::Decode {
        key: key.to_string(),
        source,
    })?;

    let record = MetadataRecord {
        object_key: strip_upload_prefix(key, &state.config.pipeline.upload_prefix),
        width: info.width,
        height: info.height,
        format: info.format,
        size: object.content_length,
    };

    state
        .metadata
        .put_record(record.clone())
        .await
        .map_err(|source| PipelineError::Store {
            key: key.to_string(),
            source,
        })?;

    Ok(record)
}
