//! Migration orchestrator - concurrent transfer state machine.
//!
//! Drains the selected manifest rows through a bounded worker pool. Each
//! worker runs one item's state machine to completion
//! (`pending -> processing -> success | failed`), writes the outcome back
//! into the manifest, and bumps the run counters. Items are isolated: one
//! failure never interrupts sibling workers, and the manifest is persisted
//! once after every worker has finished.

use crate::error::{MigrateError, Result};
use crate::manifest::{display_row, ItemStatus, Manifest, MigrationItem};
use crate::resolver::object_key;
use crate::scratch::ScratchFile;
use crate::sink::{content_type_for, SinkStore};
use crate::source::SourceStore;
use crate::stats::{RunStats, StatsSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Migration orchestrator.
pub struct Migrator {
    manifest: Arc<Manifest>,
    source: Arc<dyn SourceStore>,
    sink: Arc<dyn SinkStore>,
    workers: usize,
    temp_dir: PathBuf,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Rows selected for this run.
    pub total: usize,

    /// Fresh transfers.
    pub success: usize,

    /// Rows that failed.
    pub failed: usize,

    /// Rows already present at the destination.
    pub skipped: usize,

    /// `(success + skipped) / total` in percent; 0 for an empty run.
    pub success_rate: f64,
}

impl RunReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Ephemeral per-item outcome, produced by one worker and consumed by the
/// completion log, then discarded.
#[derive(Debug)]
pub struct TransferResult {
    pub index: usize,
    pub url: String,
    pub bucket: Option<String>,
    pub success: bool,
    pub skipped: bool,
    pub error: Option<String>,
    pub source_key: Option<String>,
    pub local_path: Option<PathBuf>,
    pub sink_key: Option<String>,
}

impl TransferResult {
    fn new(item: &MigrationItem) -> Self {
        Self {
            index: item.index,
            url: item.url.clone(),
            bucket: None,
            success: false,
            skipped: false,
            error: None,
            source_key: None,
            local_path: None,
            sink_key: None,
        }
    }
}

enum Outcome {
    Transferred,
    Skipped,
}

/// Shared context cloned into every worker task.
#[derive(Clone)]
struct WorkerCtx {
    manifest: Arc<Manifest>,
    source: Arc<dyn SourceStore>,
    sink: Arc<dyn SinkStore>,
    stats: Arc<RunStats>,
    temp_dir: PathBuf,
}

impl Migrator {
    /// Create a new orchestrator over loaded ports.
    pub fn new(
        manifest: Arc<Manifest>,
        source: Arc<dyn SourceStore>,
        sink: Arc<dyn SinkStore>,
        workers: usize,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            manifest,
            source,
            sink,
            workers: workers.max(1),
            temp_dir,
        }
    }

    /// Run the migration over rows matching `status_filter`.
    ///
    /// With `resume`, only `pending` and `failed` rows are re-selected, so
    /// rows already marked `success` are never retried. The manifest is
    /// persisted once, after all workers finish, in place or to `output`.
    pub async fn run(
        &self,
        status_filter: &[ItemStatus],
        resume: bool,
        output: Option<&Path>,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let filter: &[ItemStatus] = if resume {
            &[ItemStatus::Pending, ItemStatus::Failed]
        } else {
            status_filter
        };

        let items = self.manifest.items(filter);
        let stats = Arc::new(RunStats::new());
        stats.set_total(items.len());

        if items.is_empty() {
            info!("no manifest rows to process");
            return Ok(self.build_report(run_id, started_at, stats.snapshot()));
        }

        info!(
            "starting run {}: {} objects, {} workers",
            run_id,
            items.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let ctx = WorkerCtx {
            manifest: self.manifest.clone(),
            source: self.source.clone(),
            sink: self.sink.clone(),
            stats: stats.clone(),
            temp_dir: self.temp_dir.clone(),
        };

        let mut handles = Vec::new();
        for item in items {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let ctx = ctx.clone();
            let meta = (item.index, item.url.clone());

            let handle = tokio::spawn(async move {
                let result = migrate_item(ctx, item).await;
                drop(permit);
                result
            });

            handles.push((meta, handle));
        }

        for ((index, url), handle) in handles {
            match handle.await {
                Ok(result) => {
                    let snap = stats.snapshot();
                    if result.success {
                        info!(
                            "✓ completed ({}/{}): {}",
                            snap.completed(),
                            snap.total,
                            result.source_key.as_deref().unwrap_or(&result.url)
                        );
                    } else {
                        error!("✗ failed ({}/{}): {}", snap.failed, snap.total, result.url);
                    }
                }
                Err(e) => {
                    error!("{}: task panicked - {}", url, e);
                    self.manifest
                        .set_status(index, ItemStatus::Failed, Some(&format!("task panicked: {}", e)));
                    stats.record_failed();
                }
            }
        }

        self.manifest.persist(output)?;

        let report = self.build_report(run_id, started_at, stats.snapshot());
        info!(
            "run {}: total {}, success {}, failed {}, skipped {} ({:.2}%)",
            report.run_id,
            report.total,
            report.success,
            report.failed,
            report.skipped,
            report.success_rate
        );
        Ok(report)
    }

    fn build_report(&self, run_id: String, started_at: DateTime<Utc>, snap: StatsSnapshot) -> RunReport {
        let completed_at = Utc::now();
        RunReport {
            run_id,
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            total: snap.total,
            success: snap.success,
            failed: snap.failed,
            skipped: snap.skipped,
            success_rate: snap.success_rate(),
        }
    }
}

/// Run one item's state machine and record the outcome.
///
/// The `processing` marker is written before any I/O so a crash mid-transfer
/// is distinguishable from an untouched row.
async fn migrate_item(ctx: WorkerCtx, item: MigrationItem) -> TransferResult {
    ctx.manifest.set_status(item.index, ItemStatus::Processing, None);

    let mut result = TransferResult::new(&item);
    match transfer_one(&ctx, &item, &mut result).await {
        Ok(Outcome::Transferred) => {
            ctx.manifest.set_status(item.index, ItemStatus::Success, None);
            ctx.stats.record_success();
            result.success = true;
        }
        Ok(Outcome::Skipped) => {
            ctx.manifest.set_status(item.index, ItemStatus::Success, None);
            ctx.stats.record_skipped();
            result.success = true;
            result.skipped = true;
        }
        Err(e) => {
            let message = e.to_string();
            ctx.manifest
                .set_status(item.index, ItemStatus::Failed, Some(&message));
            ctx.stats.record_failed();
            error!(
                "migration failed (row {}): {}: {}",
                display_row(item.index),
                item.url,
                message
            );
            result.error = Some(message);
        }
    }
    result
}

/// The per-item transfer procedure; any error is this item's terminal
/// failure and never propagates to sibling workers.
async fn transfer_one(
    ctx: &WorkerCtx,
    item: &MigrationItem,
    result: &mut TransferResult,
) -> Result<Outcome> {
    let identity = ctx
        .source
        .resolve(&item.url, item.bucket_hint.as_deref())
        .ok_or_else(|| MigrateError::Resolution {
            url: item.url.clone(),
        })?;

    let key = object_key(&item.url)
        .ok_or_else(|| MigrateError::transfer(&item.url, "no object key in URL path"))?;
    result.source_key = Some(key.clone());

    if !ctx.source.exists(&identity, &key).await? {
        warn!(
            "object missing at source, running diagnostic listing: {} (bucket {})",
            key, identity.bucket
        );
        ctx.source.list_similar(&identity, &key).await;
        return Err(MigrateError::NotFound {
            bucket: identity.bucket.clone(),
            key,
        });
    }

    // Per-row destination override beats the sink default, so one manifest
    // can fan out to many destination buckets.
    let bucket = item
        .bucket_hint
        .clone()
        .unwrap_or_else(|| ctx.sink.default_bucket().to_string());
    result.bucket = Some(bucket.clone());

    if ctx.sink.exists(&bucket, &key).await? {
        info!("already present at destination, skipping: {}/{}", bucket, key);
        result.sink_key = Some(key);
        return Ok(Outcome::Skipped);
    }

    let scratch = ScratchFile::allocate(&ctx.temp_dir, &key)?;
    result.local_path = Some(scratch.path().to_path_buf());

    let bytes = ctx.source.fetch(&identity, &key, scratch.path()).await?;
    if bytes == 0 {
        return Err(MigrateError::transfer(&key, "downloaded file is empty"));
    }

    let content_type = content_type_for(scratch.path());
    ctx.sink
        .publish(scratch.path(), &bucket, &key, content_type)
        .await?;
    result.sink_key = Some(key.clone());

    info!("migrated: {} -> {}/{}", key, bucket, key);
    Ok(Outcome::Transferred)
    // scratch drops here; the local file is gone on every exit path
}
