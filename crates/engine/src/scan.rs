// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scan engine: resumable breadth-first traversal of a user's remote
//! namespace.
//!
//! The traversal queue, visited set, counters, and snapshot-buffer offset
//! are checkpointed together; replay after a crash is idempotent because
//! the visited set and the buffer offset de-duplicate work. Cancellation
//! is observed between folders and inside every gateway wait.

use crate::bus::EventBus;
use crate::error::ScanError;
use crate::registry::{JobRegistry, RegistryError};
use ds_core::{
    Clock, EventKind, FileId, FileRecord, IdGen, QueuedFolder, ScanCheckpoint, ScanConfig, ScanId,
    ScanJob, ScanProgress, ScanSettings, ScanStatus, SnapshotId, SnapshotMeta, Topic, UuidIdGen,
};
use ds_gateway::{Ctx, Gateway};
use ds_storage::{ScanStore, SnapshotStore, StorageError};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Alias for the user's root folder understood by the remote service.
pub const ROOT_FOLDER: &str = "root";

/// Smoothing factor for the files-per-folder estimate.
const BRANCHING_EMA_WEIGHT: f64 = 0.3;

/// Drives scans for all users; per-user single-flight is enforced through
/// the job registry.
pub struct ScanEngine<G: IdGen = UuidIdGen> {
    gateway: Arc<Gateway>,
    scans: Arc<dyn ScanStore>,
    snapshots: Arc<dyn SnapshotStore>,
    registry: Arc<JobRegistry>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    ids: G,
    settings: ScanSettings,
    cancels: Mutex<HashMap<ScanId, CancellationToken>>,
    pauses: Mutex<HashSet<ScanId>>,
}

impl<G: IdGen> ScanEngine<G> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<Gateway>,
        scans: Arc<dyn ScanStore>,
        snapshots: Arc<dyn SnapshotStore>,
        registry: Arc<JobRegistry>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        ids: G,
        settings: ScanSettings,
    ) -> Self {
        Self {
            gateway,
            scans,
            snapshots,
            registry,
            bus,
            clock,
            ids,
            settings,
            cancels: Mutex::new(HashMap::new()),
            pauses: Mutex::new(HashSet::new()),
        }
    }

    /// Admit and persist a new scan job. The job is queued; [`Self::run`]
    /// drives it to a terminal status.
    pub fn start(&self, ctx: &Ctx, config: ScanConfig) -> Result<ScanId, ScanError> {
        if config.max_depth == 0 || config.max_depth > ScanSettings::MAX_DEPTH_CAP {
            return Err(ScanError::Validation {
                field: "max_depth".into(),
                message: format!("must be 1..={}", ScanSettings::MAX_DEPTH_CAP),
            });
        }
        let scan_id = ScanId::new(self.ids.next());
        self.registry.admit_scan(&ctx.user, &scan_id)?;

        let job = ScanJob::new(scan_id.clone(), ctx.user.clone(), config, &self.clock);
        if let Err(e) = self.scans.write_scan(&job) {
            self.registry.release_scan(&ctx.user, &scan_id);
            return Err(e.into());
        }
        info!(user_key = %ctx.user, scan_id = %scan_id, "scan admitted");
        Ok(scan_id)
    }

    /// Current job record.
    pub fn status(&self, scan_id: &ScanId) -> Result<ScanJob, ScanError> {
        self.read_job(scan_id)?
            .ok_or_else(|| ScanError::NotFound(scan_id.to_string()))
    }

    /// Request a pause. The running scan parks at the next folder
    /// boundary with a fresh checkpoint; the registry slot stays held so
    /// no second scan can sneak in before the resume.
    pub fn pause(&self, scan_id: &ScanId) -> Result<(), ScanError> {
        let job = self.status(scan_id)?;
        if !job.status.is_active() {
            return Err(ScanError::NotRunnable(job.status.to_string()));
        }
        self.pauses.lock().insert(scan_id.clone());
        Ok(())
    }

    /// Request cancellation. Running scans observe it at the next folder
    /// boundary or gateway wait; a queued or paused scan is cancelled in
    /// place.
    pub fn cancel(&self, scan_id: &ScanId) -> Result<(), ScanError> {
        if let Some(token) = self.cancels.lock().get(scan_id) {
            token.cancel();
            return Ok(());
        }
        let mut job = self.status(scan_id)?;
        if matches!(job.status, ScanStatus::Queued | ScanStatus::Paused) {
            let now = self.clock.epoch_ms();
            if job.transition(ScanStatus::Cancelled, now).is_ok() {
                self.scans.write_scan(&job)?;
                self.registry.release_scan(&job.user_key, scan_id);
                self.publish_terminal(scan_id, "cancelled", &job.progress);
            }
        }
        Ok(())
    }

    /// Drive a queued, paused, or interrupted scan to a terminal status.
    /// Returns the finalized snapshot on completion.
    pub async fn run(&self, ctx: &Ctx, scan_id: &ScanId) -> Result<SnapshotMeta, ScanError> {
        let mut job = self.status(scan_id)?;

        // Re-admission is a no-op when this scan already owns the slot
        // (the usual start -> run sequence) but reclaims it after a
        // process restart.
        match self.registry.admit_scan(&ctx.user, scan_id) {
            Ok(()) => {}
            Err(RegistryError::ScanAlreadyActive { existing }) if &existing == scan_id => {}
            Err(e) => return Err(e.into()),
        }

        let now = self.clock.epoch_ms();
        match job.status {
            ScanStatus::Queued | ScanStatus::Paused => {
                let started = job
                    .transition(ScanStatus::Running, now)
                    .map_err(ScanError::from)
                    .and_then(|()| self.scans.write_scan(&job).map_err(ScanError::from));
                if let Err(e) = started {
                    self.registry.release_scan(&ctx.user, scan_id);
                    return Err(e);
                }
            }
            // crash recovery: the record was left running
            ScanStatus::Running => {}
            other => {
                self.registry.release_scan(&ctx.user, scan_id);
                return Err(ScanError::NotRunnable(other.to_string()));
            }
        }

        self.cancels.lock().insert(scan_id.clone(), ctx.cancel.clone());
        let outcome = self.traverse(ctx, &mut job).await;
        self.cancels.lock().remove(scan_id);

        let now = self.clock.epoch_ms();
        let topic = Topic::Scan(scan_id.clone());
        match outcome {
            Ok(meta) => {
                job.record_progress(meta.total_files, meta.total_bytes, 100, now);
                job.transition(ScanStatus::Completed, now)?;
                self.scans.write_scan(&job)?;
                self.bus.publish(
                    &topic,
                    EventKind::Progress,
                    json!({
                        "files_seen": meta.total_files,
                        "bytes_seen": meta.total_bytes,
                        "percent": 100,
                    }),
                );
                self.bus.publish(
                    &topic,
                    EventKind::Complete,
                    json!({
                        "snapshot_id": meta.id,
                        "total_files": meta.total_files,
                        "total_bytes": meta.total_bytes,
                        "percent": 100,
                    }),
                );
                self.registry.release_scan(&ctx.user, scan_id);
                info!(scan_id = %scan_id, files = meta.total_files, "scan completed");
                Ok(meta)
            }
            Err(ScanError::Paused) => {
                job.transition(ScanStatus::Paused, now)?;
                self.scans.write_scan(&job)?;
                // slot intentionally kept: paused still blocks admission
                self.bus.publish(
                    &topic,
                    EventKind::Phase,
                    json!({ "status": "paused", "files_seen": job.progress.files_seen }),
                );
                info!(scan_id = %scan_id, "scan paused");
                Err(ScanError::Paused)
            }
            Err(ScanError::Cancelled) => {
                job.transition(ScanStatus::Cancelled, now)?;
                self.scans.write_scan(&job)?;
                self.publish_terminal(scan_id, "cancelled", &job.progress);
                self.registry.release_scan(&ctx.user, scan_id);
                info!(scan_id = %scan_id, "scan cancelled");
                Err(ScanError::Cancelled)
            }
            Err(e) => {
                job.error = Some(e.report());
                job.transition(ScanStatus::Failed, now)?;
                self.scans.write_scan(&job)?;
                self.bus.publish(
                    &topic,
                    EventKind::Error,
                    json!({ "code": e.code(), "message": e.to_string() }),
                );
                self.registry.release_scan(&ctx.user, scan_id);
                warn!(scan_id = %scan_id, error = %e, "scan failed");
                Err(e)
            }
        }
    }

    async fn traverse(&self, ctx: &Ctx, job: &mut ScanJob) -> Result<SnapshotMeta, ScanError> {
        let scan_id = job.id.clone();
        let topic = Topic::Scan(scan_id.clone());
        let deadline_ms = job.started_at_ms.saturating_add(self.settings.deadline_ms);

        // Restore checkpointed traversal state, or seed from the root.
        let (mut queue, mut visited, mut files_seen, mut bytes_seen, mut last_seq) =
            match &job.checkpoint {
                Some(cp) => {
                    self.snapshots.buffer_truncate(&scan_id, cp.buffer_offset)?;
                    (
                        cp.queue.iter().cloned().collect::<VecDeque<_>>(),
                        cp.visited.iter().cloned().collect::<HashSet<_>>(),
                        cp.files_seen,
                        cp.bytes_seen,
                        cp.last_progress_seq,
                    )
                }
                None => (
                    VecDeque::from([QueuedFolder {
                        folder_id: FileId::new(ROOT_FOLDER),
                        depth: 0,
                    }]),
                    HashSet::new(),
                    0,
                    0,
                    0,
                ),
            };

        let seeded_estimate = self
            .snapshots
            .latest_meta_for_user(&ctx.user)?
            .map(|m| m.total_files)
            .unwrap_or(0);
        let mut branching_ema: f64 = 0.0;
        let mut folders_done: u64 = 0;
        let mut pending: Vec<FileRecord> = Vec::new();
        let mut files_since_checkpoint: u64 = 0;
        let mut last_checkpoint_ms = self.clock.epoch_ms();
        let mut last_emit_ms: u64 = 0;
        let mut last_emit_pct: u8 = 0;

        while let Some(QueuedFolder { folder_id, depth }) = queue.pop_front() {
            if ctx.cancel.is_cancelled() {
                self.checkpoint(job, &queue, &visited, &mut pending, files_seen, bytes_seen, last_seq)?;
                return Err(ScanError::Cancelled);
            }
            if self.pauses.lock().remove(&scan_id) {
                queue.push_front(QueuedFolder { folder_id, depth });
                self.checkpoint(job, &queue, &visited, &mut pending, files_seen, bytes_seen, last_seq)?;
                return Err(ScanError::Paused);
            }
            let now = self.clock.epoch_ms();
            if now > deadline_ms {
                self.checkpoint(job, &queue, &visited, &mut pending, files_seen, bytes_seen, last_seq)?;
                return Err(ScanError::DeadlineExceeded);
            }
            // cycle safety: each folder processed at most once
            if !visited.insert(folder_id.clone()) {
                continue;
            }

            // A folder commits only once its listing completed: children
            // stay in a side batch until then, so a mid-listing failure
            // re-queues the folder and replay stays idempotent.
            let mut folder_batch: Vec<FileRecord> = Vec::new();
            let mut pages = self.gateway.list_children(ctx, &folder_id);
            let mut listing_error: Option<ScanError> = None;
            while let Some(next) = pages.next().await {
                match next {
                    Ok(record) => folder_batch.push(record),
                    Err(e) => {
                        listing_error = Some(e.into());
                        break;
                    }
                }
            }
            if let Some(e) = listing_error {
                visited.remove(&folder_id);
                queue.push_front(QueuedFolder { folder_id, depth });
                self.checkpoint(job, &queue, &visited, &mut pending, files_seen, bytes_seen, last_seq)?;
                return Err(e);
            }

            let mut folder_files: u64 = 0;
            for record in folder_batch {
                if record.trashed && !job.config.include_trashed {
                    continue;
                }
                if record.is_folder() {
                    if depth + 1 <= job.config.max_depth {
                        queue.push_back(QueuedFolder {
                            folder_id: record.id.clone(),
                            depth: depth + 1,
                        });
                    }
                } else {
                    files_seen += 1;
                    folder_files += 1;
                    bytes_seen += record.size_bytes;
                }
                pending.push(record);
            }

            folders_done += 1;
            branching_ema = if folders_done == 1 {
                folder_files as f64
            } else {
                (1.0 - BRANCHING_EMA_WEIGHT) * branching_ema
                    + BRANCHING_EMA_WEIGHT * folder_files as f64
            };
            let projected = files_seen + (queue.len() as f64 * branching_ema) as u64;
            let estimate = seeded_estimate.max(projected);
            let percent = ScanProgress::running_percent(files_seen, estimate);

            let now = self.clock.epoch_ms();
            job.record_progress(files_seen, bytes_seen, percent, now);

            files_since_checkpoint += folder_files;
            if files_since_checkpoint >= self.settings.checkpoint_every_files
                || now.saturating_sub(last_checkpoint_ms) >= self.settings.checkpoint_every_ms
            {
                self.checkpoint(job, &queue, &visited, &mut pending, files_seen, bytes_seen, last_seq)?;
                files_since_checkpoint = 0;
                last_checkpoint_ms = now;
            }

            let percent_moved = percent > last_emit_pct;
            let interval_elapsed =
                now.saturating_sub(last_emit_ms) >= self.settings.progress_emit_ms;
            if files_seen > 0 && (percent_moved || interval_elapsed) {
                last_seq = self.bus.publish(
                    &topic,
                    EventKind::Progress,
                    json!({
                        "files_seen": files_seen,
                        "bytes_seen": bytes_seen,
                        "percent": job.progress.percent,
                    }),
                );
                last_emit_ms = now;
                last_emit_pct = percent;
            }
        }

        // queue drained: flush and finalize an immutable snapshot
        if !pending.is_empty() {
            self.snapshots.buffer_append(&scan_id, &pending)?;
            pending.clear();
        }
        let meta = SnapshotMeta {
            id: SnapshotId::new(self.ids.next()),
            scan_id: scan_id.clone(),
            user_key: ctx.user.clone(),
            taken_at_ms: self.clock.epoch_ms(),
            total_files: files_seen,
            total_bytes: bytes_seen,
        };
        self.snapshots.finalize(&scan_id, &meta)?;
        Ok(meta)
    }

    /// Durable point: append pending records, then persist the job with
    /// the traversal state needed to continue from here.
    #[allow(clippy::too_many_arguments)]
    fn checkpoint(
        &self,
        job: &mut ScanJob,
        queue: &VecDeque<QueuedFolder>,
        visited: &HashSet<FileId>,
        pending: &mut Vec<FileRecord>,
        files_seen: u64,
        bytes_seen: u64,
        last_progress_seq: u64,
    ) -> Result<(), ScanError> {
        let offset = if pending.is_empty() {
            self.snapshots.buffer_len(&job.id)?
        } else {
            let offset = self.snapshots.buffer_append(&job.id, pending)?;
            pending.clear();
            offset
        };
        job.checkpoint = Some(ScanCheckpoint {
            queue: queue.iter().cloned().collect(),
            visited: visited.iter().cloned().collect(),
            buffer_offset: offset,
            last_progress_seq,
            files_seen,
            bytes_seen,
        });
        self.scans.write_scan(job)?;
        Ok(())
    }

    fn publish_terminal(&self, scan_id: &ScanId, status: &str, progress: &ScanProgress) {
        self.bus.publish(
            &Topic::Scan(scan_id.clone()),
            EventKind::Error,
            json!({
                "status": status,
                "files_seen": progress.files_seen,
                "percent": progress.percent,
            }),
        );
    }

    fn read_job(&self, scan_id: &ScanId) -> Result<Option<ScanJob>, ScanError> {
        match self.scans.read_scan(scan_id) {
            Ok(job) => Ok(job),
            Err(StorageError::Corrupt { .. }) => {
                Err(ScanError::CheckpointCorrupt(scan_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod scan_tests;
