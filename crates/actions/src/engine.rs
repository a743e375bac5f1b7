// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The action engine.
//!
//! `submit` validates and approves a batch; `execute` runs it (preview or
//! immediate); `restore` undoes successful operations while the rollback
//! plan is inside its retention window. Folder creations run first in
//! dependency order so later proposals can target folders that did not
//! exist at submission time.

use crate::error::ActionError;
use crate::preflight::{preflight, PreflightDecision};
use ds_auth::TokenStore;
use ds_core::{
    ActionBatch, ActionSettings, BatchId, BatchStatus, Clock, ErrorCode, ErrorReport, EventKind,
    ExecutionResult, FileId, FolderRef, IdGen, OutcomeStatus, Proposal, ProposalId, ProposalKind,
    RestoreLog, RollbackEntry, RollbackPlan, SafetyLevel, Topic, UuidIdGen,
};
use ds_engine::{EventBus, JobRegistry};
use ds_gateway::{Ctx, Gateway, GatewayError};
use ds_storage::BatchStore;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Name of the synthetic archive folder, created on demand per batch.
const ARCHIVE_FOLDER_NAME: &str = "Archive";

/// What a caller submits; the engine assigns the batch id.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub proposals: Vec<Proposal>,
    pub safety_level: SafetyLevel,
    pub continue_on_error: bool,
    pub max_concurrency: usize,
}

/// Execution mode of [`ActionEngine::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    /// Preflight only, bounded item count, no remote mutation.
    Preview,
    /// Full run.
    Immediate,
}

/// Projected outcome of one proposal under preview.
#[derive(Debug, Clone)]
pub struct PreviewResult {
    pub proposal_id: ProposalId,
    pub file_id: FileId,
    pub projected: OutcomeStatus,
    pub warnings: Vec<String>,
    pub skip_reason: Option<String>,
    pub error: Option<ErrorReport>,
}

/// Result of [`ActionEngine::execute`].
#[derive(Debug)]
pub enum ExecuteOutcome {
    Preview(Vec<PreviewResult>),
    Executed(ActionBatch),
}

/// Executes approved batches for all users.
pub struct ActionEngine<G: IdGen = UuidIdGen> {
    gateway: Arc<Gateway>,
    tokens: Arc<TokenStore>,
    batches: Arc<dyn BatchStore>,
    registry: Arc<JobRegistry>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    ids: G,
    settings: ActionSettings,
    fresh_window_ms: u64,
}

impl<G: IdGen> ActionEngine<G> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<Gateway>,
        tokens: Arc<TokenStore>,
        batches: Arc<dyn BatchStore>,
        registry: Arc<JobRegistry>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        ids: G,
        settings: ActionSettings,
        fresh_window_ms: u64,
    ) -> Self {
        Self {
            gateway,
            tokens,
            batches,
            registry,
            bus,
            clock,
            ids,
            settings,
            fresh_window_ms,
        }
    }

    /// Validate and persist a batch: draft, then approved.
    pub fn submit(&self, ctx: &Ctx, request: BatchRequest) -> Result<BatchId, ActionError> {
        validate_request(&request)?;
        let batch_id = BatchId::new(self.ids.next());
        let mut batch = ActionBatch::new(
            batch_id.clone(),
            ctx.user.clone(),
            request.proposals,
            request.safety_level,
            request.continue_on_error,
            request.max_concurrency,
            &self.clock,
        );
        batch.transition(BatchStatus::Approved)?;
        self.batches.write_batch(&batch)?;
        info!(user_key = %ctx.user, batch_id = %batch_id, proposals = batch.proposals.len(), "batch approved");
        Ok(batch_id)
    }

    pub fn get_status(&self, batch_id: &BatchId) -> Result<ActionBatch, ActionError> {
        self.batches
            .read_batch(batch_id)?
            .ok_or_else(|| ActionError::NotFound(batch_id.to_string()))
    }

    pub async fn execute(
        &self,
        ctx: &Ctx,
        batch_id: &BatchId,
        mode: ExecuteMode,
    ) -> Result<ExecuteOutcome, ActionError> {
        match mode {
            ExecuteMode::Preview => Ok(ExecuteOutcome::Preview(self.preview(ctx, batch_id).await?)),
            ExecuteMode::Immediate => {
                Ok(ExecuteOutcome::Executed(self.run(ctx, batch_id).await?))
            }
        }
    }

    /// Safety preflight over the first `preview_limit` proposals. No
    /// remote mutation; the batch stays approved.
    async fn preview(
        &self,
        ctx: &Ctx,
        batch_id: &BatchId,
    ) -> Result<Vec<PreviewResult>, ActionError> {
        let batch = self.owned_batch(ctx, batch_id)?;
        if batch.status != BatchStatus::Approved {
            return Err(ActionError::State(ds_core::BatchTransitionError {
                from: batch.status,
                to: BatchStatus::Executing,
            }));
        }

        let mut previews = Vec::new();
        for proposal in batch.proposals.iter().take(self.settings.preview_limit) {
            if matches!(proposal.kind, ProposalKind::CreateFolder { .. }) {
                previews.push(PreviewResult {
                    proposal_id: proposal.id.clone(),
                    file_id: proposal.file_id.clone(),
                    projected: OutcomeStatus::Success,
                    warnings: Vec::new(),
                    skip_reason: None,
                    error: None,
                });
                continue;
            }
            let preview = match self.gateway.get_file(ctx, &proposal.file_id).await {
                Err(e) => PreviewResult {
                    proposal_id: proposal.id.clone(),
                    file_id: proposal.file_id.clone(),
                    projected: OutcomeStatus::Failed,
                    warnings: Vec::new(),
                    skip_reason: None,
                    error: Some(e.report()),
                },
                Ok(record) => match preflight(&record, &proposal.kind, batch.safety_level) {
                    PreflightDecision::Skip(reason) => PreviewResult {
                        proposal_id: proposal.id.clone(),
                        file_id: proposal.file_id.clone(),
                        projected: OutcomeStatus::Skipped,
                        warnings: Vec::new(),
                        skip_reason: Some(reason),
                        error: None,
                    },
                    decision => PreviewResult {
                        proposal_id: proposal.id.clone(),
                        file_id: proposal.file_id.clone(),
                        projected: OutcomeStatus::Success,
                        warnings: decision.warnings(),
                        skip_reason: None,
                        error: None,
                    },
                },
            };
            previews.push(preview);
        }
        Ok(previews)
    }

    /// Full execution, at most one per user at a time.
    async fn run(&self, ctx: &Ctx, batch_id: &BatchId) -> Result<ActionBatch, ActionError> {
        let mut batch = self.owned_batch(ctx, batch_id)?;
        self.registry.admit_batch(&ctx.user, batch_id)?;
        if let Err(e) = batch.transition(BatchStatus::Executing) {
            self.registry.release_batch(&ctx.user, batch_id);
            return Err(e.into());
        }
        self.batches.write_batch(&batch)?;

        let outcome = self.drive(ctx, &mut batch).await;
        self.registry.release_batch(&ctx.user, batch_id);
        outcome?;
        self.batches.write_batch(&batch)?;
        Ok(batch)
    }

    /// Execute every proposal, filling results and the rollback plan, and
    /// settle the final status. Infra failures (storage) abort; remote
    /// failures become per-proposal results.
    async fn drive(&self, ctx: &Ctx, batch: &mut ActionBatch) -> Result<(), ActionError> {
        let topic = Topic::Action(batch.id.clone());
        let total = batch.proposals.len();
        let safety = batch.safety_level;
        let deadline_ms = self.clock.epoch_ms() + self.settings.deadline_ms;
        let (create_order, rest_order) = plan_order(&batch.proposals);

        let mut results: Vec<Option<ExecutionResult>> = vec![None; total];
        let mut entries: Vec<RollbackEntry> = Vec::new();
        let mut created: HashMap<ProposalId, FileId> = HashMap::new();
        let mut halted = false;

        // Folder creations first, sequential, dependency-ordered.
        for index in create_order {
            if halted {
                break;
            }
            if ctx.is_cancelled() || self.clock.epoch_ms() > deadline_ms {
                halted = true;
                break;
            }
            let proposal = batch.proposals[index].clone();
            let (result, entry) = self.execute_one(ctx, &proposal, safety, &created, None).await;
            if result.status == OutcomeStatus::Success {
                if let Some(RollbackEntry::Created { file_id }) = &entry {
                    created.insert(proposal.id.clone(), file_id.clone());
                }
            } else if result.status == OutcomeStatus::Failed && !batch.continue_on_error {
                halted = true;
            }
            entries.extend(entry);
            results[index] = Some(result);
        }

        // The archive folder is shared by every archive proposal in the
        // batch; create it before the parallel waves so waves stay
        // read-only over shared state.
        let needs_archive = !halted
            && rest_order
                .iter()
                .any(|&i| matches!(batch.proposals[i].kind, ProposalKind::Archive));
        let archive_folder: Option<FileId> = if needs_archive {
            match self
                .gateway
                .create_folder(ctx, &FileId::new("root"), ARCHIVE_FOLDER_NAME)
                .await
            {
                Ok(folder) => Some(folder.id),
                Err(e) => {
                    warn!(error = %e, "archive folder creation failed");
                    None
                }
            }
        } else {
            None
        };

        let wave_size = batch
            .max_concurrency
            .min(ActionSettings::CONCURRENCY_CAP)
            .max(1);
        let mut completed = results.iter().flatten().count();

        for wave in rest_order.chunks(wave_size) {
            if halted || ctx.is_cancelled() || self.clock.epoch_ms() > deadline_ms {
                halted = true;
                break;
            }

            let wave_futures = wave.iter().map(|&index| {
                let proposal = batch.proposals[index].clone();
                let created = &created;
                let archive = archive_folder.clone();
                async move {
                    let (result, entry) = self
                        .execute_one(ctx, &proposal, safety, created, archive.as_ref())
                        .await;
                    (index, result, entry)
                }
            });
            let wave_results = futures::future::join_all(wave_futures).await;

            for (index, result, entry) in wave_results {
                if result.status == OutcomeStatus::Failed && !batch.continue_on_error {
                    halted = true;
                }
                entries.extend(entry);
                completed += 1;
                results[index] = Some(result);
            }

            self.bus.publish(
                &topic,
                EventKind::Progress,
                json!({
                    "completed": completed,
                    "total": total,
                    "percent": (100 * completed / total.max(1)).min(100),
                }),
            );

            // cooldown between waves, skipped after the last one
            if completed < total && !halted {
                tokio::select! {
                    _ = ctx.cancel.cancelled() => halted = true,
                    _ = tokio::time::sleep(Duration::from_millis(
                        self.settings.inter_batch_cooldown_ms,
                    )) => {}
                }
            }
        }

        // anything left unexecuted was cancelled by a halt
        batch.results = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.unwrap_or_else(|| {
                    ExecutionResult::cancelled(
                        batch.proposals[index].id.clone(),
                        batch.proposals[index].file_id.clone(),
                    )
                })
            })
            .collect();

        let now = self.clock.epoch_ms();
        batch.executed_at_ms = Some(now);
        batch.rollback = Some(RollbackPlan {
            entries,
            expires_at_ms: now + self.settings.retention_ms(),
        });

        let final_status = if halted {
            BatchStatus::Failed
        } else {
            BatchStatus::Executed
        };
        batch.transition(final_status)?;

        let failures = batch.failure_count();
        self.bus.publish(
            &topic,
            if halted { EventKind::Error } else { EventKind::Complete },
            json!({
                "status": batch.status,
                "failures": failures,
                "total": total,
            }),
        );
        info!(batch_id = %batch.id, status = %batch.status, failures, "batch finished");
        Ok(())
    }

    /// Execute a single proposal against its live remote state.
    async fn execute_one(
        &self,
        ctx: &Ctx,
        proposal: &Proposal,
        safety: SafetyLevel,
        created: &HashMap<ProposalId, FileId>,
        archive_folder: Option<&FileId>,
    ) -> (ExecutionResult, Option<RollbackEntry>) {
        // create_folder has no live subject file to fetch
        if let ProposalKind::CreateFolder { parent, name } = &proposal.kind {
            let Some(parent_id) = resolve_folder(parent, created) else {
                return (self.dependency_missing(proposal), None);
            };
            return match self.gateway.create_folder(ctx, &parent_id, name).await {
                Ok(folder) => (
                    ExecutionResult::success(proposal.id.clone(), proposal.file_id.clone()),
                    Some(RollbackEntry::Created { file_id: folder.id }),
                ),
                Err(e) => (self.remote_failure(proposal, e), None),
            };
        }

        let record = match self.gateway.get_file(ctx, &proposal.file_id).await {
            Ok(record) => record,
            Err(e) => return (self.remote_failure(proposal, e), None),
        };
        let warnings = match preflight(&record, &proposal.kind, safety) {
            PreflightDecision::Skip(reason) => {
                return (
                    ExecutionResult::skipped(proposal.id.clone(), proposal.file_id.clone(), reason),
                    None,
                )
            }
            decision => decision.warnings(),
        };

        let outcome: Result<RollbackEntry, GatewayError> = match &proposal.kind {
            ProposalKind::Move { destination } => {
                let Some(dest) = resolve_folder(destination, created) else {
                    return (self.dependency_missing(proposal), None);
                };
                let previous = record.parent_ids.clone();
                self.gateway
                    .move_file(ctx, &proposal.file_id, &[dest], &previous)
                    .await
                    .map(|_| RollbackEntry::Move {
                        file_id: proposal.file_id.clone(),
                        previous_parents: previous,
                    })
            }
            ProposalKind::Rename { new_name } => self
                .gateway
                .rename(ctx, &proposal.file_id, new_name)
                .await
                .map(|_| RollbackEntry::Rename {
                    file_id: proposal.file_id.clone(),
                    previous_name: record.name.clone(),
                }),
            ProposalKind::Trash => self
                .gateway
                .trash(ctx, &proposal.file_id)
                .await
                .map(|_| RollbackEntry::Trash {
                    file_id: proposal.file_id.clone(),
                    previous_parents: record.parent_ids.clone(),
                }),
            ProposalKind::Archive => {
                let Some(archive) = archive_folder else {
                    return (self.dependency_missing(proposal), None);
                };
                let previous = record.parent_ids.clone();
                self.gateway
                    .move_file(ctx, &proposal.file_id, &[archive.clone()], &previous)
                    .await
                    .map(|_| RollbackEntry::Archive {
                        file_id: proposal.file_id.clone(),
                        previous_parents: previous,
                        archive_folder: archive.clone(),
                    })
            }
            ProposalKind::Copy {
                destination,
                new_name,
            } => {
                let Some(dest) = resolve_folder(destination, created) else {
                    return (self.dependency_missing(proposal), None);
                };
                self.gateway
                    .copy(ctx, &proposal.file_id, &dest, new_name.as_deref())
                    .await
                    .map(|copy| RollbackEntry::Created { file_id: copy.id })
            }
            // handled by the early return above; kept total for the match
            ProposalKind::CreateFolder { .. } => {
                return (self.dependency_missing(proposal), None)
            }
        };

        match outcome {
            Ok(entry) => (
                ExecutionResult::success(proposal.id.clone(), proposal.file_id.clone())
                    .with_warnings(warnings),
                Some(entry),
            ),
            Err(e) => (self.remote_failure(proposal, e), None),
        }
    }

    /// Undo successful operations of an executed or failed batch.
    pub async fn restore(
        &self,
        ctx: &Ctx,
        batch_id: &BatchId,
        subset: Option<&[FileId]>,
    ) -> Result<Vec<RestoreLog>, ActionError> {
        let mut batch = self.owned_batch(ctx, batch_id)?;
        let plan = batch
            .rollback
            .clone()
            .ok_or(ActionError::NoRollbackPlan)?;

        let now = self.clock.epoch_ms();
        if plan.is_expired(now) {
            if batch.status.has_rollback_plan() {
                batch.transition(BatchStatus::Expired)?;
                self.batches.write_batch(&batch)?;
            }
            return Err(ActionError::RestoreExpired);
        }

        let last_auth = self.tokens.last_authenticated_at_ms(&ctx.user)?;
        if now.saturating_sub(last_auth) > self.fresh_window_ms {
            return Err(ActionError::FreshAuthRequired);
        }

        let mut logs = Vec::new();
        for entry in &plan.entries {
            if let Some(subset) = subset {
                if !subset.contains(entry.file_id()) {
                    continue;
                }
            }
            logs.push(self.restore_entry(ctx, entry).await);
        }

        let full_restore = subset.is_none();
        let clean = logs.iter().all(|l| l.status == OutcomeStatus::Success);
        if full_restore && clean && batch.status.has_rollback_plan() {
            batch.transition(BatchStatus::RolledBack)?;
            self.batches.write_batch(&batch)?;
        }
        info!(batch_id = %batch_id, entries = logs.len(), clean, "restore finished");
        Ok(logs)
    }

    /// Undo one rollback entry. Idempotent: re-running after success finds
    /// the pre-state already in place and no-ops.
    async fn restore_entry(&self, ctx: &Ctx, entry: &RollbackEntry) -> RestoreLog {
        match entry {
            RollbackEntry::Move {
                file_id,
                previous_parents,
            }
            | RollbackEntry::Archive {
                file_id,
                previous_parents,
                ..
            } => self.reparent(ctx, entry, file_id, previous_parents).await,
            RollbackEntry::Trash {
                file_id,
                previous_parents,
            } => {
                if let Err(e) = self.gateway.untrash(ctx, file_id).await {
                    return self.failed_log(entry, file_id, e.report());
                }
                self.reparent(ctx, entry, file_id, previous_parents).await
            }
            RollbackEntry::Rename {
                file_id,
                previous_name,
            } => {
                let current = match self.gateway.get_file(ctx, file_id).await {
                    Ok(record) => record,
                    Err(e) => return self.failed_log(entry, file_id, e.report()),
                };
                if current.name == *previous_name {
                    return self.success_log(entry, file_id, &current.name, previous_name);
                }
                match self.gateway.rename(ctx, file_id, previous_name).await {
                    Ok(_) => self.success_log(entry, file_id, &current.name, previous_name),
                    Err(e) => self.failed_log(entry, file_id, e.report()),
                }
            }
            RollbackEntry::Created { file_id } => {
                match self.gateway.trash(ctx, file_id).await {
                    Ok(_) => self.success_log(entry, file_id, file_id.as_str(), "trash"),
                    // already gone: nothing left to undo
                    Err(GatewayError::NotFound(_)) => {
                        self.success_log(entry, file_id, file_id.as_str(), "trash")
                    }
                    Err(e) => self.failed_log(entry, file_id, e.report()),
                }
            }
        }
    }

    /// Move a file back to its recorded parents, filtering out parents
    /// that no longer exist. When none survive, the entry fails with
    /// `DependencyMissing` rather than silently re-homing the file.
    async fn reparent(
        &self,
        ctx: &Ctx,
        entry: &RollbackEntry,
        file_id: &FileId,
        previous_parents: &[FileId],
    ) -> RestoreLog {
        let current = match self.gateway.get_file(ctx, file_id).await {
            Ok(record) => record,
            Err(e) => return self.failed_log(entry, file_id, e.report()),
        };

        let current_set: HashSet<&FileId> = current.parent_ids.iter().collect();
        let previous_set: HashSet<&FileId> = previous_parents.iter().collect();
        if current_set == previous_set {
            // repeat restore: already in place
            return self.success_log(
                entry,
                file_id,
                &join_ids(&current.parent_ids),
                &join_ids(previous_parents),
            );
        }

        let mut live_previous = Vec::new();
        for parent in previous_parents {
            if self.gateway.get_file(ctx, parent).await.is_ok() {
                live_previous.push(parent.clone());
            }
        }
        if live_previous.is_empty() {
            return self.failed_log(
                entry,
                file_id,
                ErrorReport::new(
                    ErrorCode::DependencyMissing,
                    "no previous parent still exists",
                ),
            );
        }

        let remove: Vec<FileId> = current
            .parent_ids
            .iter()
            .filter(|p| !live_previous.contains(p))
            .cloned()
            .collect();
        match self
            .gateway
            .move_file(ctx, file_id, &live_previous, &remove)
            .await
        {
            Ok(_) => self.success_log(
                entry,
                file_id,
                &join_ids(&current.parent_ids),
                &join_ids(&live_previous),
            ),
            Err(e) => self.failed_log(entry, file_id, e.report()),
        }
    }

    fn owned_batch(&self, ctx: &Ctx, batch_id: &BatchId) -> Result<ActionBatch, ActionError> {
        let batch = self.get_status(batch_id)?;
        if batch.user_key != ctx.user {
            return Err(ActionError::Validation {
                field: "batch_id".into(),
                message: "batch belongs to a different user".into(),
            });
        }
        Ok(batch)
    }

    fn remote_failure(&self, proposal: &Proposal, error: GatewayError) -> ExecutionResult {
        ExecutionResult::failed(
            proposal.id.clone(),
            proposal.file_id.clone(),
            error.report(),
        )
    }

    fn dependency_missing(&self, proposal: &Proposal) -> ExecutionResult {
        ExecutionResult::failed(
            proposal.id.clone(),
            proposal.file_id.clone(),
            ErrorReport::new(
                ErrorCode::DependencyMissing,
                "target folder was not created",
            ),
        )
    }

    fn success_log(
        &self,
        entry: &RollbackEntry,
        file_id: &FileId,
        from: &str,
        to: &str,
    ) -> RestoreLog {
        RestoreLog {
            file_id: file_id.clone(),
            op: entry_op(entry).to_string(),
            from: from.to_string(),
            to: to.to_string(),
            status: OutcomeStatus::Success,
            error: None,
        }
    }

    fn failed_log(&self, entry: &RollbackEntry, file_id: &FileId, error: ErrorReport) -> RestoreLog {
        RestoreLog {
            file_id: file_id.clone(),
            op: entry_op(entry).to_string(),
            from: String::new(),
            to: String::new(),
            status: OutcomeStatus::Failed,
            error: Some(error),
        }
    }
}

fn entry_op(entry: &RollbackEntry) -> &'static str {
    match entry {
        RollbackEntry::Move { .. } => "move",
        RollbackEntry::Rename { .. } => "rename",
        RollbackEntry::Trash { .. } => "trash",
        RollbackEntry::Archive { .. } => "archive",
        RollbackEntry::Created { .. } => "created",
    }
}

fn join_ids(ids: &[FileId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn resolve_folder(reference: &FolderRef, created: &HashMap<ProposalId, FileId>) -> Option<FileId> {
    match reference {
        FolderRef::Existing { id } => Some(id.clone()),
        FolderRef::Pending { proposal } => created.get(proposal).cloned(),
    }
}

/// Creation proposals in dependency order, then everything else in
/// submission order. A creation whose pending parent never resolves sorts
/// last and fails with `DependencyMissing` at execution.
fn plan_order(proposals: &[Proposal]) -> (Vec<usize>, Vec<usize>) {
    let creates: Vec<usize> = proposals
        .iter()
        .enumerate()
        .filter(|(_, p)| matches!(p.kind, ProposalKind::CreateFolder { .. }))
        .map(|(i, _)| i)
        .collect();
    let rest: Vec<usize> = proposals
        .iter()
        .enumerate()
        .filter(|(_, p)| !matches!(p.kind, ProposalKind::CreateFolder { .. }))
        .map(|(i, _)| i)
        .collect();

    let mut placed: HashSet<&ProposalId> = HashSet::new();
    let mut ordered: Vec<usize> = Vec::with_capacity(creates.len());
    let mut pending = creates;
    while !pending.is_empty() {
        let mut progressed = false;
        pending.retain(|&index| {
            let ready = match proposals[index].kind.pending_dependency() {
                Some(dependency) => placed.contains(dependency),
                None => true,
            };
            if ready {
                placed.insert(&proposals[index].id);
                ordered.push(index);
                progressed = true;
            }
            !ready
        });
        if !progressed {
            // unresolvable dependencies (cycle or dangling): run them
            // last so they fail with a structured error
            ordered.extend(pending.iter().copied());
            break;
        }
    }
    (ordered, rest)
}

fn validate_request(request: &BatchRequest) -> Result<(), ActionError> {
    if request.proposals.is_empty() {
        return Err(ActionError::Validation {
            field: "proposals".into(),
            message: "batch must contain at least one proposal".into(),
        });
    }
    if request.max_concurrency == 0 {
        return Err(ActionError::Validation {
            field: "max_concurrency".into(),
            message: "must be at least 1".into(),
        });
    }

    let mut ids: HashSet<&ProposalId> = HashSet::new();
    for proposal in &request.proposals {
        if !ids.insert(&proposal.id) {
            return Err(ActionError::Validation {
                field: "proposals".into(),
                message: format!("duplicate proposal id {}", proposal.id),
            });
        }
    }

    let folder_ids: HashSet<&ProposalId> = request
        .proposals
        .iter()
        .filter(|p| matches!(p.kind, ProposalKind::CreateFolder { .. }))
        .map(|p| &p.id)
        .collect();
    for proposal in &request.proposals {
        match &proposal.kind {
            ProposalKind::Rename { new_name } if new_name.trim().is_empty() => {
                return Err(ActionError::Validation {
                    field: "new_name".into(),
                    message: "rename target must not be empty".into(),
                });
            }
            ProposalKind::CreateFolder { name, .. } if name.trim().is_empty() => {
                return Err(ActionError::Validation {
                    field: "name".into(),
                    message: "folder name must not be empty".into(),
                });
            }
            _ => {}
        }
        if let Some(dependency) = proposal.kind.pending_dependency() {
            if !folder_ids.contains(dependency) {
                return Err(ActionError::Validation {
                    field: "destination".into(),
                    message: format!(
                        "pending reference {dependency} does not name a create_folder proposal"
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
