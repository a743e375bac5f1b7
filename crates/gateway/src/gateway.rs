// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gateway proper: composition of credential injection, rate
//! limiting, circuit breaking, and retry around the service port.

use crate::bucket::TokenBucket;
use crate::circuit::CircuitBreaker;
use crate::ctx::Ctx;
use crate::pages::ChildPages;
use crate::retry::RetryPolicy;
use crate::service::{Page, RemoteFileService};
use crate::GatewayError;
use ds_auth::TokenStore;
use ds_core::{Clock, FileId, FileRecord, GatewaySettings, UserKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Uniform file/folder API over the remote service.
pub struct Gateway {
    service: Arc<dyn RemoteFileService>,
    tokens: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    settings: GatewaySettings,
    policy: RetryPolicy,
    buckets: Mutex<HashMap<UserKey, Arc<TokenBucket>>>,
    circuits: Mutex<HashMap<UserKey, Arc<CircuitBreaker>>>,
}

impl Gateway {
    pub fn new(
        service: Arc<dyn RemoteFileService>,
        tokens: Arc<TokenStore>,
        clock: Arc<dyn Clock>,
        settings: GatewaySettings,
    ) -> Self {
        let policy = RetryPolicy::from_settings(&settings);
        Self {
            service,
            tokens,
            clock,
            settings,
            policy,
            buckets: Mutex::new(HashMap::new()),
            circuits: Mutex::new(HashMap::new()),
        }
    }

    /// Lazy page-fused folder listing. Finite; not restartable once
    /// consumed. Callers persist [`ChildPages::resume_cursor`] themselves
    /// if they need resumption.
    pub fn list_children<'g>(&'g self, ctx: &Ctx, folder_id: &FileId) -> ChildPages<'g> {
        ChildPages::new(self, ctx.clone(), folder_id.clone())
    }

    /// Single listing page; the building block of [`Self::list_children`].
    pub async fn list_children_page(
        &self,
        ctx: &Ctx,
        folder_id: &FileId,
        cursor: Option<&str>,
    ) -> Result<Page, GatewayError> {
        self.call(ctx, "list_children", |token| {
            let service = Arc::clone(&self.service);
            let folder_id = folder_id.clone();
            let cursor = cursor.map(str::to_string);
            async move {
                service
                    .list_children(&token, &folder_id, cursor.as_deref())
                    .await
            }
        })
        .await
    }

    pub async fn get_file(&self, ctx: &Ctx, file_id: &FileId) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "get_file", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            async move { service.get_file(&token, &file_id).await }
        })
        .await
    }

    pub async fn create_folder(
        &self,
        ctx: &Ctx,
        parent_id: &FileId,
        name: &str,
    ) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "create_folder", |token| {
            let service = Arc::clone(&self.service);
            let parent_id = parent_id.clone();
            let name = name.to_string();
            async move { service.create_folder(&token, &parent_id, &name).await }
        })
        .await
    }

    pub async fn move_file(
        &self,
        ctx: &Ctx,
        file_id: &FileId,
        add_parents: &[FileId],
        remove_parents: &[FileId],
    ) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "move_file", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            let add = add_parents.to_vec();
            let remove = remove_parents.to_vec();
            async move { service.move_file(&token, &file_id, &add, &remove).await }
        })
        .await
    }

    pub async fn rename(
        &self,
        ctx: &Ctx,
        file_id: &FileId,
        new_name: &str,
    ) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "rename", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            let new_name = new_name.to_string();
            async move { service.rename(&token, &file_id, &new_name).await }
        })
        .await
    }

    pub async fn trash(&self, ctx: &Ctx, file_id: &FileId) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "trash", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            async move { service.trash(&token, &file_id).await }
        })
        .await
    }

    pub async fn untrash(&self, ctx: &Ctx, file_id: &FileId) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "untrash", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            async move { service.untrash(&token, &file_id).await }
        })
        .await
    }

    pub async fn copy(
        &self,
        ctx: &Ctx,
        file_id: &FileId,
        parent_id: &FileId,
        new_name: Option<&str>,
    ) -> Result<FileRecord, GatewayError> {
        self.call(ctx, "copy", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            let parent_id = parent_id.clone();
            let new_name = new_name.map(str::to_string);
            async move {
                service
                    .copy(&token, &file_id, &parent_id, new_name.as_deref())
                    .await
            }
        })
        .await
    }

    /// Bounded download for content hashing only.
    pub async fn download(
        &self,
        ctx: &Ctx,
        file_id: &FileId,
        byte_limit: u64,
    ) -> Result<Vec<u8>, GatewayError> {
        self.call(ctx, "download", |token| {
            let service = Arc::clone(&self.service);
            let file_id = file_id.clone();
            async move { service.download(&token, &file_id, byte_limit).await }
        })
        .await
    }

    /// The shared pipeline: cancellation, circuit, bucket, credential,
    /// deadline, classification, backoff.
    async fn call<T, F, Fut>(
        &self,
        ctx: &Ctx,
        op: &'static str,
        mut attempt_fn: F,
    ) -> Result<T, GatewayError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let circuit = self.circuit_for(&ctx.user);
        let mut attempts: u32 = 0;
        loop {
            if ctx.cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }
            if !circuit.allow(self.clock.epoch_ms()) {
                return Err(GatewayError::CircuitOpen);
            }
            self.acquire_slot(ctx).await?;

            // Credential failures never feed the circuit: the breaker
            // guards the file service, not the authorization server.
            let error = match self
                .tokens
                .with_valid(&ctx.user, |view| async move { view.access_token })
                .await
            {
                Err(e) => GatewayError::from(e),
                Ok(token) => {
                    let deadline = Duration::from_millis(self.settings.call_deadline_ms);
                    let outcome = tokio::select! {
                        _ = ctx.cancel.cancelled() => return Err(GatewayError::Cancelled),
                        result = tokio::time::timeout(deadline, attempt_fn(token)) => {
                            result.unwrap_or(Err(GatewayError::DeadlineExceeded))
                        }
                    };
                    match outcome {
                        Ok(value) => {
                            circuit.on_success();
                            return Ok(value);
                        }
                        Err(e) => {
                            if e.is_transient() {
                                circuit.on_transient_failure(self.clock.epoch_ms());
                            }
                            e
                        }
                    }
                }
            };

            if !error.is_transient() {
                return Err(error);
            }
            attempts += 1;
            if !self.policy.allows_another(attempts) {
                warn!(op, user_key = %ctx.user, attempts, error = %error, "retry budget exhausted");
                return Err(error);
            }
            let retry_after_ms = match &error {
                GatewayError::RateLimited { retry_after_ms } => *retry_after_ms,
                _ => None,
            };
            let delay = self.policy.delay_ms(attempts - 1, retry_after_ms);
            debug!(op, user_key = %ctx.user, attempt = attempts, delay_ms = delay, "transient failure, backing off");
            tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(GatewayError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            }
        }
    }

    /// Wait for a token-bucket slot. Fails fast when the wait alone would
    /// exceed the call deadline.
    async fn acquire_slot(&self, ctx: &Ctx) -> Result<(), GatewayError> {
        let bucket = self.bucket_for(&ctx.user);
        loop {
            match bucket.try_acquire() {
                Ok(()) => return Ok(()),
                Err(wait) => {
                    if wait.as_millis() as u64 > self.settings.call_deadline_ms {
                        return Err(GatewayError::RateLimited {
                            retry_after_ms: Some(wait.as_millis() as u64),
                        });
                    }
                    tokio::select! {
                        _ = ctx.cancel.cancelled() => return Err(GatewayError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }

    fn bucket_for(&self, user: &UserKey) -> Arc<TokenBucket> {
        let mut buckets = self.buckets.lock();
        buckets
            .entry(user.clone())
            .or_insert_with(|| Arc::new(TokenBucket::new(self.settings.rps)))
            .clone()
    }

    fn circuit_for(&self, user: &UserKey) -> Arc<CircuitBreaker> {
        let mut circuits = self.circuits.lock();
        circuits
            .entry(user.clone())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    self.settings.circuit_failures_to_open,
                    self.settings.circuit_failure_window_ms,
                    self.settings.circuit_cooldown_ms,
                ))
            })
            .clone()
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod gateway_tests;
