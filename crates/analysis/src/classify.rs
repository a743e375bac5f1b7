// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional classification oracle.
//!
//! An external classifier can refine the category a file is organized
//! under. It sits behind a trait with a hard timeout; on timeout or error
//! the analyzer falls back to the deterministic mime-derived categories,
//! so the core never depends on the oracle being up.

use async_trait::async_trait;
use ds_core::{FileId, FileRecord, MimeCategory};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Oracle failure; always recoverable via the fallback.
#[derive(Debug, Error)]
#[error("classifier error: {0}")]
pub struct ClassifyError(pub String);

/// External classification service.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        files: &[FileRecord],
    ) -> Result<HashMap<FileId, MimeCategory>, ClassifyError>;
}

/// Deterministic fallback: every file keeps its mime-derived category.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeClassifier;

#[async_trait]
impl Classifier for MimeClassifier {
    async fn classify(
        &self,
        files: &[FileRecord],
    ) -> Result<HashMap<FileId, MimeCategory>, ClassifyError> {
        Ok(files
            .iter()
            .map(|f| (f.id.clone(), f.mime))
            .collect())
    }
}

/// Oracle with timeout and fallback baked in.
pub struct ClassifierHandle {
    oracle: Option<Arc<dyn Classifier>>,
    timeout: Duration,
}

impl Default for ClassifierHandle {
    /// No oracle: straight to the fallback.
    fn default() -> Self {
        Self {
            oracle: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClassifierHandle {
    pub fn new(oracle: Arc<dyn Classifier>, timeout: Duration) -> Self {
        Self {
            oracle: Some(oracle),
            timeout,
        }
    }

    /// Classify through the oracle when configured; any timeout, error, or
    /// missing entry falls back to the file's own mime category.
    pub async fn classify(&self, files: &[FileRecord]) -> HashMap<FileId, MimeCategory> {
        let mut categories: HashMap<FileId, MimeCategory> =
            files.iter().map(|f| (f.id.clone(), f.mime)).collect();

        let Some(oracle) = &self.oracle else {
            return categories;
        };
        match tokio::time::timeout(self.timeout, oracle.classify(files)).await {
            Ok(Ok(labels)) => {
                for (file_id, category) in labels {
                    categories.insert(file_id, category);
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "classifier failed, using mime fallback");
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "classifier timed out, using mime fallback");
            }
        }
        categories
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod classify_tests;
