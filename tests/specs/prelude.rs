// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: the full component stack over an in-memory remote.

use ds_actions::ActionEngine;
use ds_analysis::{ClassifierHandle, DuplicateEngine, OrganizationAnalyzer};
use ds_auth::testing::StaticTokenProvider;
use ds_auth::{Base64Sealer, TokenStore};
use ds_core::{
    ActionSettings, Config, FakeClock, FileRecord, ScanConfig, SeqIdGen, SnapshotMeta, UserKey,
};
use ds_engine::{EventBus, JobRegistry, ScanEngine};
use ds_gateway::testing::FakeDrive;
use ds_gateway::{Ctx, Gateway};
use ds_storage::{MemoryStorage, SnapshotStore};
use std::sync::Arc;

pub const USER: &str = "u1";

/// Everything assembled, sharing one storage, clock, bus, and registry.
pub struct World {
    pub drive: Arc<FakeDrive>,
    pub storage: Arc<MemoryStorage>,
    pub bus: Arc<EventBus>,
    pub clock: FakeClock,
    pub scans: ScanEngine<SeqIdGen>,
    pub duplicates: DuplicateEngine<SeqIdGen>,
    pub organizer: OrganizationAnalyzer<SeqIdGen>,
    pub actions: ActionEngine<SeqIdGen>,
}

impl World {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let clock = FakeClock::at(1_000_000_000);
        let storage = Arc::new(MemoryStorage::new());
        let tokens = Arc::new(TokenStore::new(
            storage.clone(),
            Arc::new(StaticTokenProvider),
            Arc::new(Base64Sealer),
            Arc::new(clock.clone()),
            config.token.refresh_skew_ms,
        ));
        tokens.obtain(&UserKey::new(USER), "seed").await.unwrap();

        let drive = Arc::new(FakeDrive::default());
        let gateway = Arc::new(Gateway::new(
            drive.clone(),
            tokens.clone(),
            Arc::new(clock.clone()),
            config.gateway.clone(),
        ));
        let bus = Arc::new(EventBus::default());
        let registry = Arc::new(JobRegistry::new());

        let scans = ScanEngine::new(
            gateway.clone(),
            storage.clone(),
            storage.clone(),
            registry.clone(),
            bus.clone(),
            Arc::new(clock.clone()),
            SeqIdGen::new("scan"),
            config.scan.clone(),
        );
        let duplicates = DuplicateEngine::new(
            gateway.clone(),
            Arc::new(clock.clone()),
            SeqIdGen::new("group"),
            config.dup.clone(),
        );
        let organizer = OrganizationAnalyzer::new(ClassifierHandle::default(), SeqIdGen::new("prop"));
        let actions = ActionEngine::new(
            gateway,
            tokens.clone(),
            storage.clone(),
            registry,
            bus.clone(),
            Arc::new(clock.clone()),
            SeqIdGen::new("batch"),
            ActionSettings {
                inter_batch_cooldown_ms: 0,
                ..config.action.clone()
            },
            config.auth.fresh_window_ms,
        );

        Self {
            drive,
            storage,
            bus,
            clock,
            scans,
            duplicates,
            organizer,
            actions,
        }
    }

    pub fn ctx(&self) -> Ctx {
        Ctx::new(UserKey::new(USER))
    }

    /// Start and run a scan to completion, returning the snapshot meta.
    pub async fn scan(&self) -> SnapshotMeta {
        let ctx = self.ctx();
        let scan_id = self
            .scans
            .start(&ctx, ScanConfig { max_depth: 10, ..Default::default() })
            .unwrap();
        self.scans.run(&ctx, &scan_id).await.unwrap()
    }

    /// All records of a finalized snapshot.
    pub fn snapshot_records(&self, meta: &SnapshotMeta) -> Vec<FileRecord> {
        self.storage
            .read_records(&meta.id)
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }
}
