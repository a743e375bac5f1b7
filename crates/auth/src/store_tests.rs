// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::provider::TokenGrant;
use crate::seal::Base64Sealer;
use async_trait::async_trait;
use ds_core::FakeClock;
use ds_storage::MemoryStorage;
use std::sync::atomic::{AtomicU32, Ordering};

/// Scripted provider: counts refreshes and can fail in configured ways.
#[derive(Default)]
struct FakeProvider {
    refreshes: AtomicU32,
    revokes: AtomicU32,
    fail_with_invalid_grant: std::sync::atomic::AtomicBool,
    fail_transient: std::sync::atomic::AtomicBool,
    /// Injected pause so concurrent callers overlap the in-flight refresh.
    refresh_delay_ms: u64,
}

#[async_trait]
impl TokenProvider for FakeProvider {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, CredentialError> {
        Ok(TokenGrant {
            access_token: format!("access-for-{code}"),
            refresh_token: Some("refresh-1".into()),
            expires_in_ms: 3_600_000,
            granted_scopes: vec!["drive".into()],
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, CredentialError> {
        if self.refresh_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.refresh_delay_ms)).await;
        }
        if self.fail_with_invalid_grant.load(Ordering::SeqCst) {
            return Err(CredentialError::Revoked("provider".into()));
        }
        if self.fail_transient.load(Ordering::SeqCst) {
            return Err(CredentialError::RefreshTransient("503".into()));
        }
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenGrant {
            access_token: format!("access-{n}"),
            refresh_token: Some(format!("refresh-{n}")),
            expires_in_ms: 3_600_000,
            granted_scopes: Vec::new(),
        })
    }

    async fn revoke(&self, _refresh_token: &str) -> Result<(), CredentialError> {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Fixture {
    store: Arc<TokenStore>,
    provider: Arc<FakeProvider>,
    clock: FakeClock,
}

fn fixture(provider: FakeProvider) -> Fixture {
    let clock = FakeClock::at(1_000_000);
    let provider = Arc::new(provider);
    let store = Arc::new(TokenStore::new(
        Arc::new(MemoryStorage::new()),
        provider.clone(),
        Arc::new(Base64Sealer),
        Arc::new(clock.clone()),
        60_000,
    ));
    Fixture {
        store,
        provider,
        clock,
    }
}

fn user() -> UserKey {
    UserKey::new("u1")
}

#[tokio::test]
async fn obtain_stores_and_get_hides_refresh_token() {
    let fx = fixture(FakeProvider::default());
    let view = fx.store.obtain(&user(), "code-1").await.unwrap();
    assert_eq!(view.access_token, "access-for-code-1");
    assert_eq!(view.last_authenticated_at_ms, 1_000_000);

    let got = fx.store.get(&user()).unwrap().unwrap();
    assert_eq!(got.access_token, "access-for-code-1");
    // AccessView has no refresh token field at all; nothing to leak
}

#[tokio::test]
async fn get_missing_is_none() {
    let fx = fixture(FakeProvider::default());
    assert!(fx.store.get(&user()).unwrap().is_none());
}

#[tokio::test]
async fn with_valid_skips_refresh_while_token_is_fresh() {
    let fx = fixture(FakeProvider::default());
    fx.store.obtain(&user(), "c").await.unwrap();
    let token = fx
        .store
        .with_valid(&user(), |view| async move { view.access_token })
        .await
        .unwrap();
    assert_eq!(token, "access-for-c");
    assert_eq!(fx.provider.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn with_valid_refreshes_inside_skew_window() {
    let fx = fixture(FakeProvider::default());
    fx.store.obtain(&user(), "c").await.unwrap();
    // 30s before expiry: inside the 60s skew window
    fx.clock.advance(3_600_000 - 30_000);
    let token = fx
        .store
        .with_valid(&user(), |view| async move { view.access_token })
        .await
        .unwrap();
    assert_eq!(token, "access-1");
    assert_eq!(fx.provider.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let fx = fixture(FakeProvider {
        refresh_delay_ms: 20,
        ..FakeProvider::default()
    });
    fx.store.obtain(&user(), "c").await.unwrap();
    fx.clock.advance(4_000_000); // well past expiry

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = fx.store.clone();
        handles.push(tokio::spawn(async move {
            store
                .with_valid(&UserKey::new("u1"), |view| async move { view.access_token })
                .await
                .unwrap()
        }));
    }
    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert_eq!(fx.provider.refreshes.load(Ordering::SeqCst), 1);
    assert!(tokens.iter().all(|t| t == "access-1"));
}

#[tokio::test]
async fn invalid_grant_marks_record_revoked() {
    let fx = fixture(FakeProvider::default());
    fx.store.obtain(&user(), "c").await.unwrap();
    fx.provider
        .fail_with_invalid_grant
        .store(true, Ordering::SeqCst);
    fx.clock.advance(4_000_000);

    let err = fx
        .store
        .with_valid(&user(), |_| async {})
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::Revoked(_)));

    // the revocation is sticky even after the provider recovers
    fx.provider
        .fail_with_invalid_grant
        .store(false, Ordering::SeqCst);
    let err = fx.store.with_valid(&user(), |_| async {}).await.unwrap_err();
    assert!(matches!(err, CredentialError::Revoked(_)));
}

#[tokio::test]
async fn transient_refresh_failure_is_retryable_and_not_sticky() {
    let fx = fixture(FakeProvider::default());
    fx.store.obtain(&user(), "c").await.unwrap();
    fx.provider.fail_transient.store(true, Ordering::SeqCst);
    fx.clock.advance(4_000_000);

    let err = fx.store.with_valid(&user(), |_| async {}).await.unwrap_err();
    assert!(matches!(err, CredentialError::RefreshTransient(_)));

    fx.provider.fail_transient.store(false, Ordering::SeqCst);
    let token = fx
        .store
        .with_valid(&user(), |view| async move { view.access_token })
        .await
        .unwrap();
    assert_eq!(token, "access-1");
}

#[tokio::test]
async fn revoke_marks_and_calls_provider() {
    let fx = fixture(FakeProvider::default());
    fx.store.obtain(&user(), "c").await.unwrap();
    fx.store.revoke(&user()).await.unwrap();
    assert_eq!(fx.provider.revokes.load(Ordering::SeqCst), 1);

    let err = fx.store.get(&user()).unwrap_err();
    assert!(matches!(err, CredentialError::Revoked(_)));
    // idempotent
    fx.store.revoke(&user()).await.unwrap();
    assert_eq!(fx.provider.revokes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refresh_does_not_move_interactive_auth_timestamp() {
    let fx = fixture(FakeProvider::default());
    fx.store.obtain(&user(), "c").await.unwrap();
    fx.clock.advance(4_000_000);
    fx.store.refresh(&user()).await.unwrap();
    assert_eq!(
        fx.store.last_authenticated_at_ms(&user()).unwrap(),
        1_000_000
    );
}

#[tokio::test]
async fn missing_credential_is_reported() {
    let fx = fixture(FakeProvider::default());
    let err = fx.store.with_valid(&user(), |_| async {}).await.unwrap_err();
    assert!(matches!(err, CredentialError::Missing(_)));
}
