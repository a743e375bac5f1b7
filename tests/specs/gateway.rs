// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: rate-limit burst absorbed by backoff.

use crate::prelude::*;
use ds_gateway::GatewayError;

#[tokio::test(start_paused = true)]
async fn rate_limit_burst_is_invisible_to_the_caller() {
    let world = World::new().await;
    for i in 0..1000 {
        world.drive.add_file("root", &format!("f{i:04}"), &format!("f{i:04}.dat"), 1);
    }
    for _ in 0..3 {
        world.drive.fail_next(
            "list_children",
            GatewayError::RateLimited {
                retry_after_ms: Some(2_000),
            },
        );
    }

    let started = tokio::time::Instant::now();
    let meta = world.scan().await;
    assert_eq!(meta.total_files, 1000);
    // three honored retry-after waits of 2s each
    assert!(started.elapsed() >= std::time::Duration::from_secs(6));
}
