// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-operation context threaded through every engine call.

use ds_core::UserKey;
use tokio_util::sync::CancellationToken;

/// Who the operation runs as and how to stop it. Cheap to clone; child
/// contexts share the parent's cancellation token.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub user: UserKey,
    pub cancel: CancellationToken,
}

impl Ctx {
    pub fn new(user: UserKey) -> Self {
        Self {
            user,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(user: UserKey, cancel: CancellationToken) -> Self {
        Self { user, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
