// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The check executor contract: every check kind exposes a single
//! `check(ctx) -> Result<(), Error>` operation.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use warden_core::Error;

/// Per-run context: the caller-supplied deadline and cancellation token.
#[derive(Clone)]
pub struct CheckContext {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

/// Tunables shared by every check executor that a host process may want
/// to override: how long an exec check waits after `start_kill()` before
/// force-killing, and how much failure output gets captured into
/// `details`.
#[derive(Debug, Clone, Copy)]
pub struct CheckLimits {
    pub exec_kill_grace: Duration,
    pub details_max_bytes: usize,
    pub details_max_lines: usize,
}

impl Default for CheckLimits {
    fn default() -> Self {
        Self {
            exec_kill_grace: Duration::from_secs(1),
            details_max_bytes: 512,
            details_max_lines: 5,
        }
    }
}

#[async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, ctx: &CheckContext) -> Result<(), Error>;
}

/// Race a probe future against the context's deadline and cancellation.
/// Probes with no external process to kill (HTTP, TCP) can rely on this
/// directly; exec needs its own variant so it can kill the child on the
/// losing branches.
pub async fn race<F>(ctx: &CheckContext, fut: F) -> Result<(), Error>
where
    F: std::future::Future<Output = Result<(), Error>>,
{
    tokio::select! {
        res = fut => res,
        _ = tokio::time::sleep(ctx.timeout) => Err(Error::CheckTimeout(ctx.timeout)),
        _ = ctx.cancel.cancelled() => Err(Error::Cancelled),
    }
}
