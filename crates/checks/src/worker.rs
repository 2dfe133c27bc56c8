// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Perform-check / recover-check task handler: a periodic ticker, a
//! refresh wakeup, and a cancellation token combined in one selection
//! loop.

use crate::checker::{CheckContext, Checker};
use crate::manager::{build_checker, CheckManager};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::error;
use warden_core::{ChangeId, ChangeKind, ChangeStatus, Error};
use warden_plan::CheckConfig;

pub struct Worker {
    pub manager: Arc<CheckManager>,
    pub change_id: ChangeId,
    pub kind: ChangeKind,
    pub cfg: CheckConfig,
    pub cancel: CancellationToken,
    pub refresh: Arc<tokio::sync::Notify>,
}

impl Worker {
    pub async fn run(self) {
        let checker = match build_checker(&self.cfg, &self.manager.limits()) {
            Ok(c) => c,
            Err(e) => {
                error!(check = %self.cfg.name, error = %e, "failed to build check executor");
                return;
            }
        };

        let mut ticker = tokio::time::interval(self.cfg.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.run_one(checker.as_ref()).await {
                        return;
                    }
                }
                // The periodic ticker is reset on an explicit refresh so a
                // manual probe doesn't cause back-to-back ticks.
                _ = self.refresh.notified() => {
                    ticker.reset();
                    if self.run_one(checker.as_ref()).await {
                        return;
                    }
                }
                _ = self.cancel.cancelled() => {
                    return;
                }
            }
        }
    }

    /// Runs one probe. Returns `true` if the task reached a terminal state
    /// and the worker loop should stop.
    async fn run_one(&self, checker: &dyn Checker) -> bool {
        let ctx = CheckContext { timeout: self.cfg.timeout, cancel: self.cancel.clone() };
        match checker.check(&ctx).await {
            Ok(()) => self.on_success().await,
            // Cancellation is swallowed: no failure, no log entry.
            Err(e) if e.is_cancelled() => false,
            Err(e) => self.on_failure(e).await,
        }
    }

    async fn on_success(&self) -> bool {
        let mut prior_failures = 0;
        let _ = self.state().update_task(&self.change_id, |task| {
            prior_failures = task.failures;
            task.record_success();
        });
        self.manager.update_runtime(&self.cfg.name, 0);

        if prior_failures > 0 {
            let _ = self.state().append_log(
                &self.change_id,
                format!("succeeded after {prior_failures} failure(s)"),
            );
        }

        if self.kind == ChangeKind::RecoverCheck {
            let _ = self.state().update_task(&self.change_id, |t| t.proceed = true);
            let _ = self.state().set_status(&self.change_id, ChangeStatus::Done);
            return true;
        }
        false
    }

    async fn on_failure(&self, err: Error) -> bool {
        let mut failures = 0;
        let _ = self.state().update_task(&self.change_id, |task| {
            task.record_failure();
            failures = task.failures;
        });
        self.manager.update_runtime(&self.cfg.name, failures);
        let _ = self.state().append_log(&self.change_id, err.to_string());

        if self.kind == ChangeKind::PerformCheck && failures >= self.cfg.threshold {
            let _ = self.state().update_task(&self.change_id, |t| t.proceed = true);
            self.manager.notify_failure(&self.cfg.name);
            let _ = self.state().set_status(&self.change_id, ChangeStatus::Error);
            return true;
        }

        // Below threshold in perform-check, or any failure in
        // recover-check (which never terminates on failure), is logged
        // exactly once above and otherwise changes nothing.
        false
    }

    fn state(&self) -> &warden_state::StateStore {
        self.manager.state()
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("change_id", &self.change_id)
            .field("kind", &self.kind)
            .finish()
    }
}
