// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The check lifecycle manager: drives plan reconciliation, owns each
//! check's runtime state, and spawns/aborts the worker task behind it.

use crate::checker::{CheckContext, CheckLimits, Checker};
use crate::exec::ExecChecker;
use crate::http::HttpChecker;
use crate::resolve::resolve;
use crate::snapshot::{derive_status, CheckSnapshot};
use crate::tcp::TcpChecker;
use crate::worker::Worker;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_core::{ChangeId, ChangeKind, ChangeStatus, CheckDetails, CheckStatus, Error};
use warden_plan::{CheckConfig, CheckKind, Plan, Startup};
use warden_state::StateStore;

pub type FailureHandler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
struct CheckRuntime {
    cfg: CheckConfig,
    failures: u32,
    change_id: Option<ChangeId>,
}

struct WorkerHandle {
    cancel: CancellationToken,
    refresh: Arc<tokio::sync::Notify>,
    join: tokio::task::JoinHandle<()>,
}

/// Owns check runtime state and drives plan reconciliation. Holds the
/// state store's coarse lock (via [`StateStore`]'s own API) and a
/// fine-grained lock over the `name -> snapshot` map; callers must never
/// call into the state store while holding the checks-map lock.
pub struct CheckManager {
    state: Arc<StateStore>,
    limits: CheckLimits,
    checks: Mutex<HashMap<String, CheckRuntime>>,
    configs: Mutex<HashMap<ChangeId, CheckConfig>>,
    handlers: Mutex<Vec<FailureHandler>>,
    workers: Mutex<HashMap<ChangeId, WorkerHandle>>,
    self_ref: Mutex<Weak<CheckManager>>,
}

impl CheckManager {
    pub fn new(state: Arc<StateStore>) -> Arc<Self> {
        Self::with_limits(state, CheckLimits::default())
    }

    pub fn with_limits(state: Arc<StateStore>, limits: CheckLimits) -> Arc<Self> {
        let manager = Arc::new_cyclic(|weak: &Weak<CheckManager>| {
            let weak_for_listener = weak.clone();
            state.on_terminal_transition(Arc::new(move |change| {
                if let Some(manager) = weak_for_listener.upgrade() {
                    manager.on_terminal_transition(change);
                }
            }));
            CheckManager {
                state: state.clone(),
                limits,
                checks: Mutex::new(HashMap::new()),
                configs: Mutex::new(HashMap::new()),
                handlers: Mutex::new(Vec::new()),
                workers: Mutex::new(HashMap::new()),
                self_ref: Mutex::new(weak.clone()),
            }
        });
        manager
    }

    fn self_arc(&self) -> Arc<CheckManager> {
        self.self_ref
            .lock()
            .upgrade()
            .expect("manager outlives its own weak reference")
    }

    pub fn register_failure_handler(&self, handler: FailureHandler) {
        self.handlers.lock().push(handler);
    }

    /// Read-only snapshot sorted by name.
    pub fn checks(&self) -> Vec<CheckSnapshot> {
        let guard = self.checks.lock();
        let mut out: Vec<CheckSnapshot> = guard
            .iter()
            .map(|(name, runtime)| CheckSnapshot {
                name: name.clone(),
                level: runtime.cfg.level,
                status: derive_status(runtime.failures, runtime.cfg.threshold, runtime.change_id.is_some()),
                failures: runtime.failures,
                threshold: runtime.cfg.threshold,
                change_id: runtime.change_id.clone(),
                startup: runtime.cfg.startup,
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Reconcile against a new plan: abort any active change whose check
    /// was removed or whose merged config changed, then start a
    /// perform-check for every enabled check with no active change.
    pub fn plan_changed(&self, plan: Arc<Plan>) {
        let active = self.state.active_changes();

        let mut to_abort = Vec::new();
        let mut to_start: Vec<String> = Vec::new();
        {
            let configs = self.configs.lock();
            for change in &active {
                if !matches!(change.kind, ChangeKind::PerformCheck | ChangeKind::RecoverCheck) {
                    continue;
                }
                let name = &change.task.name;
                match plan.get_check(name) {
                    None => to_abort.push(change.id.clone()),
                    Some(cfg) => {
                        let merged = resolve(cfg, &plan);
                        let unchanged = configs.get(&change.id) == Some(&merged);
                        if !unchanged {
                            to_abort.push(change.id.clone());
                        }
                    }
                }
            }
        }

        for id in &to_abort {
            self.abort_change(id);
        }

        for (name, cfg) in &plan.checks {
            if cfg.startup == Startup::Disabled {
                continue;
            }
            if self.state.active_change_for(name).is_none() {
                to_start.push(name.clone());
            }
        }

        for name in to_start {
            if let Some(cfg) = plan.get_check(&name) {
                let merged = resolve(cfg, &plan);
                self.start_perform_check(merged);
            }
        }
    }

    /// Force a disabled check active. Returns the names actually started.
    pub fn start_checks(&self, names: &[String], plan: &Plan) -> Vec<String> {
        let mut started = Vec::new();
        for name in names {
            if self.state.active_change_for(name).is_some() {
                continue;
            }
            if let Some(cfg) = plan.get_check(name) {
                let merged = resolve(cfg, plan);
                self.start_perform_check(merged);
                started.push(name.clone());
            }
        }
        started
    }

    /// Abort the owning change for each name, leaving it `inactive`.
    /// Returns the names actually stopped.
    pub fn stop_checks(&self, names: &[String]) -> Vec<String> {
        let mut stopped = Vec::new();
        for name in names {
            if let Some(change) = self.state.active_change_for(name) {
                self.abort_change(&change.id);
                stopped.push(name.clone());
            }
        }
        stopped
    }

    /// Synchronous one-shot probe outside the regular task lifecycle.
    pub async fn refresh_check(&self, cfg: &CheckConfig) -> (CheckSnapshot, Option<Error>) {
        let checker = match build_checker(cfg, &self.limits) {
            Ok(c) => c,
            Err(e) => {
                let snapshot = CheckSnapshot {
                    name: cfg.name.clone(),
                    level: cfg.level,
                    status: CheckStatus::Inactive,
                    failures: 0,
                    threshold: cfg.threshold,
                    change_id: None,
                    startup: cfg.startup,
                };
                return (snapshot, Some(e));
            }
        };
        let ctx = CheckContext { timeout: cfg.timeout, cancel: CancellationToken::new() };
        let result = checker.check(&ctx).await;
        let existing = self.checks.lock().get(&cfg.name).cloned();
        let failures = existing.as_ref().map(|r| r.failures).unwrap_or(0);
        let change_id = existing.and_then(|r| r.change_id);
        let snapshot = CheckSnapshot {
            name: cfg.name.clone(),
            level: cfg.level,
            status: derive_status(failures, cfg.threshold, change_id.is_some()),
            failures,
            threshold: cfg.threshold,
            change_id,
            startup: cfg.startup,
        };
        (snapshot, result.err())
    }

    fn start_perform_check(&self, cfg: CheckConfig) {
        self.spawn_worker(ChangeKind::PerformCheck, cfg, CheckDetails::new(""));
    }

    fn spawn_worker(&self, kind: ChangeKind, cfg: CheckConfig, mut task: CheckDetails) {
        task.name = cfg.name.clone();
        let change_id = self.state.create_change(kind, task);
        self.configs.lock().insert(change_id.clone(), cfg.clone());

        let mut checks = self.checks.lock();
        checks.insert(
            cfg.name.clone(),
            CheckRuntime { cfg: cfg.clone(), failures: 0, change_id: Some(change_id.clone()) },
        );
        drop(checks);

        let cancel = CancellationToken::new();
        let refresh = Arc::new(tokio::sync::Notify::new());
        let worker = Worker {
            manager: self.self_arc(),
            change_id: change_id.clone(),
            kind,
            cfg,
            cancel: cancel.clone(),
            refresh: refresh.clone(),
        };
        let join = tokio::spawn(worker.run());
        self.workers.lock().insert(change_id, WorkerHandle { cancel, refresh, join });
    }

    fn abort_change(&self, id: &ChangeId) {
        if let Some(handle) = self.workers.lock().remove(id) {
            handle.cancel.cancel();
            handle.join.abort();
        }
        if let Err(e) = self.state.abort(id) {
            warn!(error = %e, "aborting unknown change");
        }
        self.configs.lock().remove(id);
        if let Some(change) = self.state.get(id) {
            let mut checks = self.checks.lock();
            if let Some(runtime) = checks.get(&change.task.name) {
                if runtime.change_id.as_ref() == Some(id) {
                    checks.remove(&change.task.name);
                }
            }
        }
    }

    pub(crate) fn state(&self) -> &StateStore {
        &self.state
    }

    pub(crate) fn limits(&self) -> CheckLimits {
        self.limits
    }

    pub(crate) fn request_refresh(&self, change_id: &ChangeId) {
        if let Some(handle) = self.workers.lock().get(change_id) {
            handle.refresh.notify_one();
        }
    }

    pub(crate) fn update_runtime(&self, check_name: &str, failures: u32) {
        if let Some(runtime) = self.checks.lock().get_mut(check_name) {
            runtime.failures = failures;
        }
    }

    /// Dispatch to every registered failure handler. A handler that panics
    /// or otherwise misbehaves must not stall the manager, so each call is
    /// isolated with `catch_unwind`.
    pub(crate) fn notify_failure(&self, check_name: &str) {
        info!(check = check_name, "check crossed failure threshold");
        for handler in self.handlers.lock().iter() {
            let handler = handler.clone();
            let name = check_name.to_string();
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || handler(&name))).is_err() {
                warn!(check = check_name, "failure handler panicked");
            }
        }
    }

    fn on_terminal_transition(&self, change: &warden_state::Change) {
        let Some(cfg) = self.configs.lock().get(&change.id).cloned() else {
            return;
        };
        match (change.kind, change.status, change.task.proceed) {
            (ChangeKind::PerformCheck, ChangeStatus::Error, true) => {
                self.spawn_worker(
                    ChangeKind::RecoverCheck,
                    cfg,
                    CheckDetails { name: change.task.name.clone(), failures: change.task.failures, successes: 0, proceed: false },
                );
            }
            (ChangeKind::RecoverCheck, ChangeStatus::Done, true) => {
                self.spawn_worker(ChangeKind::PerformCheck, cfg, CheckDetails::new(&change.task.name));
            }
            _ => {}
        }
    }
}

pub fn build_checker(cfg: &CheckConfig, limits: &CheckLimits) -> Result<Box<dyn Checker>, Error> {
    match &cfg.kind {
        CheckKind::Http(http) => Ok(Box::new(HttpChecker::new(http, limits))),
        CheckKind::Tcp(tcp) => Ok(Box::new(TcpChecker::new(tcp))),
        CheckKind::Exec(exec) => Ok(Box::new(ExecChecker::new(exec, limits)?)),
    }
}
