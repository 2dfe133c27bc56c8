// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wiring of the plan model, state store, and check manager into one
//! handle, plus plan loading and reloading from disk.

use crate::config::SupervisorConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use warden_checks::{CheckManager, CheckSnapshot, FailureHandler};
use warden_core::Error;
use warden_plan::{ExtensionRegistry, Plan};
use warden_state::StateStore;

/// Owns the combined plan, the durable state store, and the check
/// manager. Never a CLI or HTTP surface — just the object a host process
/// builds and calls into.
pub struct Supervisor {
    config: SupervisorConfig,
    registry: ExtensionRegistry,
    manager: Arc<CheckManager>,
    plan: Mutex<Arc<Plan>>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_registry(config, ExtensionRegistry::new())
    }

    pub fn with_registry(config: SupervisorConfig, registry: ExtensionRegistry) -> Self {
        let state = Arc::new(StateStore::new());
        let limits = config.check_limits();
        Self {
            config,
            registry,
            manager: CheckManager::with_limits(state, limits),
            plan: Mutex::new(Arc::new(Plan::empty())),
        }
    }

    /// Load, combine, and validate the layers directory, then reconcile
    /// the check manager against the result.
    pub fn reload(&self) -> Result<(), Error> {
        let plan = warden_plan::load_plan(&self.config.layers_dir, &self.registry)?;
        let plan = Arc::new(plan);
        *self.plan.lock() = plan.clone();
        self.manager.plan_changed(plan);
        Ok(())
    }

    /// Apply an already-combined plan directly, bypassing disk discovery.
    /// Useful for tests and embedders that build a [`Plan`] in memory.
    pub fn plan_changed(&self, plan: Plan) {
        let plan = Arc::new(plan);
        *self.plan.lock() = plan.clone();
        self.manager.plan_changed(plan);
    }

    pub fn checks(&self) -> Vec<CheckSnapshot> {
        self.manager.checks()
    }

    pub fn notify_check_failed(&self, handler: FailureHandler) {
        self.manager.register_failure_handler(handler);
    }

    pub fn start_checks(&self, names: &[String]) -> Vec<String> {
        let plan = self.plan.lock().clone();
        self.manager.start_checks(names, &plan)
    }

    pub fn stop_checks(&self, names: &[String]) -> Vec<String> {
        self.manager.stop_checks(names)
    }

    pub async fn refresh_check(&self, name: &str) -> Result<(CheckSnapshot, Option<Error>), Error> {
        let plan = self.plan.lock().clone();
        let cfg = plan
            .get_check(name)
            .ok_or_else(|| Error::NotFound(vec![name.to_string()]))?;
        let resolved = warden_checks::resolve(cfg, &plan);
        Ok(self.manager.refresh_check(&resolved).await)
    }

    pub fn plan(&self) -> Arc<Plan> {
        self.plan.lock().clone()
    }

    /// The combined plan re-marshaled to YAML, for an admin/inspection
    /// surface. Durations come back in their canonical spelling regardless
    /// of how they were written in the layer files.
    pub fn plan_yaml(&self) -> Result<String, Error> {
        Ok(self.plan.lock().to_yaml()?)
    }
}
