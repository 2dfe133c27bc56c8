// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-context merge for exec checks: a check naming a
//! `service-context` inherits that service's identity/environment/
//! working-dir fields, overridden by anything set locally.

use warden_plan::{CheckConfig, CheckKind, Plan};

/// Resolve a check's configuration against the plan, merging in its
/// service's fields when it names a `service-context`. The result is the
/// merged check config compared for restart-decision equality during
/// plan reconciliation.
pub fn resolve(cfg: &CheckConfig, plan: &Plan) -> CheckConfig {
    let CheckKind::Exec(exec) = &cfg.kind else {
        return cfg.clone();
    };
    let Some(context_name) = &exec.service_context else {
        return cfg.clone();
    };
    let Some(service) = plan.get_service(context_name) else {
        return cfg.clone();
    };

    let mut merged = exec.clone();
    merged.user = merged.user.or_else(|| service.user.clone());
    merged.user_id = merged.user_id.or(service.user_id);
    merged.group = merged.group.or_else(|| service.group.clone());
    merged.group_id = merged.group_id.or(service.group_id);
    merged.working_dir = merged.working_dir.or_else(|| service.working_dir.clone());

    let mut env = service.environment.clone();
    for (k, v) in &exec.environment {
        env.insert(k.clone(), v.clone());
    }
    merged.environment = env;

    let mut resolved = cfg.clone();
    resolved.kind = CheckKind::Exec(merged);
    resolved
}
