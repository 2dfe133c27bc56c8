// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end perform-check -> recover-check -> perform-check lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warden_checks::CheckManager;
use warden_plan::{CheckConfig, CheckKind, CheckLevel, ExecCheck, Plan, Startup};
use warden_state::StateStore;

fn exec_check(name: &str, command: &str, period_ms: u64, timeout_ms: u64, threshold: u32) -> CheckConfig {
    CheckConfig {
        name: name.to_string(),
        level: CheckLevel::Unset,
        startup: Startup::Enabled,
        period: Duration::from_millis(period_ms),
        timeout: Duration::from_millis(timeout_ms),
        threshold,
        kind: CheckKind::Exec(ExecCheck {
            command: command.to_string(),
            environment: HashMap::new(),
            user: None,
            user_id: None,
            group: None,
            group_id: None,
            working_dir: None,
            service_context: None,
        }),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn perform_check_trips_into_recover_then_back() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("x");
    std::fs::write(&marker, b"").unwrap();

    let check = exec_check(
        "chk1",
        &format!("sh -c '[ ! -f {} ]'", marker.display()),
        20,
        100,
        3,
    );

    let mut plan = Plan::empty();
    plan.checks.insert(check.name.clone(), check.clone());
    let plan = Arc::new(plan);

    let state = Arc::new(StateStore::new());
    let manager = CheckManager::new(state);

    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = calls.clone();
    manager.register_failure_handler(Arc::new(move |name| {
        assert_eq!(name, "chk1");
        calls2.fetch_add(1, Ordering::SeqCst);
    }));

    manager.plan_changed(plan.clone());

    // Wait for three failing ticks to trip the threshold.
    wait_until(Duration::from_secs(2), || {
        manager.checks().iter().any(|c| c.name == "chk1" && c.failures >= 3)
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let down = manager.checks().into_iter().find(|c| c.name == "chk1").unwrap();
    assert_eq!(down.status, warden_core::CheckStatus::Down);
    let change_after_trip = down.change_id.clone();

    std::fs::remove_file(&marker).unwrap();

    wait_until(Duration::from_secs(2), || {
        manager.checks().iter().any(|c| {
            c.name == "chk1" && c.failures == 0 && c.change_id != change_after_trip
        })
    })
    .await;

    let recovered = manager.checks().into_iter().find(|c| c.name == "chk1").unwrap();
    assert_eq!(recovered.status, warden_core::CheckStatus::Up);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

async fn wait_until<F: Fn() -> bool>(timeout: Duration, cond: F) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !cond() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within timeout");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
