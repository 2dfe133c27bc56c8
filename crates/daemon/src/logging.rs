// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide tracing setup: the logger lives behind a process-wide
//! subscriber that is replaceable at startup for testing.

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber reading its filter from
/// `WARDEN_LOG` (falling back to `info`). Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
