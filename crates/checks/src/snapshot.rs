// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The read-only projection a checks listing returns.

use warden_core::{CheckStatus, ChangeId};
use warden_plan::{CheckLevel, Startup};

#[derive(Debug, Clone)]
pub struct CheckSnapshot {
    pub name: String,
    pub level: CheckLevel,
    pub status: CheckStatus,
    pub failures: u32,
    pub threshold: u32,
    pub change_id: Option<ChangeId>,
    pub startup: Startup,
}

pub(crate) fn derive_status(failures: u32, threshold: u32, has_change: bool) -> CheckStatus {
    if !has_change {
        CheckStatus::Inactive
    } else if failures >= threshold {
        CheckStatus::Down
    } else {
        CheckStatus::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_threshold_and_presence() {
        assert_eq!(derive_status(0, 3, false), CheckStatus::Inactive);
        assert_eq!(derive_status(0, 3, true), CheckStatus::Up);
        assert_eq!(derive_status(3, 3, true), CheckStatus::Down);
        assert_eq!(derive_status(5, 3, true), CheckStatus::Down);
    }
}
