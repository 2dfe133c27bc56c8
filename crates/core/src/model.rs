// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vocabulary shared between the state store and the check manager: the
//! kind/status enums of a durable change, and the task attributes a check
//! worker persists as it runs.

use serde::{Deserialize, Serialize};

/// What a durable change is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    PerformCheck,
    RecoverCheck,
}

/// Lifecycle status of a durable change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    Do,
    Doing,
    Done,
    Error,
    Abort,
}

impl ChangeStatus {
    /// A change in one of these statuses will never run again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChangeStatus::Done | ChangeStatus::Error | ChangeStatus::Abort)
    }

    pub fn is_ready(self) -> bool {
        self.is_terminal()
    }
}

/// Observable health of a check: up iff failures < threshold, down iff
/// failures >= threshold, inactive iff no owning change exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Up,
    Down,
    Inactive,
}

/// Task attributes a perform-check/recover-check worker persists on every
/// tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetails {
    pub name: String,
    pub failures: u32,
    pub successes: u32,
    /// Signals the state-machine transition intent when the task terminates.
    pub proceed: bool,
}

impl CheckDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
        self.failures = 0;
    }
}
