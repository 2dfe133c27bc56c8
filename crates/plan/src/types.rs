// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Combined-plan types: resolved service, check, and log-target entries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-entry override discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    Replace,
    Merge,
}

impl Override {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("replace") => Some(Override::Replace),
            Some("merge") => Some(Override::Merge),
            _ => None,
        }
    }
}

/// Whether a service/check starts automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Startup {
    #[default]
    Enabled,
    Disabled,
}

/// Health level of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    #[default]
    Unset,
    Alive,
    Ready,
}

/// One resolved service entry, after layer combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(skip)]
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub startup: Startup,
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub user_id: Option<u32>,
    #[serde(default)]
    pub group_id: Option<u32>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub on_success: Option<String>,
    #[serde(default)]
    pub on_failure: Option<String>,
    #[serde(default)]
    pub on_check_failure: HashMap<String, String>,
    #[serde(default, with = "crate::duration::canonical_option")]
    pub backoff_delay: Option<Duration>,
    #[serde(default, with = "crate::duration::canonical_option")]
    pub backoff_limit: Option<Duration>,
    #[serde(default)]
    pub backoff_factor: Option<f64>,
}

/// One HTTP check target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCheck {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// One TCP check target. `host` defaults to `localhost` at combine time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpCheck {
    pub port: u16,
    pub host: String,
}

/// One exec check target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecCheck {
    pub command: String,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_id: Option<u32>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub group_id: Option<u32>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub service_context: Option<String>,
}

/// The one-of-three probe a check performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckKind {
    Http(HttpCheck),
    Tcp(TcpCheck),
    Exec(ExecCheck),
}

/// A fully resolved check, after layer combination, default-filling, and
/// (for exec checks) service-context merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    pub name: String,
    #[serde(default)]
    pub level: CheckLevel,
    #[serde(default)]
    pub startup: Startup,
    #[serde(with = "crate::duration::canonical")]
    pub period: Duration,
    #[serde(with = "crate::duration::canonical")]
    pub timeout: Duration,
    pub threshold: u32,
    pub kind: CheckKind,
}

impl CheckConfig {
    pub fn service_context_name(&self) -> Option<&str> {
        match &self.kind {
            CheckKind::Exec(e) => e.service_context.as_deref(),
            _ => None,
        }
    }
}

/// Default period/timeout/threshold.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_THRESHOLD: u32 = 3;
pub const DEFAULT_TCP_HOST: &str = "localhost";

/// Type of log-target backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTargetType {
    Loki,
    Syslog,
}

/// A resolved log-forwarding target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTargetConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: LogTargetType,
    pub location: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_parses_known_values() {
        assert_eq!(Override::parse(Some("replace")), Some(Override::Replace));
        assert_eq!(Override::parse(Some("merge")), Some(Override::Merge));
    }

    #[test]
    fn override_rejects_absent_or_unknown() {
        assert_eq!(Override::parse(None), None);
        assert_eq!(Override::parse(Some("bogus")), None);
    }
}
