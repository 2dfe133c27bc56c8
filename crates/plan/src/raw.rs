// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw (pre-combine) per-layer entries. Every field is `Option` so combine
//! can tell "not set in this layer" apart from "set to the zero value",
//! which the merge override semantics depend on.

use crate::types::{CheckLevel, Startup};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Common shape the combine algorithm needs from every raw per-layer entry.
pub trait Mergeable: Clone {
    fn override_raw(&self) -> Option<&str>;
    fn merge_onto(&self, later: &Self) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawServiceEntry {
    #[serde(rename = "override")]
    pub override_: Option<String>,
    pub command: Option<String>,
    pub startup: Option<Startup>,
    pub after: Option<Vec<String>>,
    pub before: Option<Vec<String>>,
    pub requires: Option<Vec<String>>,
    pub environment: Option<HashMap<String, String>>,
    pub user: Option<String>,
    pub group: Option<String>,
    #[serde(rename = "user-id")]
    pub user_id: Option<u32>,
    #[serde(rename = "group-id")]
    pub group_id: Option<u32>,
    #[serde(rename = "working-dir")]
    pub working_dir: Option<String>,
    #[serde(rename = "on-success")]
    pub on_success: Option<String>,
    #[serde(rename = "on-failure")]
    pub on_failure: Option<String>,
    #[serde(rename = "on-check-failure")]
    pub on_check_failure: Option<HashMap<String, String>>,
    #[serde(rename = "backoff-delay")]
    pub backoff_delay: Option<String>,
    #[serde(rename = "backoff-limit")]
    pub backoff_limit: Option<String>,
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: Option<f64>,
}

impl Mergeable for RawServiceEntry {
    fn override_raw(&self) -> Option<&str> {
        self.override_.as_deref()
    }

    fn merge_onto(&self, later: &Self) -> Self {
        self.merged_with(later)
    }
}

impl RawServiceEntry {
    /// Merge `later` on top of `self`: scalars overwrite when set in
    /// `later`, maps union with `later` winning on conflict, lists
    /// concatenate.
    pub fn merged_with(&self, later: &RawServiceEntry) -> RawServiceEntry {
        RawServiceEntry {
            override_: later.override_.clone(),
            command: later.command.clone().or_else(|| self.command.clone()),
            startup: later.startup.or(self.startup),
            after: concat_opt(&self.after, &later.after),
            before: concat_opt(&self.before, &later.before),
            requires: concat_opt(&self.requires, &later.requires),
            environment: union_opt(&self.environment, &later.environment),
            user: later.user.clone().or_else(|| self.user.clone()),
            group: later.group.clone().or_else(|| self.group.clone()),
            user_id: later.user_id.or(self.user_id),
            group_id: later.group_id.or(self.group_id),
            working_dir: later.working_dir.clone().or_else(|| self.working_dir.clone()),
            on_success: later.on_success.clone().or_else(|| self.on_success.clone()),
            on_failure: later.on_failure.clone().or_else(|| self.on_failure.clone()),
            on_check_failure: union_opt(&self.on_check_failure, &later.on_check_failure),
            backoff_delay: later.backoff_delay.clone().or_else(|| self.backoff_delay.clone()),
            backoff_limit: later.backoff_limit.clone().or_else(|| self.backoff_limit.clone()),
            backoff_factor: later.backoff_factor.or(self.backoff_factor),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawHttpCheck {
    pub url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawTcpCheck {
    pub port: Option<u16>,
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawExecCheck {
    pub command: Option<String>,
    pub environment: Option<HashMap<String, String>>,
    pub user: Option<String>,
    #[serde(rename = "user-id")]
    pub user_id: Option<u32>,
    pub group: Option<String>,
    #[serde(rename = "group-id")]
    pub group_id: Option<u32>,
    #[serde(rename = "working-dir")]
    pub working_dir: Option<String>,
    #[serde(rename = "service-context")]
    pub service_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawCheckEntry {
    #[serde(rename = "override")]
    pub override_: Option<String>,
    pub level: Option<CheckLevel>,
    pub startup: Option<Startup>,
    pub period: Option<String>,
    pub timeout: Option<String>,
    pub threshold: Option<u32>,
    pub http: Option<RawHttpCheck>,
    pub tcp: Option<RawTcpCheck>,
    pub exec: Option<RawExecCheck>,
}

impl Mergeable for RawCheckEntry {
    fn override_raw(&self) -> Option<&str> {
        self.override_.as_deref()
    }

    fn merge_onto(&self, later: &Self) -> Self {
        self.merged_with(later)
    }
}

impl RawCheckEntry {
    pub fn merged_with(&self, later: &RawCheckEntry) -> RawCheckEntry {
        RawCheckEntry {
            override_: later.override_.clone(),
            level: later.level.or(self.level),
            startup: later.startup.or(self.startup),
            period: later.period.clone().or_else(|| self.period.clone()),
            timeout: later.timeout.clone().or_else(|| self.timeout.clone()),
            threshold: later.threshold.or(self.threshold),
            http: merge_http(&self.http, &later.http),
            tcp: merge_tcp(&self.tcp, &later.tcp),
            exec: merge_exec(&self.exec, &later.exec),
        }
    }

    /// Exactly one of http/tcp/exec must be populated after combine.
    pub fn kind_count(&self) -> usize {
        [self.http.is_some(), self.tcp.is_some(), self.exec.is_some()]
            .iter()
            .filter(|b| **b)
            .count()
    }
}

fn merge_http(a: &Option<RawHttpCheck>, b: &Option<RawHttpCheck>) -> Option<RawHttpCheck> {
    match (a, b) {
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => Some(RawHttpCheck {
            url: b.url.clone().or_else(|| a.url.clone()),
            headers: union_opt(&a.headers, &b.headers),
        }),
        (Some(a), None) => Some(a.clone()),
        (None, None) => None,
    }
}

fn merge_tcp(a: &Option<RawTcpCheck>, b: &Option<RawTcpCheck>) -> Option<RawTcpCheck> {
    match (a, b) {
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => Some(RawTcpCheck {
            port: b.port.or(a.port),
            host: b.host.clone().or_else(|| a.host.clone()),
        }),
        (Some(a), None) => Some(a.clone()),
        (None, None) => None,
    }
}

fn merge_exec(a: &Option<RawExecCheck>, b: &Option<RawExecCheck>) -> Option<RawExecCheck> {
    match (a, b) {
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => Some(RawExecCheck {
            command: b.command.clone().or_else(|| a.command.clone()),
            environment: union_opt(&a.environment, &b.environment),
            user: b.user.clone().or_else(|| a.user.clone()),
            user_id: b.user_id.or(a.user_id),
            group: b.group.clone().or_else(|| a.group.clone()),
            group_id: b.group_id.or(a.group_id),
            working_dir: b.working_dir.clone().or_else(|| a.working_dir.clone()),
            service_context: b.service_context.clone().or_else(|| a.service_context.clone()),
        }),
        (Some(a), None) => Some(a.clone()),
        (None, None) => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawLogTargetEntry {
    #[serde(rename = "override")]
    pub override_: Option<String>,
    #[serde(rename = "type")]
    pub target_type: Option<String>,
    pub location: Option<String>,
    pub services: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
}

impl Mergeable for RawLogTargetEntry {
    fn override_raw(&self) -> Option<&str> {
        self.override_.as_deref()
    }

    fn merge_onto(&self, later: &Self) -> Self {
        self.merged_with(later)
    }
}

impl RawLogTargetEntry {
    pub fn merged_with(&self, later: &RawLogTargetEntry) -> RawLogTargetEntry {
        RawLogTargetEntry {
            override_: later.override_.clone(),
            target_type: later.target_type.clone().or_else(|| self.target_type.clone()),
            location: later.location.clone().or_else(|| self.location.clone()),
            services: concat_opt(&self.services, &later.services),
            labels: union_opt(&self.labels, &later.labels),
        }
    }
}

fn concat_opt(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> Option<Vec<String>> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => {
            let mut v = a.clone();
            v.extend(b.iter().cloned());
            Some(v)
        }
    }
}

fn union_opt(
    a: &Option<HashMap<String, String>>,
    b: &Option<HashMap<String, String>>,
) -> Option<HashMap<String, String>> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => {
            let mut m = a.clone();
            for (k, v) in b {
                m.insert(k.clone(), v.clone());
            }
            Some(m)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_concatenates_lists_and_unions_env() {
        let a = RawServiceEntry {
            override_: Some("replace".into()),
            command: Some("cmd arg1".into()),
            environment: Some([("A".to_string(), "1".to_string())].into()),
            ..Default::default()
        };
        let b = RawServiceEntry {
            override_: Some("merge".into()),
            environment: Some([("B".to_string(), "2".to_string())].into()),
            after: Some(vec!["srv2".to_string()]),
            ..Default::default()
        };
        let merged = a.merged_with(&b);
        assert_eq!(merged.command.as_deref(), Some("cmd arg1"));
        let env = merged.environment.unwrap();
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
        assert_eq!(env.get("B").map(String::as_str), Some("2"));
        assert_eq!(merged.after, Some(vec!["srv2".to_string()]));
    }
}
