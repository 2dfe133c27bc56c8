// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layer combination.
//!
//! Combine is defined as a pairwise fold (`combine_two`) so that
//! associativity — `combine([L1,L2,L3]) == combine([combine(L1,L2), L3])`
//! — is a property of the same code path the n-ary entry point uses, not
//! a separate algorithm.

use crate::error::PlanError;
use crate::extension::ExtensionRegistry;
use crate::layer::Layer;
use crate::raw::{Mergeable, RawCheckEntry, RawLogTargetEntry, RawServiceEntry};
use crate::types::{
    CheckConfig, CheckKind, CheckLevel, ExecCheck, HttpCheck, LogTargetConfig, LogTargetType,
    ServiceConfig, Startup, TcpCheck, DEFAULT_PERIOD, DEFAULT_TCP_HOST, DEFAULT_THRESHOLD,
    DEFAULT_TIMEOUT,
};
use crate::Plan;
use std::collections::HashMap;

/// Result of combining two (or more, left-folded) layers: still raw,
/// override-annotated entries. Kept separate from [`Plan`] because combine
/// and default-filling are distinct steps — unset per-check defaults are
/// filled in only after every layer has been folded.
pub struct Combined {
    pub summary: String,
    pub description: String,
    pub services: HashMap<String, RawServiceEntry>,
    pub checks: HashMap<String, RawCheckEntry>,
    pub log_targets: HashMap<String, RawLogTargetEntry>,
}

impl Combined {
    pub fn empty() -> Self {
        Self {
            summary: String::new(),
            description: String::new(),
            services: HashMap::new(),
            checks: HashMap::new(),
            log_targets: HashMap::new(),
        }
    }
}

fn combine_named_map<T: Mergeable>(
    later_label: &str,
    mut existing: HashMap<String, T>,
    incoming: HashMap<String, T>,
) -> Result<HashMap<String, T>, PlanError> {
    for (name, entry) in incoming {
        let over = entry.override_raw();
        let override_kind = crate::types::Override::parse(over).ok_or_else(|| {
            PlanError::format(
                later_label,
                format!("{name}: override must be 'replace' or 'merge'"),
            )
        })?;

        match existing.remove(&name) {
            Some(prior) => match override_kind {
                crate::types::Override::Replace => {
                    existing.insert(name, entry);
                }
                crate::types::Override::Merge => {
                    existing.insert(name, prior.merge_onto(&entry));
                }
            },
            None => {
                existing.insert(name, entry);
            }
        }
    }
    Ok(existing)
}

/// Combine two already-parsed layers, `a` applied before `b`.
pub fn combine_two(a: Combined, b: &Layer) -> Result<Combined, PlanError> {
    let services = combine_named_map(&b.label, a.services, clone_map(&b.services))?;
    let checks = combine_named_map(&b.label, a.checks, clone_map(&b.checks))?;
    let log_targets = combine_named_map(&b.label, a.log_targets, clone_map(&b.log_targets))?;

    Ok(Combined {
        summary: if b.summary.is_empty() { a.summary } else { b.summary.clone() },
        description: if b.description.is_empty() { a.description } else { b.description.clone() },
        services,
        checks,
        log_targets,
    })
}

fn clone_map<T: Clone>(m: &HashMap<String, T>) -> HashMap<String, T> {
    m.clone()
}

/// Combine an ordered list of layers (lowest order first) into one
/// [`Plan`], filling per-check defaults and combining registered extension
/// sections. Does not run cross-section validation — see `validate`.
pub fn combine_layers(layers: Vec<Layer>, registry: &ExtensionRegistry) -> Result<Plan, PlanError> {
    let mut acc = Combined::empty();

    let mut section_inputs: HashMap<String, Vec<Box<dyn crate::extension::ExtensionSection>>> =
        HashMap::new();

    let mut iter = layers.into_iter();
    let Some(first) = iter.next() else {
        return finalize(acc, HashMap::new(), registry);
    };
    acc = combine_two(acc, &first)?;
    push_sections(&mut section_inputs, first);

    for layer in iter {
        acc = combine_two(acc, &layer)?;
        push_sections(&mut section_inputs, layer);
    }

    let mut combined_sections = HashMap::new();
    for key in registry.keys_in_order() {
        if let Some(inputs) = section_inputs.remove(key) {
            let extension = registry.get(key).expect("registered");
            let combined = extension.combine(inputs)?;
            combined_sections.insert(key.to_string(), combined);
        }
    }

    finalize(acc, combined_sections, registry)
}

fn push_sections(
    dest: &mut HashMap<String, Vec<Box<dyn crate::extension::ExtensionSection>>>,
    mut layer: Layer,
) {
    for (key, section) in layer.sections.drain() {
        dest.entry(key).or_default().push(section);
    }
}

pub(crate) fn finalize(
    combined: Combined,
    sections: HashMap<String, Box<dyn crate::extension::ExtensionSection>>,
    _registry: &ExtensionRegistry,
) -> Result<Plan, PlanError> {
    let mut services = HashMap::new();
    for (name, raw) in combined.services {
        services.insert(name.clone(), finalize_service(&name, raw)?);
    }

    let mut checks = HashMap::new();
    for (name, raw) in combined.checks {
        checks.insert(name.clone(), finalize_check(&name, raw)?);
    }

    let mut log_targets = HashMap::new();
    for (name, raw) in combined.log_targets {
        log_targets.insert(name.clone(), finalize_log_target(&name, raw)?);
    }

    Ok(Plan {
        summary: combined.summary,
        description: combined.description,
        services,
        checks,
        log_targets,
        sections,
    })
}

fn finalize_service(name: &str, raw: RawServiceEntry) -> Result<ServiceConfig, PlanError> {
    let command = raw
        .command
        .ok_or_else(|| PlanError::format(name, "service has no command"))?;
    Ok(ServiceConfig {
        name: name.to_string(),
        command,
        startup: raw.startup.unwrap_or(Startup::Enabled),
        after: raw.after.unwrap_or_default(),
        before: raw.before.unwrap_or_default(),
        requires: raw.requires.unwrap_or_default(),
        environment: raw.environment.unwrap_or_default(),
        user: raw.user,
        group: raw.group,
        user_id: raw.user_id,
        group_id: raw.group_id,
        working_dir: raw.working_dir,
        on_success: raw.on_success,
        on_failure: raw.on_failure,
        on_check_failure: raw.on_check_failure.unwrap_or_default(),
        backoff_delay: raw
            .backoff_delay
            .as_deref()
            .map(crate::duration::parse_duration)
            .transpose()
            .map_err(|e| PlanError::format(name, e))?,
        backoff_limit: raw
            .backoff_limit
            .as_deref()
            .map(crate::duration::parse_duration)
            .transpose()
            .map_err(|e| PlanError::format(name, e))?,
        backoff_factor: raw.backoff_factor,
    })
}

fn finalize_check(name: &str, raw: RawCheckEntry) -> Result<CheckConfig, PlanError> {
    if raw.kind_count() != 1 {
        return Err(PlanError::format(
            name,
            format!("check must have exactly one of http/tcp/exec, found {}", raw.kind_count()),
        ));
    }

    let period = match &raw.period {
        Some(s) => crate::duration::parse_duration(s).map_err(|e| PlanError::format(name, e))?,
        None => DEFAULT_PERIOD,
    };
    let mut timeout = match &raw.timeout {
        Some(s) => crate::duration::parse_duration(s).map_err(|e| PlanError::format(name, e))?,
        None => DEFAULT_TIMEOUT,
    };
    // Timeout is silently capped at period.
    if timeout > period {
        timeout = period;
    }
    let threshold = raw.threshold.unwrap_or(DEFAULT_THRESHOLD);

    let kind = if let Some(http) = raw.http {
        CheckKind::Http(HttpCheck {
            url: http.url.ok_or_else(|| PlanError::format(name, "http check has no url"))?,
            headers: http.headers.unwrap_or_default(),
        })
    } else if let Some(tcp) = raw.tcp {
        CheckKind::Tcp(TcpCheck {
            port: tcp.port.ok_or_else(|| PlanError::format(name, "tcp check has no port"))?,
            host: tcp.host.unwrap_or_else(|| DEFAULT_TCP_HOST.to_string()),
        })
    } else if let Some(exec) = raw.exec {
        CheckKind::Exec(ExecCheck {
            command: exec
                .command
                .ok_or_else(|| PlanError::format(name, "exec check has no command"))?,
            environment: exec.environment.unwrap_or_default(),
            user: exec.user,
            user_id: exec.user_id,
            group: exec.group,
            group_id: exec.group_id,
            working_dir: exec.working_dir,
            service_context: exec.service_context,
        })
    } else {
        unreachable!("kind_count checked above");
    };

    Ok(CheckConfig {
        name: name.to_string(),
        level: raw.level.unwrap_or(CheckLevel::Unset),
        startup: raw.startup.unwrap_or(Startup::Enabled),
        period,
        timeout,
        threshold,
        kind,
    })
}

fn finalize_log_target(name: &str, raw: RawLogTargetEntry) -> Result<LogTargetConfig, PlanError> {
    let target_type = match raw.target_type.as_deref() {
        Some("loki") => LogTargetType::Loki,
        Some("syslog") => LogTargetType::Syslog,
        Some(other) => {
            return Err(PlanError::format(name, format!("unknown log target type: {other}")))
        }
        None => return Err(PlanError::format(name, "log target has no type")),
    };
    let location = raw
        .location
        .ok_or_else(|| PlanError::format(name, "log target has no location"))?;
    let labels = raw.labels.unwrap_or_default();
    for key in labels.keys() {
        if key.starts_with(crate::label::RESERVED_LOG_LABEL_PREFIX) {
            return Err(PlanError::format(
                name,
                format!(
                    "label key '{key}' must not start with reserved prefix '{}'",
                    crate::label::RESERVED_LOG_LABEL_PREFIX
                ),
            ));
        }
    }
    Ok(LogTargetConfig {
        name: name.to_string(),
        target_type,
        location,
        services: raw.services.unwrap_or_default(),
        labels,
    })
}

#[cfg(test)]
#[path = "combine_tests.rs"]
mod tests;
