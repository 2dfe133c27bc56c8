// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-section plan validation.
//!
//! Combine only resolves per-entry merge/replace; it doesn't know whether
//! the result is coherent as a whole (dangling references, cycles, missing
//! required fields). That's this module's job, run once after combine.

use crate::error::PlanError;
use crate::extension::ExtensionRegistry;
use crate::plan::Plan;
use std::collections::{HashMap, HashSet};

pub fn validate(plan: &Plan, registry: &ExtensionRegistry) -> Result<(), PlanError> {
    validate_services(plan)?;
    validate_checks(plan)?;
    validate_log_targets(plan)?;
    validate_service_dependency_graph(plan)?;

    for key in registry.keys_in_order() {
        if let Some(ext) = registry.get(key) {
            ext.validate_plan(plan)?;
        }
    }
    Ok(())
}

fn validate_services(plan: &Plan) -> Result<(), PlanError> {
    for (name, svc) in &plan.services {
        if svc.command.trim().is_empty() {
            return Err(PlanError::format(name, "service command must not be empty"));
        }
        for dep in svc.after.iter().chain(&svc.before).chain(&svc.requires) {
            if !plan.services.contains_key(dep) {
                return Err(PlanError::format(
                    name,
                    format!("references unknown service '{dep}'"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_checks(plan: &Plan) -> Result<(), PlanError> {
    use crate::types::CheckKind;

    for (name, chk) in &plan.checks {
        match &chk.kind {
            CheckKind::Http(h) => {
                if h.url.trim().is_empty() {
                    return Err(PlanError::format(name, "http check url must not be empty"));
                }
            }
            CheckKind::Tcp(t) => {
                if t.port == 0 {
                    return Err(PlanError::format(name, "tcp check port must not be zero"));
                }
            }
            CheckKind::Exec(e) => {
                if e.command.trim().is_empty() {
                    return Err(PlanError::format(name, "exec check command must not be empty"));
                }
                if let Some(ctx) = &e.service_context {
                    if !plan.services.contains_key(ctx) {
                        return Err(PlanError::format(
                            name,
                            format!("service-context '{ctx}' does not exist"),
                        ));
                    }
                }
            }
        }
        if chk.threshold == 0 {
            return Err(PlanError::format(name, "threshold must be at least 1"));
        }
    }
    Ok(())
}

fn validate_log_targets(plan: &Plan) -> Result<(), PlanError> {
    for (name, target) in &plan.log_targets {
        if target.location.trim().is_empty() {
            return Err(PlanError::format(name, "log target location must not be empty"));
        }
        for svc in &target.services {
            if !plan.services.contains_key(svc) {
                return Err(PlanError::format(
                    name,
                    format!("references unknown service '{svc}'"),
                ));
            }
        }
    }
    Ok(())
}

/// Detect cycles in the service ordering graph (`after`/`before`/`requires`
/// together define a DAG of start-order constraints).
fn validate_service_dependency_graph(plan: &Plan) -> Result<(), PlanError> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, svc) in &plan.services {
        let entry = edges.entry(name.as_str()).or_default();
        for dep in &svc.after {
            entry.push(dep.as_str());
        }
        for dep in &svc.requires {
            entry.push(dep.as_str());
        }
    }
    for (name, svc) in &plan.services {
        for dep in &svc.before {
            edges.entry(dep.as_str()).or_default().push(name.as_str());
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut HashSet<&'a str>,
    ) -> Result<(), String> {
        if marks.get(node) == Some(&Mark::Done) {
            return Ok(());
        }
        if !stack.insert(node) {
            return Err(format!("dependency cycle detected at '{node}'"));
        }
        marks.insert(node, Mark::Visiting);
        if let Some(deps) = edges.get(node) {
            for dep in deps {
                visit(dep, edges, marks, stack)?;
            }
        }
        stack.remove(node);
        marks.insert(node, Mark::Done);
        Ok(())
    }

    for name in plan.services.keys() {
        let mut stack = HashSet::new();
        visit(name.as_str(), &edges, &mut marks, &mut stack)
            .map_err(|msg| PlanError::format(name, msg))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::combine_layers;
    use crate::layer::parse_layer;

    fn plan_from(yaml: &str) -> Plan {
        let registry = ExtensionRegistry::new();
        let layer = parse_layer("base", 0, yaml, &registry).unwrap();
        combine_layers(vec![layer], &registry).unwrap()
    }

    #[test]
    fn rejects_service_with_empty_command() {
        let plan = plan_from("services:\n  srv1:\n    override: replace\n    command: \"\"\n");
        let registry = ExtensionRegistry::new();
        let err = validate(&plan, &registry).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn rejects_dependency_cycle() {
        let plan = plan_from(
            r#"
services:
  a:
    override: replace
    command: "a"
    after: [b]
  b:
    override: replace
    command: "b"
    after: [a]
"#,
        );
        let registry = ExtensionRegistry::new();
        let err = validate(&plan, &registry).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn rejects_exec_check_with_unknown_service_context() {
        let plan = plan_from(
            r#"
checks:
  chk1:
    override: replace
    exec:
      command: "true"
      service-context: "missing"
"#,
        );
        let registry = ExtensionRegistry::new();
        let err = validate(&plan, &registry).unwrap_err();
        assert!(err.to_string().contains("service-context"));
    }

    #[test]
    fn accepts_well_formed_plan() {
        let plan = plan_from(
            r#"
services:
  web:
    override: replace
    command: "webserver"
checks:
  chk1:
    override: replace
    http:
      url: "http://localhost/health"
"#,
        );
        let registry = ExtensionRegistry::new();
        assert!(validate(&plan, &registry).is_ok());
    }
}
