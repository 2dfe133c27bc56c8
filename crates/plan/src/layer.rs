// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single parsed layer.

use crate::error::PlanError;
use crate::extension::{ExtensionRegistry, ExtensionSection};
use crate::label::validate_label;
use crate::raw::{RawCheckEntry, RawLogTargetEntry, RawServiceEntry};
use std::collections::HashMap;

/// One combine-ready layer: raw per-entry maps (still carrying `override`)
/// plus any parsed extension sections.
pub struct Layer {
    pub order: i64,
    pub label: String,
    pub summary: String,
    pub description: String,
    pub services: HashMap<String, RawServiceEntry>,
    pub checks: HashMap<String, RawCheckEntry>,
    pub log_targets: HashMap<String, RawLogTargetEntry>,
    pub sections: HashMap<String, Box<dyn ExtensionSection>>,
}

/// Parse one layer's raw YAML bytes.
///
/// Rejects unknown top-level keys unless they match a registered
/// extension. `label` must already have passed filename/label validation
/// by the caller when sourced from a file.
pub fn parse_layer(
    label: &str,
    order: i64,
    yaml: &str,
    registry: &ExtensionRegistry,
) -> Result<Layer, PlanError> {
    validate_label(label).map_err(|msg| PlanError::format(label, msg))?;

    let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let mapping = match doc {
        serde_yaml::Value::Null => serde_yaml::Mapping::new(),
        serde_yaml::Value::Mapping(m) => m,
        _ => return Err(PlanError::format(label, "layer must be a YAML mapping")),
    };

    let mut summary = String::new();
    let mut description = String::new();
    let mut services = HashMap::new();
    let mut checks = HashMap::new();
    let mut log_targets = HashMap::new();
    let mut sections: HashMap<String, Box<dyn ExtensionSection>> = HashMap::new();

    for (k, v) in mapping {
        let key = k
            .as_str()
            .ok_or_else(|| PlanError::format(label, "top-level keys must be strings"))?
            .to_string();

        match key.as_str() {
            "summary" => summary = value_as_string(&v).unwrap_or_default(),
            "description" => description = value_as_string(&v).unwrap_or_default(),
            "services" => services = parse_named_map(label, v)?,
            "checks" => checks = parse_named_map(label, v)?,
            "log-targets" => log_targets = parse_named_map(label, v)?,
            other => {
                if let Some(extension) = registry.get(other) {
                    let parsed = extension.parse(v)?;
                    sections.insert(other.to_string(), parsed);
                } else {
                    return Err(PlanError::format(label, format!("unknown section: {other}")));
                }
            }
        }
    }

    Ok(Layer {
        order,
        label: label.to_string(),
        summary,
        description,
        services,
        checks,
        log_targets,
        sections,
    })
}

fn value_as_string(v: &serde_yaml::Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

fn parse_named_map<T: serde::de::DeserializeOwned>(
    label: &str,
    value: serde_yaml::Value,
) -> Result<HashMap<String, T>, PlanError> {
    let mapping = value
        .as_mapping()
        .ok_or_else(|| PlanError::format(label, "section must be a mapping of name to entry"))?
        .clone();
    let mut out = HashMap::new();
    for (k, v) in mapping {
        let name = k
            .as_str()
            .ok_or_else(|| PlanError::format(label, "entry names must be strings"))?
            .to_string();
        let entry: T = serde_yaml::from_value(v)
            .map_err(|e| PlanError::format(label, format!("{name}: {e}")))?;
        out.insert(name, entry);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_service_layer() {
        let yaml = r#"
services:
  srv1:
    override: replace
    command: "echo hi"
"#;
        let registry = ExtensionRegistry::new();
        let layer = parse_layer("base", 0, yaml, &registry).unwrap();
        assert_eq!(layer.services.len(), 1);
        let srv = &layer.services["srv1"];
        assert_eq!(srv.override_.as_deref(), Some("replace"));
        assert_eq!(srv.command.as_deref(), Some("echo hi"));
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let registry = ExtensionRegistry::new();
        let yaml = "bogus:\n  x: 1\n";
        let err = parse_layer("base", 0, yaml, &registry).unwrap_err();
        assert!(err.to_string().contains("unknown section"));
    }

    #[test]
    fn rejects_reserved_label_prefix() {
        let registry = ExtensionRegistry::new();
        let err = parse_layer("warden-internal", 0, "summary: x\n", &registry).unwrap_err();
        assert!(err.to_string().contains("reserved prefix"));
    }
}
