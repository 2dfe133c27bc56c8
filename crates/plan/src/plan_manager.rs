// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental plan assembly: fold one layer in at a time instead of
//! discovering a whole directory up front. Used by callers that receive
//! layers one at a time (e.g. a control API) rather than from disk.

use crate::combine::{combine_two, finalize, Combined};
use crate::error::PlanError;
use crate::extension::{ExtensionRegistry, ExtensionSection};
use crate::layer::Layer;
use crate::plan::Plan;
use crate::validate::validate;
use std::collections::{HashMap, HashSet};

/// Builds a [`Plan`] by folding in layers one at a time. Each label may
/// only be appended once; a repeat is `PlanError::LabelExists` rather than
/// a silent override, since `append_layer` has no later layer to give the
/// override precedence to.
pub struct PlanManager {
    registry: ExtensionRegistry,
    acc: Combined,
    section_inputs: HashMap<String, Vec<Box<dyn ExtensionSection>>>,
    labels: HashSet<String>,
}

impl PlanManager {
    pub fn new(registry: ExtensionRegistry) -> Self {
        Self {
            registry,
            acc: Combined::empty(),
            section_inputs: HashMap::new(),
            labels: HashSet::new(),
        }
    }

    /// Fold `layer` on top of everything appended so far.
    pub fn append_layer(&mut self, layer: Layer) -> Result<(), PlanError> {
        if !self.labels.insert(layer.label.clone()) {
            return Err(PlanError::LabelExists(layer.label));
        }

        let acc = std::mem::replace(&mut self.acc, Combined::empty());
        self.acc = combine_two(acc, &layer)?;

        let Layer { sections, .. } = layer;
        for (key, section) in sections {
            self.section_inputs.entry(key).or_default().push(section);
        }
        Ok(())
    }

    /// Combine extension sections, default-fill, and validate everything
    /// appended so far. Consumes the manager: there's nothing left to
    /// append once the result has been handed off.
    pub fn into_plan(mut self) -> Result<Plan, PlanError> {
        let mut combined_sections = HashMap::new();
        for key in self.registry.keys_in_order() {
            if let Some(inputs) = self.section_inputs.remove(key) {
                let extension = self.registry.get(key).expect("registered");
                combined_sections.insert(key.to_string(), extension.combine(inputs)?);
            }
        }

        let plan = finalize(self.acc, combined_sections, &self.registry)?;
        validate(&plan, &self.registry)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::parse_layer;

    #[test]
    fn appends_and_combines_layers_in_order() {
        let registry = ExtensionRegistry::new();
        let mut mgr = PlanManager::new(registry.clone());

        let base = parse_layer(
            "base",
            0,
            "services:\n  web:\n    override: replace\n    command: \"run web\"\n",
            &registry,
        )
        .unwrap();
        let overlay = parse_layer(
            "overlay",
            10,
            "services:\n  web:\n    override: replace\n    command: \"run web --flag\"\n",
            &registry,
        )
        .unwrap();

        mgr.append_layer(base).unwrap();
        mgr.append_layer(overlay).unwrap();

        let plan = mgr.into_plan().unwrap();
        assert_eq!(plan.get_service("web").unwrap().command, "run web --flag");
    }

    #[test]
    fn rejects_duplicate_label() {
        let registry = ExtensionRegistry::new();
        let mut mgr = PlanManager::new(registry.clone());

        let first = parse_layer("base", 0, "summary: one\n", &registry).unwrap();
        let second = parse_layer("base", 10, "summary: two\n", &registry).unwrap();

        mgr.append_layer(first).unwrap();
        let err = mgr.append_layer(second).unwrap_err();
        assert!(matches!(err, PlanError::LabelExists(label) if label == "base"));
    }
}
