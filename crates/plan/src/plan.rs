// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The combined plan.

use crate::error::PlanError;
use crate::extension::ExtensionSection;
use crate::types::{CheckConfig, LogTargetConfig, ServiceConfig};
use serde::Serialize;
use std::collections::HashMap;

/// A combined view assembled from an ordered list of layers.
pub struct Plan {
    pub summary: String,
    pub description: String,
    pub services: HashMap<String, ServiceConfig>,
    pub checks: HashMap<String, CheckConfig>,
    pub log_targets: HashMap<String, LogTargetConfig>,
    pub sections: HashMap<String, Box<dyn ExtensionSection>>,
}

/// The serializable subset of a [`Plan`]: everything but extension
/// sections, which aren't generically representable.
#[derive(Serialize)]
struct PlanDocument<'a> {
    summary: &'a str,
    description: &'a str,
    services: &'a HashMap<String, ServiceConfig>,
    checks: &'a HashMap<String, CheckConfig>,
    #[serde(rename = "log-targets")]
    log_targets: &'a HashMap<String, LogTargetConfig>,
}

impl Plan {
    pub fn empty() -> Self {
        Self {
            summary: String::new(),
            description: String::new(),
            services: HashMap::new(),
            checks: HashMap::new(),
            log_targets: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    pub fn get_check(&self, name: &str) -> Option<&CheckConfig> {
        self.checks.get(name)
    }

    pub fn get_service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }

    /// Re-marshal the combined services/checks/log-targets back to YAML,
    /// with durations in their canonical spelling. Extension sections are
    /// omitted: they aren't generically serializable.
    pub fn to_yaml(&self) -> Result<String, PlanError> {
        let doc = PlanDocument {
            summary: &self.summary,
            description: &self.description,
            services: &self.services,
            checks: &self.checks,
            log_targets: &self.log_targets,
        };
        Ok(serde_yaml::to_string(&doc)?)
    }
}
