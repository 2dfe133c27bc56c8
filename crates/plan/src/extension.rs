// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extensible section mechanism: a registry mapping a YAML top-level key
//! to an extension trio `{parse, combine, validate_plan}`. Unknown
//! sections not in the registry are hard errors.

use crate::error::PlanError;
use crate::plan::Plan;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A parsed, opaque section contributed by a registered extension.
pub trait ExtensionSection: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// The trio an extension registers: how to parse one layer's section, how
/// to combine the ordered per-layer sections into one, and an optional
/// plan-wide validator.
pub trait SectionExtension: Send + Sync {
    fn parse(&self, value: serde_yaml::Value) -> Result<Box<dyn ExtensionSection>, PlanError>;

    fn combine(
        &self,
        sections: Vec<Box<dyn ExtensionSection>>,
    ) -> Result<Box<dyn ExtensionSection>, PlanError>;

    fn validate_plan(&self, _plan: &Plan) -> Result<(), PlanError> {
        Ok(())
    }
}

/// Registry of section extensions, keyed by the YAML top-level key they own.
/// Iteration order is registration order, so combine applies extension
/// sections in the order their owners were registered.
#[derive(Default, Clone)]
pub struct ExtensionRegistry {
    order: Vec<String>,
    extensions: HashMap<String, Arc<dyn SectionExtension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, extension: Arc<dyn SectionExtension>) {
        let key = key.into();
        if !self.extensions.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.extensions.insert(key, extension);
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn SectionExtension>> {
        self.extensions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.extensions.contains_key(key)
    }

    pub fn keys_in_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Noop;
    impl ExtensionSection for Noop {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }
    struct NoopExt;
    impl SectionExtension for NoopExt {
        fn parse(&self, _value: serde_yaml::Value) -> Result<Box<dyn ExtensionSection>, PlanError> {
            Ok(Box::new(Noop))
        }
        fn combine(
            &self,
            _sections: Vec<Box<dyn ExtensionSection>>,
        ) -> Result<Box<dyn ExtensionSection>, PlanError> {
            Ok(Box::new(Noop))
        }
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut reg = ExtensionRegistry::new();
        reg.register("beta", Arc::new(NoopExt));
        reg.register("alpha", Arc::new(NoopExt));
        let keys: Vec<&str> = reg.keys_in_order().collect();
        assert_eq!(keys, vec!["beta", "alpha"]);
    }

    #[test]
    fn unknown_key_is_absent() {
        let reg = ExtensionRegistry::new();
        assert!(!reg.contains("anything"));
    }
}
