// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered YAML plan model: parse, combine, validate.

mod combine;
mod discover;
mod duration;
mod error;
mod extension;
mod label;
mod layer;
mod plan;
mod plan_manager;
mod raw;
mod types;
mod validate;

pub use combine::{combine_layers, Combined};
pub use discover::load_layers;
pub use duration::{format_duration, parse_duration};
pub use error::PlanError;
pub use extension::{ExtensionRegistry, ExtensionSection, SectionExtension};
pub use label::{
    validate_filename_label, validate_label, RESERVED_LABEL_PREFIX, RESERVED_LOG_LABEL_PREFIX,
};
pub use layer::{parse_layer, Layer};
pub use plan::Plan;
pub use plan_manager::PlanManager;
pub use raw::{Mergeable, RawCheckEntry, RawExecCheck, RawHttpCheck, RawLogTargetEntry, RawServiceEntry, RawTcpCheck};
pub use types::{
    CheckConfig, CheckKind, CheckLevel, ExecCheck, HttpCheck, LogTargetConfig, LogTargetType,
    Override, ServiceConfig, Startup, TcpCheck, DEFAULT_PERIOD, DEFAULT_TCP_HOST,
    DEFAULT_THRESHOLD, DEFAULT_TIMEOUT,
};
pub use validate::validate;

/// Load, combine, and validate a full layer directory in one call.
pub fn load_plan(
    dir: &std::path::Path,
    registry: &ExtensionRegistry,
) -> Result<Plan, PlanError> {
    let layers = load_layers(dir, registry)?;
    let plan = combine_layers(layers, registry)?;
    validate(&plan, registry)?;
    Ok(plan)
}
