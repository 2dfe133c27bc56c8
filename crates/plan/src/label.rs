// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layer label validation.

use regex::Regex;
use std::sync::OnceLock;

/// Reserved label prefix: no layer may use this namespace for its own label.
pub const RESERVED_LABEL_PREFIX: &str = "warden-";

/// Reserved log-target label key prefix.
pub const RESERVED_LOG_LABEL_PREFIX: &str = "warden_";

static LABEL_REGEX: OnceLock<Regex> = OnceLock::new();

fn label_regex() -> &'static Regex {
    LABEL_REGEX.get_or_init(|| Regex::new(r"^[a-z](-?[a-z0-9]){2,}$").expect("valid regex"))
}

pub fn validate_label(label: &str) -> Result<(), String> {
    if label.starts_with(RESERVED_LABEL_PREFIX) {
        return Err(format!(
            "label '{label}' must not start with reserved prefix '{RESERVED_LABEL_PREFIX}'"
        ));
    }
    Ok(())
}

/// Validate a label sourced from a filename against
/// `^[a-z](-?[a-z0-9]){2,}$`.
pub fn validate_filename_label(label: &str) -> Result<(), String> {
    validate_label(label)?;
    if !label_regex().is_match(label) {
        return Err(format!(
            "label '{label}' does not match required pattern ^[a-z](-?[a-z0-9]){{2,}}$"
        ));
    }
    Ok(())
}
