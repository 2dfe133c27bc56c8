// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layer directory discovery.
//!
//! Layout: `NNN-label.yaml` at the root, and `NNN-label.d/MMM-sublabel.yaml`
//! for an override subdirectory. Effective order is `1000*N` for a root
//! layer and `1000*N + M` for a nested one, so every sublayer of `NNN-*.d`
//! sorts between `NNN` and `NNN+1`.

use crate::error::PlanError;
use crate::extension::ExtensionRegistry;
use crate::label::validate_filename_label;
use crate::layer::{parse_layer, Layer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

struct Entry {
    order: i64,
    label: String,
    path: std::path::PathBuf,
}

/// Parse every `NNN-label.yaml` (and its `NNN-label.d/` overrides) found
/// directly under `dir`, sorted into combine order.
pub fn load_layers(dir: &Path, registry: &ExtensionRegistry) -> Result<Vec<Layer>, PlanError> {
    let mut root_entries = Vec::new();
    let mut seen_prefixes = HashSet::new();
    let mut seen_labels = HashSet::new();

    let mut names: Vec<_> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    names.sort();

    for path in &names {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };

        if path.is_dir() {
            match split_dir_name(file_name) {
                Some((prefix, label)) => {
                    register_prefix(dir, prefix, &mut seen_prefixes)?;
                    register_label(dir, &label, &mut seen_labels)?;
                    let order = prefix as i64 * 1000;
                    for sub in load_sublayers(path, order, &label, registry)? {
                        root_entries.push(sub);
                    }
                }
                None if file_name.ends_with(".d") => {
                    return Err(PlanError::format(
                        file_name,
                        "directory name must match NNN-label.d",
                    ));
                }
                None => {}
            }
            continue;
        }

        match split_yaml_name(file_name) {
            Some((prefix, label)) => {
                register_prefix(dir, prefix, &mut seen_prefixes)?;
                register_label(dir, &label, &mut seen_labels)?;
                validate_filename_label(&label)
                    .map_err(|msg| PlanError::format(&label, msg))?;
                root_entries.push(Entry {
                    order: prefix as i64 * 1000,
                    label,
                    path: path.clone(),
                });
            }
            None if file_name.ends_with(".yaml") || file_name.ends_with(".yml") => {
                return Err(PlanError::format(file_name, "filename must match NNN-label.yaml"));
            }
            None => {}
        }
    }

    root_entries.sort_by_key(|e| e.order);
    let mut layers = Vec::with_capacity(root_entries.len());
    for entry in root_entries {
        let yaml = fs::read_to_string(&entry.path)?;
        layers.push(parse_layer(&entry.label, entry.order, &yaml, registry)?);
    }
    Ok(layers)
}

fn load_sublayers(
    dir: &Path,
    base_order: i64,
    parent_label: &str,
    registry: &ExtensionRegistry,
) -> Result<Vec<Entry>, PlanError> {
    let mut names: Vec<_> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    names.sort();

    let mut seen_prefixes = HashSet::new();
    let mut seen_labels = HashSet::new();
    let mut out = Vec::new();

    for path in &names {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        let (sub_prefix, sub_label) = match split_yaml_name(file_name) {
            Some(parsed) => parsed,
            None if file_name.ends_with(".yaml") || file_name.ends_with(".yml") => {
                return Err(PlanError::format(file_name, "filename must match NNN-label.yaml"));
            }
            None => continue,
        };
        register_prefix(dir, sub_prefix, &mut seen_prefixes)?;
        register_label(dir, &sub_label, &mut seen_labels)?;
        let effective_label = format!("{parent_label}/{sub_label}");
        validate_filename_label(&sub_label)
            .map_err(|msg| PlanError::format(&effective_label, msg))?;
        out.push(Entry {
            order: base_order + sub_prefix as i64,
            label: effective_label,
            path: path.clone(),
        });
    }
    Ok(out)
}

fn register_prefix(
    dir: &Path,
    prefix: u32,
    seen: &mut HashSet<u32>,
) -> Result<(), PlanError> {
    if !seen.insert(prefix) {
        return Err(PlanError::format(
            dir.display().to_string(),
            format!("duplicate numeric prefix {prefix:03}"),
        ));
    }
    Ok(())
}

fn register_label(
    dir: &Path,
    label: &str,
    seen: &mut HashSet<String>,
) -> Result<(), PlanError> {
    if !seen.insert(label.to_string()) {
        return Err(PlanError::LabelExists(label.to_string()));
    }
    let _ = dir;
    Ok(())
}

/// `NNN-label.yaml` -> (NNN, label).
fn split_yaml_name(name: &str) -> Option<(u32, String)> {
    let stem = name.strip_suffix(".yaml").or_else(|| name.strip_suffix(".yml"))?;
    split_prefix(stem)
}

/// `NNN-label.d` -> (NNN, label).
fn split_dir_name(name: &str) -> Option<(u32, String)> {
    let stem = name.strip_suffix(".d")?;
    split_prefix(stem)
}

fn split_prefix(stem: &str) -> Option<(u32, String)> {
    let (prefix, label) = stem.split_once('-')?;
    if prefix.len() != 3 || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let prefix: u32 = prefix.parse().ok()?;
    Some((prefix, label.to_string()))
}
