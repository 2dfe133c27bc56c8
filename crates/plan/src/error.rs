// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan parsing/combine/validation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("layer {label}: {message}")]
    Format { label: String, message: String },

    #[error("label already exists: {0}")]
    LabelExists(String),

    #[error("duplicate layer order {0}")]
    DuplicateOrder(i64),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlanError {
    pub fn format(label: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::Format {
            label: label.into(),
            message: message.into(),
        }
    }
}

impl From<PlanError> for warden_core::Error {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::LabelExists(label) => warden_core::Error::LabelExists(label),
            other => warden_core::Error::FormatError(other.to_string()),
        }
    }
}
