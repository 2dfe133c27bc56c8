// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy for the check supervisor core.
//!
//! Every crate in the workspace converts its local errors into this enum at
//! its public seams via `#[from]`, so callers (tests, the daemon) see one
//! error type regardless of which layer raised it.

use std::time::Duration;
use thiserror::Error;

/// Error kinds, not type names: each variant is the outward-facing
/// category a caller matches on, independent of where it was raised.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema or validation problem in a layer or the combined plan.
    #[error("{0}")]
    FormatError(String),

    /// Appending a layer whose label is already in use.
    #[error("label already exists: {0}")]
    LabelExists(String),

    /// A lookup targeted names that aren't configured.
    #[error("not found: {0:?}")]
    NotFound(Vec<String>),

    /// A probe returned a non-success result.
    #[error("{message}")]
    CheckFailure {
        message: String,
        details: Option<String>,
    },

    /// Normalized form of a deadline-exceeded probe.
    #[error("check timed out after {}", humantime_like(*.0))]
    CheckTimeout(Duration),

    /// Context/tomb cancellation. Never surfaced as a check failure.
    #[error("cancelled")]
    Cancelled,

    /// Invariant violation; treated as fatal by callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn details(&self) -> Option<&str> {
        match self {
            Error::CheckFailure { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Render a `Duration` as `"25ms"`, `"1s"`, and so on, without pulling in
/// a formatting crate.
pub fn humantime_like(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 == 0 && ms > 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_renders_milliseconds() {
        let err = Error::CheckTimeout(Duration::from_millis(25));
        assert_eq!(err.to_string(), "check timed out after 25ms");
    }

    #[test]
    fn timeout_message_whole_seconds() {
        let err = Error::CheckTimeout(Duration::from_secs(1));
        assert_eq!(err.to_string(), "check timed out after 1s");
    }

    #[test]
    fn check_failure_carries_details() {
        let err = Error::CheckFailure {
            message: "exit status 1".into(),
            details: Some("(...)\nboom".into()),
        };
        assert_eq!(err.details(), Some("(...)\nboom"));
    }
}
