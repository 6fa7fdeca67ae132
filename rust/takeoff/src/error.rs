// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the takeoff pipeline.

use thiserror::Error;

/// Result type alias for takeoff operations.
pub type Result<T> = std::result::Result<T, TakeoffError>;

/// Errors surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum TakeoffError {
    #[error(transparent)]
    Core(#[from] boq_lite_core::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write-back rejected: {0}")]
    WriteBack(String),
}

impl TakeoffError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        TakeoffError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
