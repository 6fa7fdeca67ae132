// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON element snapshots exchanged with the host.

use std::path::Path;

use boq_lite_core::ElementRecord;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A point-in-time read of the host model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Free-form origin label (e.g., "export" or "schedule").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub elements: Vec<ElementRecord>,
}

impl ElementSnapshot {
    pub fn new(elements: Vec<ElementRecord>) -> Self {
        Self {
            source: None,
            elements,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            elements = snapshot.elements.len(),
            "Loaded element snapshot"
        );
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
