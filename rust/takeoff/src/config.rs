// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Takeoff configuration
//!
//! Defaults reproduce the behavior hosts have always seen (0.1 tolerance,
//! five family rows, multiplier applied when > 0 and ≠ 1). A JSON file can
//! replace any field, and environment variables are overlaid last.

use std::collections::BTreeMap;
use std::path::Path;

use boq_lite_core::{
    Error as CoreError, ParamKey, ParameterSchema, QuantityBasis, UnitConverter, FEET_TO_METERS,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TakeoffError};

/// When an explicit quantity multiplier takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierRule {
    /// Ignore zero and negative multipliers.
    pub require_positive: bool,
    /// Treat exactly 1.0 as "no multiplier".
    pub skip_identity: bool,
}

impl Default for MultiplierRule {
    fn default() -> Self {
        Self {
            require_positive: true,
            skip_identity: true,
        }
    }
}

impl MultiplierRule {
    pub fn accepts(&self, multiplier: f64) -> bool {
        if !multiplier.is_finite() {
            return false;
        }
        if self.require_positive && multiplier <= 0.0 {
            return false;
        }
        !(self.skip_identity && multiplier == 1.0)
    }
}

/// Category to default basis lookup, case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisTable {
    entries: FxHashMap<String, QuantityBasis>,
}

impl BasisTable {
    /// Build a table; the same category listed twice with different bases
    /// (ignoring case) is a configuration error.
    pub fn from_entries<'a, I>(entries: I) -> std::result::Result<Self, CoreError>
    where
        I: IntoIterator<Item = (&'a String, &'a QuantityBasis)>,
    {
        let mut table = FxHashMap::default();
        for (category, basis) in entries {
            let key = normalize_category(category);
            if key.is_empty() {
                return Err(CoreError::config("empty category in basis table"));
            }
            if let Some(previous) = table.insert(key, *basis) {
                if previous != *basis {
                    return Err(CoreError::config(format!(
                        "category {:?} maps to both {} and {}",
                        category, previous, basis
                    )));
                }
            }
        }
        Ok(Self { entries: table })
    }

    pub fn get(&self, category: &str) -> Option<QuantityBasis> {
        self.entries.get(&normalize_category(category)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[inline]
pub(crate) fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Default category table, including the host's display names.
pub fn default_basis_table() -> BTreeMap<String, QuantityBasis> {
    const ENTRIES: &[(&str, QuantityBasis)] = &[
        ("Floors", QuantityBasis::Area),
        ("Walls", QuantityBasis::Area),
        ("Roofs", QuantityBasis::Area),
        ("Ceilings", QuantityBasis::Area),
        ("Ramps", QuantityBasis::Area),
        ("Foundations", QuantityBasis::Volume),
        ("Structural Foundations", QuantityBasis::Volume),
        ("Columns", QuantityBasis::Volume),
        ("Structural Columns", QuantityBasis::Volume),
        ("Framing", QuantityBasis::Volume),
        ("Structural Framing", QuantityBasis::Volume),
        ("Doors", QuantityBasis::Count),
        ("Windows", QuantityBasis::Count),
        ("Stairs", QuantityBasis::Count),
        ("Generic", QuantityBasis::Count),
        ("Generic Models", QuantityBasis::Count),
        ("Railings", QuantityBasis::Length),
        ("Mullions", QuantityBasis::Length),
        ("Curtain Wall Mullions", QuantityBasis::Length),
    ];
    ENTRIES
        .iter()
        .map(|(category, basis)| (category.to_string(), *basis))
        .collect()
}

/// Complete takeoff configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoffConfig {
    /// Discrepancy tolerance, in the metric unit of each dimension.
    pub tolerance: f64,
    /// Family rows reported per mismatching category.
    pub family_row_cap: usize,
    /// Decimals for per-element values.
    pub raw_precision: u32,
    /// Decimals for aggregated values.
    pub display_precision: u32,
    /// Meters per internal length unit.
    pub length_factor: f64,
    pub multiplier_rule: MultiplierRule,
    /// Type-name marker that forces VOLUME on concrete-capable categories.
    pub concrete_marker: String,
    pub concrete_categories: Vec<String>,
    pub basis_table: BTreeMap<String, QuantityBasis>,
    /// Host parameter names that differ from the defaults.
    pub parameter_names: BTreeMap<ParamKey, String>,
}

impl Default for TakeoffConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            family_row_cap: 5,
            raw_precision: boq_lite_core::RAW_PRECISION,
            display_precision: boq_lite_core::DISPLAY_PRECISION,
            length_factor: FEET_TO_METERS,
            multiplier_rule: MultiplierRule::default(),
            concrete_marker: "CONC".into(),
            concrete_categories: vec!["Floors".into(), "Walls".into()],
            basis_table: default_basis_table(),
            parameter_names: BTreeMap::new(),
        }
    }
}

impl TakeoffConfig {
    /// Defaults with environment overrides.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse a JSON configuration; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Overlay `BOQ_*` environment variables. Unparsable values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Overlay `BOQ_*` values from `lookup`, which returns a variable's raw
    /// value or `None` when unset.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.tolerance = override_or(&lookup, "BOQ_TOLERANCE", self.tolerance);
        self.family_row_cap = override_or(&lookup, "BOQ_FAMILY_ROW_CAP", self.family_row_cap);
        self.raw_precision = override_or(&lookup, "BOQ_RAW_PRECISION", self.raw_precision);
        self.display_precision =
            override_or(&lookup, "BOQ_DISPLAY_PRECISION", self.display_precision);
        self.length_factor = override_or(&lookup, "BOQ_LENGTH_FACTOR", self.length_factor);
        self.concrete_marker = lookup("BOQ_CONCRETE_MARKER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(self.concrete_marker);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(TakeoffError::invalid_config(
                "tolerance",
                format!("must be a non-negative number, got {}", self.tolerance),
            ));
        }
        if !self.length_factor.is_finite() || self.length_factor <= 0.0 {
            return Err(TakeoffError::invalid_config(
                "length_factor",
                format!("must be positive, got {}", self.length_factor),
            ));
        }
        for (field, value) in [
            ("raw_precision", self.raw_precision),
            ("display_precision", self.display_precision),
        ] {
            if value > 12 {
                return Err(TakeoffError::invalid_config(
                    field,
                    format!("at most 12 decimals, got {}", value),
                ));
            }
        }
        if self.concrete_marker.trim().is_empty() {
            return Err(TakeoffError::invalid_config("concrete_marker", "must not be empty"));
        }
        Ok(())
    }

    pub fn converter(&self) -> UnitConverter {
        UnitConverter {
            length_factor: self.length_factor,
            raw_precision: self.raw_precision,
            display_precision: self.display_precision,
        }
    }

    pub fn basis_table(&self) -> Result<BasisTable> {
        Ok(BasisTable::from_entries(&self.basis_table)?)
    }

    pub fn schema(&self) -> Result<ParameterSchema> {
        Ok(ParameterSchema::with_overrides(&self.parameter_names)?)
    }
}

fn override_or<T, F>(lookup: &F, name: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => {
            tracing::debug!(var = name, value = %raw.trim(), "Config override from environment");
            value
        }
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparsable environment override");
            default
        }
    }
}
