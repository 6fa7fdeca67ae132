// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed parameter schema
//!
//! Maps the parameters the takeoff reads to the names they carry in the host
//! model, so the engine asks for `ParamKey::UnitPrice` and never for a raw
//! string.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::basis::QuantityBasis;
use crate::element::ElementRecord;
use crate::error::{Error, Result};

/// Parameters known to the takeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    IsPayItem,
    BoqCode,
    Zone,
    WorkStage,
    QuantityBasis,
    AnalysisBasis,
    UnitPrice,
    QuantityValue,
    QuantityOverride,
    QuantityMultiplier,
    HostVolume,
    HostArea,
    HostLength,
}

impl ParamKey {
    pub const ALL: [ParamKey; 13] = [
        ParamKey::IsPayItem,
        ParamKey::BoqCode,
        ParamKey::Zone,
        ParamKey::WorkStage,
        ParamKey::QuantityBasis,
        ParamKey::AnalysisBasis,
        ParamKey::UnitPrice,
        ParamKey::QuantityValue,
        ParamKey::QuantityOverride,
        ParamKey::QuantityMultiplier,
        ParamKey::HostVolume,
        ParamKey::HostArea,
        ParamKey::HostLength,
    ];

    /// Name of the shared parameter in the host model.
    pub fn default_name(&self) -> &'static str {
        match self {
            ParamKey::IsPayItem => "BOQ_IsPayItem",
            ParamKey::BoqCode => "BOQ_Code",
            ParamKey::Zone => "BOQ_Zone",
            ParamKey::WorkStage => "BOQ_WorkStage",
            ParamKey::QuantityBasis => "BOQ_QtyBasis",
            ParamKey::AnalysisBasis => "BOQ_AnalysisBasis",
            ParamKey::UnitPrice => "BOQ_UnitPrice",
            ParamKey::QuantityValue => "BOQ_QtyValue",
            ParamKey::QuantityOverride => "BOQ_QtyOverride",
            ParamKey::QuantityMultiplier => "BOQ_QtyMultiplier",
            // Built-in host parameters, internal units
            ParamKey::HostVolume => "HOST_VOLUME_COMPUTED",
            ParamKey::HostArea => "HOST_AREA_COMPUTED",
            ParamKey::HostLength => "CURVE_ELEM_LENGTH",
        }
    }
}

/// Parameter key to host name mapping with typed accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    names: FxHashMap<ParamKey, String>,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        let names = ParamKey::ALL
            .iter()
            .map(|key| (*key, key.default_name().to_string()))
            .collect();
        Self { names }
    }
}

impl ParameterSchema {
    /// Default names with the given overrides applied.
    ///
    /// Two keys mapped to the same host name is a configuration error.
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a ParamKey, &'a String)>,
    {
        let mut schema = Self::default();
        for (key, name) in overrides {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::config(format!("empty parameter name for {:?}", key)));
            }
            schema.names.insert(*key, name.to_string());
        }

        let mut seen: FxHashMap<&str, ParamKey> = FxHashMap::default();
        for key in ParamKey::ALL {
            let name = schema.name(key);
            if let Some(previous) = seen.insert(name, key) {
                return Err(Error::config(format!(
                    "parameter name {:?} is used by both {:?} and {:?}",
                    name, previous, key
                )));
            }
        }
        Ok(schema)
    }

    /// Host name of a key.
    pub fn name(&self, key: ParamKey) -> &str {
        self.names
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_name())
    }

    pub fn text<'e>(&self, element: &'e ElementRecord, key: ParamKey) -> Option<&'e str> {
        element.param(self.name(key)).and_then(|v| v.as_text())
    }

    pub fn number(&self, element: &ElementRecord, key: ParamKey) -> Option<f64> {
        element.param(self.name(key)).and_then(|v| v.as_number())
    }

    pub fn flag(&self, element: &ElementRecord, key: ParamKey) -> bool {
        element
            .param(self.name(key))
            .and_then(|v| v.as_flag())
            .unwrap_or(false)
    }

    /// Basis parameter: `None` when absent, `Some(Err)` when present but invalid.
    pub fn basis(&self, element: &ElementRecord, key: ParamKey) -> Option<Result<QuantityBasis>> {
        self.text(element, key)
            .map(|text| text.parse::<QuantityBasis>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ParamValue;
    use std::collections::BTreeMap;

    #[test]
    fn default_names() {
        let schema = ParameterSchema::default();
        assert_eq!(schema.name(ParamKey::UnitPrice), "BOQ_UnitPrice");
        assert_eq!(schema.name(ParamKey::HostVolume), "HOST_VOLUME_COMPUTED");
    }

    #[test]
    fn typed_accessors() {
        let schema = ParameterSchema::default();
        let element = ElementRecord::new(1, "Walls")
            .with_param("BOQ_UnitPrice", ParamValue::text("125.5"))
            .with_param("BOQ_IsPayItem", ParamValue::Number(1.0))
            .with_param("BOQ_QtyBasis", ParamValue::text("volume"))
            .with_param("BOQ_AnalysisBasis", ParamValue::text("weight"));

        assert_eq!(schema.number(&element, ParamKey::UnitPrice), Some(125.5));
        assert!(schema.flag(&element, ParamKey::IsPayItem));
        assert_eq!(
            schema.basis(&element, ParamKey::QuantityBasis),
            Some(Ok(QuantityBasis::Volume))
        );
        assert!(matches!(
            schema.basis(&element, ParamKey::AnalysisBasis),
            Some(Err(Error::InvalidBasis(_)))
        ));
        assert_eq!(schema.basis(&element, ParamKey::BoqCode), None);
    }

    #[test]
    fn overrides_rename_parameters() {
        let mut overrides = BTreeMap::new();
        overrides.insert(ParamKey::UnitPrice, "Rate".to_string());
        let schema = ParameterSchema::with_overrides(&overrides).unwrap();
        let element = ElementRecord::new(1, "Walls").with_param("Rate", ParamValue::Number(9.0));
        assert_eq!(schema.number(&element, ParamKey::UnitPrice), Some(9.0));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut overrides = BTreeMap::new();
        overrides.insert(ParamKey::UnitPrice, "BOQ_Code".to_string());
        assert!(matches!(
            ParameterSchema::with_overrides(&overrides),
            Err(Error::Config(_))
        ));
    }
}
