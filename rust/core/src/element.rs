// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element records read from the host model.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Opaque host element identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Reference {
        #[serde(rename = "ref")]
        id: ElementId,
    },
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }

    pub fn reference(id: u64) -> Self {
        ParamValue::Reference { id: ElementId(id) }
    }

    /// Numeric view; numeric text is accepted.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) if n.is_finite() => Some(*n),
            ParamValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Text view; empty text counts as absent.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Yes/no view as hosts store flags: bool, 0/1 integers or text.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Number(n) => Some(*n != 0.0),
            ParamValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "yes" | "true" | "1" | "y" => Some(true),
                "no" | "false" | "0" | "n" | "" => Some(false),
                _ => None,
            },
            ParamValue::Reference { .. } => None,
        }
    }

    pub fn as_reference(&self) -> Option<ElementId> {
        match self {
            ParamValue::Reference { id } => Some(*id),
            _ => None,
        }
    }
}

/// Raw geometric measurements in internal units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

/// One element of the host model, captured during an extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: ElementId,
    /// Host category name (e.g., "Walls").
    pub category: String,
    /// Family name (e.g., "Basic Wall").
    #[serde(default)]
    pub family: String,
    /// Type name (e.g., "CONC-200").
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub parameters: FxHashMap<String, ParamValue>,
    #[serde(default)]
    pub measurements: RawMeasurements,
}

impl ElementRecord {
    pub fn new(id: u64, category: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            category: category.into(),
            family: String::new(),
            type_name: String::new(),
            parameters: FxHashMap::default(),
            measurements: RawMeasurements::default(),
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_measurements(mut self, measurements: RawMeasurements) -> Self {
        self.measurements = measurements;
        self
    }

    /// Look up a parameter by its host name.
    #[inline]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_views() {
        assert_eq!(ParamValue::Number(2.5).as_number(), Some(2.5));
        assert_eq!(ParamValue::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(ParamValue::text("abc").as_number(), None);
        assert_eq!(ParamValue::Number(f64::NAN).as_number(), None);
        assert_eq!(ParamValue::Bool(true).as_number(), None);
    }

    #[test]
    fn flag_views() {
        assert_eq!(ParamValue::Bool(true).as_flag(), Some(true));
        assert_eq!(ParamValue::Number(0.0).as_flag(), Some(false));
        assert_eq!(ParamValue::text("Yes").as_flag(), Some(true));
        assert_eq!(ParamValue::text("maybe").as_flag(), None);
        assert_eq!(ParamValue::reference(7).as_flag(), None);
    }

    #[test]
    fn empty_text_is_absent() {
        assert_eq!(ParamValue::text("   ").as_text(), None);
        assert_eq!(ParamValue::text(" B-01 ").as_text(), Some("B-01"));
    }

    #[test]
    fn deserializes_untagged_values() {
        let json = r#"{
            "id": 42,
            "category": "Walls",
            "type_name": "CONC-200",
            "parameters": {
                "BOQ_IsPayItem": true,
                "BOQ_Code": "03.10",
                "HOST_VOLUME_COMPUTED": 10.0,
                "Host": { "ref": 7 }
            },
            "measurements": { "area": 12.0 }
        }"#;
        let element: ElementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(element.id, ElementId(42));
        assert_eq!(element.family, "");
        assert_eq!(element.param("BOQ_IsPayItem"), Some(&ParamValue::Bool(true)));
        assert_eq!(element.param("BOQ_Code"), Some(&ParamValue::text("03.10")));
        assert_eq!(
            element.param("HOST_VOLUME_COMPUTED"),
            Some(&ParamValue::Number(10.0))
        );
        assert_eq!(
            element.param("Host").and_then(ParamValue::as_reference),
            Some(ElementId(7))
        );
        assert_eq!(element.measurements.area, Some(12.0));
        assert_eq!(element.measurements.volume, None);
    }
}
