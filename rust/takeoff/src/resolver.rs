// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantity resolution
//!
//! Decides which basis an element is measured by and computes its metric
//! quantity. Both decisions are fallback chains:
//!
//! - basis: explicit parameter → concrete type override → category default → COUNT
//! - value: computed-quantity parameter → geometry kernel
//!
//! Resolution never fails; anything unexpected becomes a warning on the result.

use boq_lite_core::{
    Dimension, ElementId, ElementRecord, GeometrySource, ParamKey, ParameterSchema,
    QuantityBasis, UnitConverter,
};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::{normalize_category, BasisTable, MultiplierRule, TakeoffConfig};
use crate::error::Result;
use crate::strategy::Chain;

/// Where the basis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisSource {
    Explicit,
    ConcreteOverride,
    CategoryDefault,
    Fallback,
}

/// Where the base value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Parameter,
    Geometry,
    Count,
    /// Neither parameter nor geometry produced a measurement.
    Missing,
    /// Lump-sum line; no physical quantity.
    NotComputed,
}

/// Per-element issue; processing continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    InvalidBasis { value: String },
    NoDefaultBasis { category: String },
    NoMeasurement { basis: QuantityBasis },
    /// Blank category; aggregated under the placeholder category.
    MissingCategory,
}

impl ResolutionWarning {
    /// Whether the element's data was bad, as opposed to an expected
    /// fallback such as an unmapped category counting as 1.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ResolutionWarning::NoDefaultBasis { .. })
    }
}

/// Resolved basis and quantity for one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQuantity {
    pub element_id: ElementId,
    pub basis: QuantityBasis,
    pub basis_source: BasisSource,
    /// Metric quantity; `None` for COMP.
    pub value: Option<f64>,
    pub value_source: ValueSource,
    /// Multiplier that was applied, if any.
    pub multiplier: Option<f64>,
    pub override_applied: bool,
    pub warnings: Vec<ResolutionWarning>,
}

impl ResolvedQuantity {
    /// Quantity if it counts toward `basis` (positive and matching).
    #[inline]
    pub fn quantity_for(&self, basis: QuantityBasis) -> Option<f64> {
        match self.value {
            Some(v) if self.basis == basis && v > 0.0 => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.warnings.iter().any(ResolutionWarning::is_failure)
    }
}

/// Resolutions for a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct ResolutionBatch {
    pub resolutions: Vec<ResolvedQuantity>,
    pub with_warnings: usize,
    /// Elements with at least one failure warning.
    pub failed: usize,
}

/// Why a basis attempt did not apply.
#[derive(Debug, Clone, PartialEq)]
enum BasisMiss {
    NotApplicable,
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ValueMiss;

/// Resolves basis and quantity per element.
#[derive(Debug, Clone)]
pub struct QuantityResolver {
    table: BasisTable,
    schema: ParameterSchema,
    converter: UnitConverter,
    multiplier_rule: MultiplierRule,
    concrete_marker: String,
    concrete_categories: FxHashSet<String>,
}

impl QuantityResolver {
    pub fn new(config: &TakeoffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            config.basis_table()?,
            config.schema()?,
            config.converter(),
            config.multiplier_rule,
            &config.concrete_marker,
            config.concrete_categories.iter().map(String::as_str),
        ))
    }

    pub fn from_parts<'a>(
        table: BasisTable,
        schema: ParameterSchema,
        converter: UnitConverter,
        multiplier_rule: MultiplierRule,
        concrete_marker: &str,
        concrete_categories: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            table,
            schema,
            converter,
            multiplier_rule,
            concrete_marker: concrete_marker.trim().to_uppercase(),
            concrete_categories: concrete_categories
                .into_iter()
                .map(normalize_category)
                .collect(),
        }
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Decide the basis, collecting warnings along the way.
    pub fn resolve_basis(
        &self,
        element: &ElementRecord,
    ) -> (QuantityBasis, BasisSource, Vec<ResolutionWarning>) {
        let chain: Chain<'_, ElementRecord, (QuantityBasis, BasisSource), BasisMiss> = Chain::new()
            .then("explicit", |e| match self.schema.basis(e, ParamKey::QuantityBasis) {
                Some(Ok(basis)) => Ok((basis, BasisSource::Explicit)),
                Some(Err(_)) => Err(BasisMiss::Invalid(
                    self.schema
                        .text(e, ParamKey::QuantityBasis)
                        .unwrap_or_default()
                        .to_string(),
                )),
                None => Err(BasisMiss::NotApplicable),
            })
            .then("concrete", |e| {
                if self.is_concrete(e) {
                    Ok((QuantityBasis::Volume, BasisSource::ConcreteOverride))
                } else {
                    Err(BasisMiss::NotApplicable)
                }
            })
            .then("category", |e| {
                self.table
                    .get(&e.category)
                    .map(|basis| (basis, BasisSource::CategoryDefault))
                    .ok_or(BasisMiss::NotApplicable)
            })
            .then("fallback", |_| Ok((QuantityBasis::Count, BasisSource::Fallback)));

        let outcome = chain.run(element);
        let mut warnings: Vec<ResolutionWarning> = outcome
            .failures
            .iter()
            .filter_map(|(_, miss)| match miss {
                BasisMiss::Invalid(value) => Some(ResolutionWarning::InvalidBasis {
                    value: value.clone(),
                }),
                BasisMiss::NotApplicable => None,
            })
            .collect();

        let (basis, source) = outcome
            .into_value()
            .unwrap_or((QuantityBasis::Count, BasisSource::Fallback));
        if element.category.trim().is_empty() {
            warnings.push(ResolutionWarning::MissingCategory);
        } else if source == BasisSource::Fallback {
            warnings.push(ResolutionWarning::NoDefaultBasis {
                category: element.category.clone(),
            });
        }
        (basis, source, warnings)
    }

    fn is_concrete(&self, element: &ElementRecord) -> bool {
        self.concrete_categories
            .contains(&normalize_category(&element.category))
            && element
                .type_name
                .to_uppercase()
                .contains(self.concrete_marker.as_str())
    }

    /// Resolve basis and metric quantity for one element.
    pub fn resolve(&self, element: &ElementRecord, geometry: &dyn GeometrySource) -> ResolvedQuantity {
        let (basis, basis_source, mut warnings) = self.resolve_basis(element);

        let (base, value_source) = match basis {
            QuantityBasis::Comp => {
                return ResolvedQuantity {
                    element_id: element.id,
                    basis,
                    basis_source,
                    value: None,
                    value_source: ValueSource::NotComputed,
                    multiplier: None,
                    override_applied: false,
                    warnings,
                };
            }
            QuantityBasis::Count => (1.0, ValueSource::Count),
            QuantityBasis::Area => self.measure(element, geometry, Dimension::Area),
            QuantityBasis::Volume => self.measure(element, geometry, Dimension::Volume),
            QuantityBasis::Length => self.measure(element, geometry, Dimension::Length),
        };
        if value_source == ValueSource::Missing {
            warnings.push(ResolutionWarning::NoMeasurement { basis });
        }

        let mut value = base;
        let multiplier = self
            .schema
            .number(element, ParamKey::QuantityMultiplier)
            .filter(|m| self.multiplier_rule.accepts(*m));
        if let Some(m) = multiplier {
            value *= m;
        }

        let override_value = self
            .schema
            .number(element, ParamKey::QuantityOverride)
            .filter(|v| *v > 0.0);
        if let Some(v) = override_value {
            value = v;
        }

        ResolvedQuantity {
            element_id: element.id,
            basis,
            basis_source,
            value: Some(self.converter.round_raw(value)),
            value_source,
            multiplier,
            override_applied: override_value.is_some(),
            warnings,
        }
    }

    /// Metric base value for a physical dimension.
    fn measure(
        &self,
        element: &ElementRecord,
        geometry: &dyn GeometrySource,
        dimension: Dimension,
    ) -> (f64, ValueSource) {
        let key = match dimension {
            Dimension::Area => ParamKey::HostArea,
            Dimension::Volume => ParamKey::HostVolume,
            Dimension::Length => ParamKey::HostLength,
        };

        let chain: Chain<'_, ElementRecord, (f64, ValueSource), ValueMiss> = Chain::new()
            .then("parameter", |e| {
                self.schema
                    .number(e, key)
                    .filter(|v| *v != 0.0)
                    .map(|v| (v, ValueSource::Parameter))
                    .ok_or(ValueMiss)
            })
            .then("geometry", |e| {
                let raw = match dimension {
                    Dimension::Area => geometry.face_area_sum(e),
                    Dimension::Volume => geometry.solid_volume_sum(e),
                    Dimension::Length => geometry.curve_length(e),
                };
                raw.filter(|v| v.is_finite())
                    .map(|v| (v, ValueSource::Geometry))
                    .ok_or(ValueMiss)
            });

        match chain.run(element).into_value() {
            Some((raw, source)) => (self.converter.to_metric(raw, dimension), source),
            None => (0.0, ValueSource::Missing),
        }
    }

    /// Resolve every element, in input order.
    pub fn resolve_all(
        &self,
        elements: &[ElementRecord],
        geometry: &dyn GeometrySource,
    ) -> ResolutionBatch {
        let resolutions: Vec<ResolvedQuantity> = elements
            .iter()
            .map(|element| {
                let resolved = self.resolve(element, geometry);
                for warning in &resolved.warnings {
                    tracing::debug!(element = %element.id, category = %element.category, ?warning, "Resolution warning");
                }
                resolved
            })
            .collect();
        let with_warnings = resolutions.iter().filter(|r| !r.warnings.is_empty()).count();
        let failed = resolutions.iter().filter(|r| r.is_failed()).count();

        tracing::debug!(
            elements = elements.len(),
            with_warnings,
            failed,
            "Resolved quantities"
        );

        ResolutionBatch {
            resolutions,
            with_warnings,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use boq_lite_core::{NoGeometry, ParamValue, RawMeasurementSource, RawMeasurements};

    fn resolver() -> QuantityResolver {
        QuantityResolver::new(&TakeoffConfig::default()).unwrap()
    }

    #[test]
    fn concrete_floor_resolves_to_volume() {
        let floor = ElementRecord::new(1, "Floors").with_type_name("CONC-200");
        let (basis, source, warnings) = resolver().resolve_basis(&floor);
        assert_eq!(basis, QuantityBasis::Volume);
        assert_eq!(source, BasisSource::ConcreteOverride);
        assert!(warnings.is_empty());
    }

    #[test]
    fn concrete_marker_is_case_insensitive_and_category_bound() {
        let wall = ElementRecord::new(1, "Walls").with_type_name("Generic - conc 300");
        assert_eq!(resolver().resolve_basis(&wall).0, QuantityBasis::Volume);

        let roof = ElementRecord::new(2, "Roofs").with_type_name("CONC Slab");
        assert_eq!(resolver().resolve_basis(&roof).0, QuantityBasis::Area);
    }

    #[test]
    fn explicit_basis_wins_over_override() {
        let floor = ElementRecord::new(1, "Floors")
            .with_type_name("CONC-200")
            .with_param("BOQ_QtyBasis", ParamValue::text("area"));
        let (basis, source, _) = resolver().resolve_basis(&floor);
        assert_eq!(basis, QuantityBasis::Area);
        assert_eq!(source, BasisSource::Explicit);
    }

    #[test]
    fn invalid_explicit_basis_falls_through_with_warning() {
        let door = ElementRecord::new(1, "Doors").with_param("BOQ_QtyBasis", ParamValue::text("each"));
        let (basis, source, warnings) = resolver().resolve_basis(&door);
        assert_eq!(basis, QuantityBasis::Count);
        assert_eq!(source, BasisSource::CategoryDefault);
        assert_eq!(
            warnings,
            vec![ResolutionWarning::InvalidBasis {
                value: "each".into()
            }]
        );
    }

    #[test]
    fn unknown_category_defaults_to_one_count() {
        let thing = ElementRecord::new(1, "Furniture");
        let resolved = resolver().resolve(&thing, &NoGeometry);
        assert_eq!(resolved.basis, QuantityBasis::Count);
        assert_eq!(resolved.basis_source, BasisSource::Fallback);
        assert_eq!(resolved.value, Some(1.0));
        assert!(matches!(
            resolved.warnings.as_slice(),
            [ResolutionWarning::NoDefaultBasis { .. }]
        ));
    }

    #[test]
    fn volume_from_host_parameter() {
        let column = ElementRecord::new(1, "Structural Columns")
            .with_param("HOST_VOLUME_COMPUTED", ParamValue::Number(10.0));
        let resolved = resolver().resolve(&column, &NoGeometry);
        assert_eq!(resolved.basis, QuantityBasis::Volume);
        assert_eq!(resolved.value_source, ValueSource::Parameter);
        assert_eq!(resolved.value, Some(0.2832));
    }

    #[test]
    fn zero_parameter_falls_back_to_geometry() {
        let wall = ElementRecord::new(1, "Walls")
            .with_param("HOST_AREA_COMPUTED", ParamValue::Number(0.0))
            .with_measurements(RawMeasurements {
                area: Some(100.0),
                ..Default::default()
            });
        let resolved = resolver().resolve(&wall, &RawMeasurementSource);
        assert_eq!(resolved.value_source, ValueSource::Geometry);
        assert_relative_eq!(resolved.value.unwrap(), 9.2903, epsilon = 1e-9);
    }

    #[test]
    fn missing_measurement_is_zero_with_warning() {
        let railing = ElementRecord::new(1, "Railings");
        let resolved = resolver().resolve(&railing, &NoGeometry);
        assert_eq!(resolved.basis, QuantityBasis::Length);
        assert_eq!(resolved.value, Some(0.0));
        assert_eq!(resolved.value_source, ValueSource::Missing);
        assert_eq!(
            resolved.warnings,
            vec![ResolutionWarning::NoMeasurement {
                basis: QuantityBasis::Length
            }]
        );
    }

    #[test]
    fn multiplier_then_override() {
        let base = ElementRecord::new(1, "Railings")
            .with_param("CURVE_ELEM_LENGTH", ParamValue::Number(10.0))
            .with_param("BOQ_QtyMultiplier", ParamValue::Number(2.0));
        let resolved = resolver().resolve(&base, &NoGeometry);
        assert_eq!(resolved.multiplier, Some(2.0));
        assert_relative_eq!(resolved.value.unwrap(), 6.096, epsilon = 1e-9);

        let overridden = base
            .clone()
            .with_param("BOQ_QtyOverride", ParamValue::Number(42.0));
        let resolved = resolver().resolve(&overridden, &NoGeometry);
        assert!(resolved.override_applied);
        assert_eq!(resolved.value, Some(42.0));
    }

    #[test]
    fn identity_and_negative_multipliers_are_ignored() {
        for m in [1.0, 0.0, -2.0] {
            let door = ElementRecord::new(1, "Doors")
                .with_param("BOQ_QtyMultiplier", ParamValue::Number(m))
                .with_param("BOQ_QtyOverride", ParamValue::Number(-5.0));
            let resolved = resolver().resolve(&door, &NoGeometry);
            assert_eq!(resolved.multiplier, None);
            assert!(!resolved.override_applied);
            assert_eq!(resolved.value, Some(1.0));
        }
    }

    #[test]
    fn comp_is_not_computed() {
        let line = ElementRecord::new(1, "Generic Models")
            .with_param("BOQ_QtyBasis", ParamValue::text("COMP"))
            .with_param("BOQ_QtyOverride", ParamValue::Number(3.0));
        let resolved = resolver().resolve(&line, &NoGeometry);
        assert_eq!(resolved.basis, QuantityBasis::Comp);
        assert_eq!(resolved.value, None);
        assert_eq!(resolved.value_source, ValueSource::NotComputed);
        assert!(!resolved.override_applied);
    }

    #[test]
    fn resolution_is_idempotent() {
        let wall = ElementRecord::new(1, "Walls")
            .with_type_name("Brick")
            .with_param("BOQ_QtyMultiplier", ParamValue::Number(1.5))
            .with_measurements(RawMeasurements {
                area: Some(37.3),
                ..Default::default()
            });
        let r = resolver();
        assert_eq!(
            r.resolve(&wall, &RawMeasurementSource),
            r.resolve(&wall, &RawMeasurementSource)
        );
    }

    #[test]
    fn resolve_all_counts_warnings() {
        let elements = vec![
            ElementRecord::new(1, "Doors"),
            ElementRecord::new(2, "Furniture"),
            ElementRecord::new(3, "Railings"),
        ];
        let batch = resolver().resolve_all(&elements, &NoGeometry);
        assert_eq!(batch.resolutions.len(), 3);
        assert_eq!(batch.with_warnings, 2);
        // Furniture falls back to COUNT; only the unmeasured railing failed.
        assert_eq!(batch.failed, 1);
        assert!(!batch.resolutions[1].is_failed());
        assert!(batch.resolutions[2].is_failed());
        assert_eq!(batch.resolutions[0].element_id, ElementId(1));
    }

    #[test]
    fn blank_category_is_a_failure() {
        let element = ElementRecord::new(7, "  ");
        let resolved = resolver().resolve(&element, &NoGeometry);
        assert_eq!(resolved.basis, QuantityBasis::Count);
        assert_eq!(resolved.value, Some(1.0));
        assert_eq!(resolved.warnings, vec![ResolutionWarning::MissingCategory]);
        assert!(resolved.is_failed());
    }
}
