// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pay items: the priced view of flagged elements.

use boq_lite_core::{ElementId, ElementRecord, ParamKey, ParameterSchema, QuantityBasis};
use serde::Serialize;

use crate::resolver::ResolvedQuantity;

/// Analysis basis as read from the element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum AnalysisBasis {
    Missing,
    Invalid(String),
    Valid(QuantityBasis),
}

/// An element flagged as a pay item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayItem {
    pub element_id: ElementId,
    pub category: String,
    pub family: String,
    pub boq_code: Option<String>,
    pub zone: Option<String>,
    pub work_stage: Option<String>,
    pub basis: QuantityBasis,
    /// Resolved metric quantity; `None` for COMP lines.
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    /// Number of lump-sum units on a COMP line.
    pub quantity_value: Option<f64>,
    pub analysis_basis: AnalysisBasis,
    pub quantity_override: Option<f64>,
    pub multiplier: Option<f64>,
}

impl PayItem {
    /// Derive the pay item for a flagged element; `None` when not flagged.
    pub fn from_element(
        element: &ElementRecord,
        resolved: &ResolvedQuantity,
        schema: &ParameterSchema,
    ) -> Option<Self> {
        if !schema.flag(element, ParamKey::IsPayItem) {
            return None;
        }

        let text = |key| schema.text(element, key).map(str::to_string);
        let analysis_basis = match schema.basis(element, ParamKey::AnalysisBasis) {
            None => AnalysisBasis::Missing,
            Some(Ok(basis)) => AnalysisBasis::Valid(basis),
            Some(Err(_)) => AnalysisBasis::Invalid(text(ParamKey::AnalysisBasis).unwrap_or_default()),
        };

        Some(Self {
            element_id: element.id,
            category: element.category.clone(),
            family: element.family.clone(),
            boq_code: text(ParamKey::BoqCode),
            zone: text(ParamKey::Zone),
            work_stage: text(ParamKey::WorkStage),
            basis: resolved.basis,
            quantity: resolved.value,
            unit_price: schema.number(element, ParamKey::UnitPrice),
            quantity_value: schema.number(element, ParamKey::QuantityValue),
            analysis_basis,
            quantity_override: schema.number(element, ParamKey::QuantityOverride),
            multiplier: resolved.multiplier,
        })
    }

    #[inline]
    pub fn is_lump_sum(&self) -> bool {
        self.basis == QuantityBasis::Comp
    }
}

/// Pay items for a batch; input slices must be parallel.
pub fn collect_pay_items(
    elements: &[ElementRecord],
    resolutions: &[ResolvedQuantity],
    schema: &ParameterSchema,
) -> Vec<PayItem> {
    elements
        .iter()
        .zip(resolutions)
        .filter_map(|(element, resolved)| PayItem::from_element(element, resolved, schema))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TakeoffConfig;
    use crate::resolver::QuantityResolver;
    use boq_lite_core::{NoGeometry, ParamValue};

    #[test]
    fn unflagged_elements_are_not_pay_items() {
        let resolver = QuantityResolver::new(&TakeoffConfig::default()).unwrap();
        let door = ElementRecord::new(1, "Doors");
        let resolved = resolver.resolve(&door, &NoGeometry);
        assert!(PayItem::from_element(&door, &resolved, resolver.schema()).is_none());
    }

    #[test]
    fn lump_sum_line_fields() {
        let resolver = QuantityResolver::new(&TakeoffConfig::default()).unwrap();
        let line = ElementRecord::new(9, "Generic Models")
            .with_param("BOQ_IsPayItem", ParamValue::Bool(true))
            .with_param("BOQ_QtyBasis", ParamValue::text("COMP"))
            .with_param("BOQ_Code", ParamValue::text("03.20"))
            .with_param("BOQ_Zone", ParamValue::text("Z1"))
            .with_param("BOQ_AnalysisBasis", ParamValue::text("area"))
            .with_param("BOQ_UnitPrice", ParamValue::Number(1000.0));
        let resolved = resolver.resolve(&line, &NoGeometry);
        let item = PayItem::from_element(&line, &resolved, resolver.schema()).unwrap();

        assert!(item.is_lump_sum());
        assert_eq!(item.boq_code.as_deref(), Some("03.20"));
        assert_eq!(item.zone.as_deref(), Some("Z1"));
        assert_eq!(item.work_stage, None);
        assert_eq!(item.analysis_basis, AnalysisBasis::Valid(QuantityBasis::Area));
        assert_eq!(item.unit_price, Some(1000.0));
        assert_eq!(item.quantity, None);
    }

    #[test]
    fn invalid_analysis_basis_is_kept() {
        let resolver = QuantityResolver::new(&TakeoffConfig::default()).unwrap();
        let line = ElementRecord::new(9, "Generic Models")
            .with_param("BOQ_IsPayItem", ParamValue::text("yes"))
            .with_param("BOQ_AnalysisBasis", ParamValue::text("tonnes"));
        let resolved = resolver.resolve(&line, &NoGeometry);
        let item = PayItem::from_element(&line, &resolved, resolver.schema()).unwrap();
        assert_eq!(item.analysis_basis, AnalysisBasis::Invalid("tonnes".into()));
    }
}
