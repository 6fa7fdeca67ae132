// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Effective unit prices for lump-sum (COMP) pay lines.
//!
//! A COMP line is priced as a whole. Dividing its contract value by the
//! physical quantity booked under the same BOQ code and analysis basis gives
//! the implied price per unit. Problems are recorded per line; the batch
//! always completes.

use boq_lite_core::{ElementId, QuantityBasis};
use serde::Serialize;

use crate::aggregate::{physical_quantities, PhysicalQuantities};
use crate::pay_item::{AnalysisBasis, PayItem};

/// Why a COMP line could not be priced.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PricingIssue {
    #[error("missing BOQ code")]
    MissingBoqCode,
    #[error("missing analysis basis")]
    MissingAnalysisBasis,
    #[error("invalid analysis basis {0:?}")]
    InvalidAnalysisBasis(String),
    #[error("missing unit price")]
    MissingUnitPrice,
    #[error("unit price must be positive, got {0}")]
    NonPositiveUnitPrice(f64),
}

/// A COMP line that could not be priced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingError {
    pub element_id: ElementId,
    pub boq_code: Option<String>,
    pub issue: PricingIssue,
}

/// A priced COMP line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLine {
    pub element_id: ElementId,
    pub boq_code: String,
    pub analysis_basis: QuantityBasis,
    pub contract_value: f64,
    /// 0 when no physical quantity is booked under the code and basis yet.
    pub effective_unit_price: f64,
    pub sum_qty: f64,
}

/// Results of a pricing pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingOutcome {
    pub lines: Vec<PricedLine>,
    pub errors: Vec<PricingError>,
}

impl PricingOutcome {
    pub fn succeeded(&self) -> usize {
        self.lines.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

/// Stateless pass over pay items.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveUnitPriceCalculator;

impl EffectiveUnitPriceCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Price every COMP line in `items` against the non-COMP lines in `items`.
    pub fn calculate(&self, items: &[PayItem]) -> PricingOutcome {
        let physical = physical_quantities(items);
        self.calculate_with(items, &physical)
    }

    /// Price COMP lines against precomputed physical quantities.
    pub fn calculate_with(&self, items: &[PayItem], physical: &PhysicalQuantities) -> PricingOutcome {
        let mut outcome = PricingOutcome::default();
        for item in items.iter().filter(|item| item.is_lump_sum()) {
            match self.price_line(item, physical) {
                Ok(line) => outcome.lines.push(line),
                Err(issue) => {
                    tracing::warn!(
                        element = %item.element_id,
                        boq_code = ?item.boq_code,
                        %issue,
                        "Skipping lump-sum line"
                    );
                    outcome.errors.push(PricingError {
                        element_id: item.element_id,
                        boq_code: item.boq_code.clone(),
                        issue,
                    });
                }
            }
        }

        tracing::debug!(
            priced = outcome.succeeded(),
            failed = outcome.failed(),
            "Lump-sum pricing complete"
        );
        outcome
    }

    /// Price one COMP line.
    pub fn price_line(
        &self,
        item: &PayItem,
        physical: &PhysicalQuantities,
    ) -> Result<PricedLine, PricingIssue> {
        let boq_code = item
            .boq_code
            .as_deref()
            .ok_or(PricingIssue::MissingBoqCode)?;

        let analysis_basis = match &item.analysis_basis {
            AnalysisBasis::Valid(basis) if basis.is_analysis_basis() => *basis,
            AnalysisBasis::Valid(basis) => {
                return Err(PricingIssue::InvalidAnalysisBasis(basis.to_string()))
            }
            AnalysisBasis::Invalid(text) => {
                return Err(PricingIssue::InvalidAnalysisBasis(text.clone()))
            }
            AnalysisBasis::Missing => return Err(PricingIssue::MissingAnalysisBasis),
        };

        let unit_price = item.unit_price.ok_or(PricingIssue::MissingUnitPrice)?;
        if !unit_price.is_finite() || unit_price <= 0.0 {
            return Err(PricingIssue::NonPositiveUnitPrice(unit_price));
        }

        let quantity_value = item
            .quantity_value
            .filter(|q| q.is_finite() && *q > 0.0)
            .unwrap_or(1.0);
        let contract_value = unit_price * quantity_value;

        let sum_qty = physical
            .get(boq_code)
            .and_then(|by_basis| by_basis.get(&analysis_basis))
            .copied()
            .unwrap_or(0.0);
        let effective_unit_price = if sum_qty > 0.0 {
            contract_value / sum_qty
        } else {
            0.0
        };

        Ok(PricedLine {
            element_id: item.element_id,
            boq_code: boq_code.to_string(),
            analysis_basis,
            contract_value,
            effective_unit_price,
            sum_qty,
        })
    }
}
