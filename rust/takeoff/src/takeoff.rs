// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Takeoff pipeline: resolve → pay items → aggregate → price.

use boq_lite_core::{ElementRecord, GeometrySource};
use serde::Serialize;

use crate::aggregate::{
    by_boq_code, finalize, physical_quantities, AggregateMap, AggregateTable, PhysicalQuantities,
};
use crate::config::TakeoffConfig;
use crate::error::Result;
use crate::pay_item::{collect_pay_items, PayItem};
use crate::pricing::{EffectiveUnitPriceCalculator, PricingOutcome};
use crate::resolver::{QuantityResolver, ResolvedQuantity};
use crate::validate::{CrossValidator, ValidationReport};
use crate::writeback::{updates_for, QuantitySink, QuantityUpdate};

/// Counts reported back to the caller after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub elements: usize,
    /// Elements resolved without a failure; unmapped categories counted as 1
    /// are included.
    pub succeeded: usize,
    /// Lump-sum lines left unpriced because of a per-line problem.
    pub skipped: usize,
    /// Elements with bad data: invalid basis, no measurement or blank
    /// category. They are still aggregated.
    pub failed: usize,
    pub pay_items: usize,
    pub priced: usize,
}

/// Everything computed from one element snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TakeoffRun {
    pub resolutions: Vec<ResolvedQuantity>,
    pub pay_items: Vec<PayItem>,
    pub table: AggregateTable,
    pub by_boq_code: AggregateMap<String>,
    pub physical: PhysicalQuantities,
    pub pricing: PricingOutcome,
    pub summary: BatchSummary,
}

impl TakeoffRun {
    pub fn updates(&self) -> Vec<QuantityUpdate> {
        updates_for(&self.resolutions)
    }

    /// Hand all updates to `sink` as one batch.
    pub fn write_back(&self, sink: &mut dyn QuantitySink) -> Result<()> {
        let updates = self.updates();
        sink.commit(&updates)?;
        tracing::info!(updates = updates.len(), "Committed quantity updates");
        Ok(())
    }
}

/// Configured takeoff engine.
#[derive(Debug, Clone)]
pub struct Takeoff {
    config: TakeoffConfig,
    resolver: QuantityResolver,
    validator: CrossValidator,
    pricing: EffectiveUnitPriceCalculator,
}

impl Takeoff {
    pub fn new(config: TakeoffConfig) -> Result<Self> {
        config.validate()?;
        let resolver = QuantityResolver::new(&config)?;
        let validator = CrossValidator::from_config(&config);
        Ok(Self {
            config,
            resolver,
            validator,
            pricing: EffectiveUnitPriceCalculator::new(),
        })
    }

    pub fn config(&self) -> &TakeoffConfig {
        &self.config
    }

    pub fn resolver(&self) -> &QuantityResolver {
        &self.resolver
    }

    pub fn validator(&self) -> &CrossValidator {
        &self.validator
    }

    /// Run the takeoff over a snapshot.
    ///
    /// Only a malformed category/family taxonomy returns an error; per-element
    /// problems are reported in the run.
    pub fn run(&self, elements: &[ElementRecord], geometry: &dyn GeometrySource) -> Result<TakeoffRun> {
        let start = std::time::Instant::now();
        tracing::info!(elements = elements.len(), "Starting takeoff");

        let batch = self.resolver.resolve_all(elements, geometry);
        let pay_items = collect_pay_items(elements, &batch.resolutions, self.resolver.schema());
        tracing::debug!(pay_items = pay_items.len(), "Collected pay items");

        let decimals = self.config.display_precision;
        let table = AggregateTable::build(elements.iter().zip(&batch.resolutions), decimals)?;
        let by_code = finalize(by_boq_code(&pay_items), decimals);
        let physical = physical_quantities(&pay_items);
        let pricing = self.pricing.calculate_with(&pay_items, &physical);

        let summary = BatchSummary {
            elements: elements.len(),
            succeeded: elements.len() - batch.failed,
            skipped: pricing.failed(),
            failed: batch.failed,
            pay_items: pay_items.len(),
            priced: pricing.succeeded(),
        };

        tracing::info!(
            elements = summary.elements,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            categories = table.categories.len(),
            boq_codes = by_code.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Takeoff complete"
        );

        Ok(TakeoffRun {
            resolutions: batch.resolutions,
            pay_items,
            table,
            by_boq_code: by_code,
            physical,
            pricing,
            summary,
        })
    }

    /// Compare two runs, A against B.
    pub fn cross_validate(&self, a: &TakeoffRun, b: &TakeoffRun) -> ValidationReport {
        self.validator.validate(&a.table, &b.table)
    }
}
