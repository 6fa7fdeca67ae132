// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BOQ-Lite Takeoff
//!
//! Quantity takeoff over a snapshot of host model elements.
//!
//! ## Pipeline
//!
//! 1. [`QuantityResolver`] picks a basis per element (explicit parameter,
//!    concrete type marker, category default, COUNT) and a metric value
//!    (stored parameter, then geometry), applying multiplier and override.
//! 2. [`collect_pay_items`] keeps elements flagged as pay items.
//! 3. [`AggregateTable`] sums by category and by category/family, rounding
//!    only at the end.
//! 4. [`EffectiveUnitPriceCalculator`] prices lump-sum (COMP) lines against
//!    the physical quantity under the same BOQ code and analysis basis.
//! 5. [`CrossValidator`] compares two aggregate tables and drills into
//!    families where categories disagree.
//!
//! [`Takeoff`] ties the steps together and hands per-element results to a
//! [`QuantitySink`] in one batch.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod pay_item;
pub mod pricing;
pub mod resolver;
pub mod snapshot;
pub mod strategy;
pub mod takeoff;
pub mod validate;
pub mod writeback;

pub use aggregate::{
    by_boq_code, by_category, by_category_family, category_or_placeholder, finalize,
    physical_quantities, AggregateMap, AggregateTable, CategoryAggregate, GroupKey,
    PhysicalQuantities, KEY_SEPARATOR, NO_CATEGORY, UNCODED,
};
pub use config::{BasisTable, MultiplierRule, TakeoffConfig};
pub use error::{Result, TakeoffError};
pub use pay_item::{collect_pay_items, AnalysisBasis, PayItem};
pub use pricing::{EffectiveUnitPriceCalculator, PricedLine, PricingError, PricingIssue, PricingOutcome};
pub use resolver::{
    BasisSource, QuantityResolver, ResolutionBatch, ResolutionWarning, ResolvedQuantity,
    ValueSource,
};
pub use snapshot::ElementSnapshot;
pub use strategy::{Chain, ChainOutcome};
pub use takeoff::{BatchSummary, Takeoff, TakeoffRun};
pub use validate::{
    CategoryFinding, CrossValidator, Discrepancy, MismatchFlags, Presence, ValidationReport,
};
pub use writeback::{updates_for, QuantitySink, QuantityUpdate};
