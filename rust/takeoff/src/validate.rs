// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-validation of two independently produced aggregates
//!
//! Typically side A is the export pipeline and side B the schedule pipeline.
//! Categories that disagree are broken down by family so the user can see
//! which families carry the difference.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use boq_lite_core::Dimension;
use serde::Serialize;

use crate::aggregate::{AggregateMap, AggregateTable, CategoryAggregate, GroupKey};
use crate::config::TakeoffConfig;

/// Absorbs float representation noise so a delta of exactly the tolerance
/// does not count as a mismatch. Widened with magnitude, see [`slack`].
const TOLERANCE_EPSILON: f64 = 1e-9;

/// Noise allowance for comparing `a` and `b`: a few ulps of the larger side,
/// never less than [`TOLERANCE_EPSILON`].
#[inline]
fn slack(a: f64, b: f64) -> f64 {
    TOLERANCE_EPSILON.max(a.abs().max(b.abs()) * f64::EPSILON * 4.0)
}

/// Which sides carry a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    OnlyA,
    OnlyB,
}

impl Presence {
    fn swapped(self) -> Self {
        match self {
            Presence::Both => Presence::Both,
            Presence::OnlyA => Presence::OnlyB,
            Presence::OnlyB => Presence::OnlyA,
        }
    }
}

/// Mismatch per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MismatchFlags {
    pub count: bool,
    pub volume: bool,
    pub area: bool,
    pub length: bool,
}

impl MismatchFlags {
    pub fn any(&self) -> bool {
        self.count || self.volume || self.area || self.length
    }

    pub fn get(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Length => self.length,
            Dimension::Area => self.area,
            Dimension::Volume => self.volume,
        }
    }
}

/// One reported difference between the two sides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy<K> {
    pub key: K,
    pub presence: Presence,
    /// Side A totals; zero when the key is missing on A.
    pub side_a: CategoryAggregate,
    pub side_b: CategoryAggregate,
    pub mismatches: MismatchFlags,
}

impl<K: Clone> Discrepancy<K> {
    /// Same discrepancy seen from the other side.
    pub fn swapped(&self) -> Self {
        Self {
            key: self.key.clone(),
            presence: self.presence.swapped(),
            side_a: self.side_b,
            side_b: self.side_a,
            mismatches: self.mismatches,
        }
    }

    pub fn is_one_sided(&self) -> bool {
        self.presence != Presence::Both
    }
}

/// A category that disagrees, with its capped family breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryFinding {
    pub discrepancy: Discrepancy<GroupKey>,
    /// At most `family_row_cap` rows, in key order.
    pub family_rows: Vec<Discrepancy<GroupKey>>,
    /// Mismatching families in total, including rows beyond the cap.
    pub family_mismatches: usize,
}

impl CategoryFinding {
    pub fn hidden_families(&self) -> usize {
        self.family_mismatches.saturating_sub(self.family_rows.len())
    }
}

/// Outcome of validating two aggregate tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub tolerance: f64,
    pub categories_checked: usize,
    pub findings: Vec<CategoryFinding>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Plain-text summary for display by the host.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Cross-validation: {} categories checked, {} with discrepancies (tolerance {})",
            self.categories_checked,
            self.findings.len(),
            self.tolerance
        );
        for finding in &self.findings {
            let _ = writeln!(out, "{}", describe(&finding.discrepancy));
            for row in &finding.family_rows {
                let _ = writeln!(out, "  {}", describe(row));
            }
            let hidden = finding.hidden_families();
            if hidden > 0 {
                let _ = writeln!(out, "  ... and {} more families", hidden);
            }
        }
        out
    }
}

fn describe(d: &Discrepancy<GroupKey>) -> String {
    match d.presence {
        Presence::OnlyA => format!("{}: only in A (count {})", d.key, d.side_a.count),
        Presence::OnlyB => format!("{}: only in B (count {})", d.key, d.side_b.count),
        Presence::Both => {
            let mut parts = Vec::new();
            if d.mismatches.count {
                parts.push(format!("count {} vs {}", d.side_a.count, d.side_b.count));
            }
            for (name, dimension) in [
                ("volume", Dimension::Volume),
                ("area", Dimension::Area),
                ("length", Dimension::Length),
            ] {
                if d.mismatches.get(dimension) {
                    parts.push(format!(
                        "{} {:.2} vs {:.2} {}",
                        name,
                        d.side_a.get(dimension),
                        d.side_b.get(dimension),
                        dimension.unit()
                    ));
                }
            }
            format!("{}: {}", d.key, parts.join(", "))
        }
    }
}

/// Compares aggregates with a fixed tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossValidator {
    pub tolerance: f64,
    pub family_row_cap: usize,
}

impl Default for CrossValidator {
    fn default() -> Self {
        Self::from_config(&TakeoffConfig::default())
    }
}

impl CrossValidator {
    pub fn new(tolerance: f64, family_row_cap: usize) -> Self {
        Self {
            tolerance,
            family_row_cap,
        }
    }

    pub fn from_config(config: &TakeoffConfig) -> Self {
        Self::new(config.tolerance, config.family_row_cap)
    }

    /// Measurement mismatch: beyond tolerance with at least one side non-zero.
    #[inline]
    pub fn dimension_mismatch(&self, a: f64, b: f64) -> bool {
        (a != 0.0 || b != 0.0) && (a - b).abs() - self.tolerance > slack(a, b)
    }

    /// Counts must match exactly; measurements within tolerance.
    pub fn mismatches(&self, a: &CategoryAggregate, b: &CategoryAggregate) -> MismatchFlags {
        MismatchFlags {
            count: a.count != b.count,
            volume: self.dimension_mismatch(a.volume, b.volume),
            area: self.dimension_mismatch(a.area, b.area),
            length: self.dimension_mismatch(a.length, b.length),
        }
    }

    /// Key-ordered discrepancies between two maps. One-sided keys are always
    /// reported.
    pub fn compare<K: Ord + Clone>(
        &self,
        a: &AggregateMap<K>,
        b: &AggregateMap<K>,
    ) -> Vec<Discrepancy<K>> {
        let keys: BTreeSet<&K> = a.keys().chain(b.keys()).collect();
        keys.into_iter()
            .filter_map(|key| {
                let (presence, side_a, side_b) = match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => (Presence::Both, *x, *y),
                    (Some(x), None) => (Presence::OnlyA, *x, CategoryAggregate::default()),
                    (None, Some(y)) => (Presence::OnlyB, CategoryAggregate::default(), *y),
                    (None, None) => return None,
                };
                let mismatches = self.mismatches(&side_a, &side_b);
                if presence == Presence::Both && !mismatches.any() {
                    return None;
                }
                Some(Discrepancy {
                    key: key.clone(),
                    presence,
                    side_a,
                    side_b,
                    mismatches,
                })
            })
            .collect()
    }

    /// Category comparison with capped family drill-down.
    pub fn validate(&self, a: &AggregateTable, b: &AggregateTable) -> ValidationReport {
        let categories_checked = a
            .categories
            .keys()
            .chain(b.categories.keys())
            .collect::<BTreeSet<_>>()
            .len();

        let findings: Vec<CategoryFinding> = self
            .compare(&a.categories, &b.categories)
            .into_iter()
            .map(|discrepancy| {
                let category = discrepancy.key.category.as_str();
                let families = self.compare(&a.families_of(category), &b.families_of(category));
                let family_mismatches = families.len();
                let family_rows = families.into_iter().take(self.family_row_cap).collect();
                CategoryFinding {
                    discrepancy,
                    family_rows,
                    family_mismatches,
                }
            })
            .collect();

        if findings.is_empty() {
            tracing::debug!(categories = categories_checked, "Cross-validation clean");
        } else {
            tracing::warn!(
                categories = categories_checked,
                mismatching = findings.len(),
                tolerance = self.tolerance,
                "Cross-validation found discrepancies"
            );
        }

        ValidationReport {
            tolerance: self.tolerance,
            categories_checked,
            findings,
        }
    }
}
