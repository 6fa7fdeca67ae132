// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantity aggregation by category, family and BOQ code
//!
//! Sums are accumulated unrounded; rounding to display precision happens once
//! in [`finalize`], so per-element rounding error never compounds.

use std::collections::BTreeMap;
use std::fmt;

use boq_lite_core::{round_to, Dimension, ElementRecord, Error as CoreError, QuantityBasis};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::pay_item::PayItem;
use crate::resolver::ResolvedQuantity;

/// Separator between category and family in a rendered key.
pub const KEY_SEPARATOR: char = '|';

/// Accumulated totals for one group.
///
/// Each measurement only receives elements whose basis is that measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    pub count: u64,
    pub volume: f64,
    pub area: f64,
    pub length: f64,
}

impl CategoryAggregate {
    /// Add one element. Count always increments; a measurement only when the
    /// basis matches and the value is positive.
    pub fn add(&mut self, basis: QuantityBasis, value: Option<f64>) {
        self.count += 1;
        let value = match value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => return,
        };
        match basis {
            QuantityBasis::Volume => self.volume += value,
            QuantityBasis::Area => self.area += value,
            QuantityBasis::Length => self.length += value,
            QuantityBasis::Count | QuantityBasis::Comp => {}
        }
    }

    pub fn merge(&mut self, other: &CategoryAggregate) {
        self.count += other.count;
        self.volume += other.volume;
        self.area += other.area;
        self.length += other.length;
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Length => self.length,
            Dimension::Area => self.area,
            Dimension::Volume => self.volume,
        }
    }

    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            count: self.count,
            volume: round_to(self.volume, decimals),
            area: round_to(self.area, decimals),
            length: round_to(self.length, decimals),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0 && self.volume == 0.0 && self.area == 0.0 && self.length == 0.0
    }
}

/// Category, or category and family.
///
/// Serialized in its rendered `category|family` form so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub category: String,
    pub family: Option<String>,
}

impl GroupKey {
    pub fn category(category: &str) -> Result<Self, CoreError> {
        Ok(Self {
            category: checked_segment(category, category, true)?,
            family: None,
        })
    }

    pub fn family(category: &str, family: &str) -> Result<Self, CoreError> {
        let rendered = format!("{}{}{}", category, KEY_SEPARATOR, family);
        Ok(Self {
            category: checked_segment(category, &rendered, true)?,
            family: Some(checked_segment(family, &rendered, false)?),
        })
    }

    /// Parse a rendered `category` or `category|family` key.
    pub fn parse(key: &str) -> Result<Self, CoreError> {
        match key.split_once(KEY_SEPARATOR) {
            Some((category, family)) => Self::family(category, family),
            None => Self::category(key),
        }
    }

    /// Same key at category level.
    pub fn to_category(&self) -> Self {
        Self {
            category: self.category.clone(),
            family: None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.family {
            Some(family) => write!(f, "{}{}{}", self.category, KEY_SEPARATOR, family),
            None => f.write_str(&self.category),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rendered = String::deserialize(deserializer)?;
        GroupKey::parse(&rendered).map_err(de::Error::custom)
    }
}

fn checked_segment(segment: &str, key: &str, required: bool) -> Result<String, CoreError> {
    let trimmed = segment.trim();
    if required && trimmed.is_empty() {
        return Err(CoreError::taxonomy(key, "empty category"));
    }
    if trimmed.contains(KEY_SEPARATOR) {
        return Err(CoreError::taxonomy(
            key,
            format!("segment {:?} contains the key separator", trimmed),
        ));
    }
    Ok(trimmed.to_string())
}

/// Aggregates keyed by `K`, in key order.
pub type AggregateMap<K> = BTreeMap<K, CategoryAggregate>;

/// Accumulate (element, resolution) rows under `key_fn`, unrounded.
pub fn aggregate<'a, K, I, F>(rows: I, mut key_fn: F) -> AggregateMap<K>
where
    K: Ord,
    I: IntoIterator<Item = (&'a ElementRecord, &'a ResolvedQuantity)>,
    F: FnMut(&ElementRecord, &ResolvedQuantity) -> K,
{
    let mut map = AggregateMap::new();
    for (element, resolved) in rows {
        map.entry(key_fn(element, resolved))
            .or_insert_with(CategoryAggregate::default)
            .add(resolved.basis, resolved.value);
    }
    map
}

/// Like [`aggregate`], for key functions that can reject a row.
pub fn try_aggregate<'a, K, I, F>(rows: I, mut key_fn: F) -> Result<AggregateMap<K>, CoreError>
where
    K: Ord,
    I: IntoIterator<Item = (&'a ElementRecord, &'a ResolvedQuantity)>,
    F: FnMut(&ElementRecord, &ResolvedQuantity) -> Result<K, CoreError>,
{
    let mut map = AggregateMap::new();
    for (element, resolved) in rows {
        map.entry(key_fn(element, resolved)?)
            .or_insert_with(CategoryAggregate::default)
            .add(resolved.basis, resolved.value);
    }
    Ok(map)
}

/// Accumulate pay items under `key_fn`, unrounded.
pub fn aggregate_pay_items<'a, K, I, F>(items: I, mut key_fn: F) -> AggregateMap<K>
where
    K: Ord,
    I: IntoIterator<Item = &'a PayItem>,
    F: FnMut(&PayItem) -> K,
{
    let mut map = AggregateMap::new();
    for item in items {
        map.entry(key_fn(item))
            .or_insert_with(CategoryAggregate::default)
            .add(item.basis, item.quantity);
    }
    map
}

/// Round every aggregate to `decimals`.
pub fn finalize<K: Ord>(map: AggregateMap<K>, decimals: u32) -> AggregateMap<K> {
    map.into_iter()
        .map(|(key, agg)| (key, agg.rounded(decimals)))
        .collect()
}

/// Category under which elements without one are grouped.
pub const NO_CATEGORY: &str = "(no category)";

/// The element's category, or [`NO_CATEGORY`] when it is blank.
pub fn category_or_placeholder(category: &str) -> &str {
    if category.trim().is_empty() {
        NO_CATEGORY
    } else {
        category
    }
}

pub fn by_category<'a, I>(rows: I) -> Result<AggregateMap<GroupKey>, CoreError>
where
    I: IntoIterator<Item = (&'a ElementRecord, &'a ResolvedQuantity)>,
{
    try_aggregate(rows, |e, _| GroupKey::category(category_or_placeholder(&e.category)))
}

pub fn by_category_family<'a, I>(rows: I) -> Result<AggregateMap<GroupKey>, CoreError>
where
    I: IntoIterator<Item = (&'a ElementRecord, &'a ResolvedQuantity)>,
{
    try_aggregate(rows, |e, _| {
        GroupKey::family(category_or_placeholder(&e.category), &e.family)
    })
}

/// Key of pay items that carry no BOQ code.
pub const UNCODED: &str = "";

/// Pay items by BOQ code; items without a code collect under [`UNCODED`].
pub fn by_boq_code<'a, I>(items: I) -> AggregateMap<String>
where
    I: IntoIterator<Item = &'a PayItem>,
{
    aggregate_pay_items(items, |item| {
        item.boq_code.clone().unwrap_or_else(|| UNCODED.to_string())
    })
}

/// Category-level and family-level aggregates from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub categories: AggregateMap<GroupKey>,
    pub families: AggregateMap<GroupKey>,
}

impl AggregateTable {
    /// Aggregate both levels and round to `decimals`.
    pub fn build<'a, I>(rows: I, decimals: u32) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (&'a ElementRecord, &'a ResolvedQuantity)>,
    {
        let families = by_category_family(rows)?;
        Ok(Self::from_families(families, decimals))
    }

    /// Derive category totals from unrounded family totals, then round both.
    pub fn from_families(families: AggregateMap<GroupKey>, decimals: u32) -> Self {
        let mut categories = AggregateMap::new();
        for (key, agg) in &families {
            categories
                .entry(key.to_category())
                .or_insert_with(CategoryAggregate::default)
                .merge(agg);
        }
        Self {
            categories: finalize(categories, decimals),
            families: finalize(families, decimals),
        }
    }

    /// Family rows of one category.
    pub fn families_of(&self, category: &str) -> AggregateMap<GroupKey> {
        self.families
            .iter()
            .filter(|(key, _)| key.category == category)
            .map(|(key, agg)| (key.clone(), *agg))
            .collect()
    }
}

/// `physicalQty[boqCode][basis]`: summed quantities of coded, non-COMP pay items.
pub type PhysicalQuantities = BTreeMap<String, BTreeMap<QuantityBasis, f64>>;

pub fn physical_quantities<'a, I>(items: I) -> PhysicalQuantities
where
    I: IntoIterator<Item = &'a PayItem>,
{
    let mut totals = PhysicalQuantities::new();
    for item in items {
        if item.is_lump_sum() {
            continue;
        }
        let (Some(code), Some(quantity)) = (&item.boq_code, item.quantity) else {
            continue;
        };
        // Same rule as `CategoryAggregate::add`.
        if !quantity.is_finite() || quantity <= 0.0 {
            continue;
        }
        *totals
            .entry(code.clone())
            .or_default()
            .entry(item.basis)
            .or_insert(0.0) += quantity;
    }
    totals
}
