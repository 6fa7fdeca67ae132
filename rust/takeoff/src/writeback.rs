// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element results to be written back to the host.

use boq_lite_core::{ElementId, QuantityBasis};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resolver::ResolvedQuantity;

/// Basis and value to store on one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub element_id: ElementId,
    pub basis: QuantityBasis,
    /// `None` leaves the stored value untouched (COMP lines).
    pub value: Option<f64>,
}

impl From<&ResolvedQuantity> for QuantityUpdate {
    fn from(resolved: &ResolvedQuantity) -> Self {
        Self {
            element_id: resolved.element_id,
            basis: resolved.basis,
            value: resolved.value,
        }
    }
}

/// Receiver of write-back batches.
///
/// `commit` must apply the whole batch or nothing: a host implementation wraps
/// it in a single model transaction and rolls back on the first failure.
pub trait QuantitySink {
    fn commit(&mut self, batch: &[QuantityUpdate]) -> Result<()>;
}

/// Collects batches in memory.
impl QuantitySink for Vec<QuantityUpdate> {
    fn commit(&mut self, batch: &[QuantityUpdate]) -> Result<()> {
        self.extend_from_slice(batch);
        Ok(())
    }
}

/// Updates for a batch of resolutions, in input order.
pub fn updates_for(resolutions: &[ResolvedQuantity]) -> Vec<QuantityUpdate> {
    resolutions.iter().map(QuantityUpdate::from).collect()
}
