// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Measurement basis of a pay item.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::units::Dimension;

/// Which measurement is authoritative for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuantityBasis {
    Area,
    Volume,
    Length,
    Count,
    /// Lump sum: priced as a whole, no physical quantity is derived.
    Comp,
}

impl QuantityBasis {
    /// All bases, in canonical order.
    pub const ALL: [QuantityBasis; 5] = [
        QuantityBasis::Area,
        QuantityBasis::Volume,
        QuantityBasis::Length,
        QuantityBasis::Count,
        QuantityBasis::Comp,
    ];

    /// Canonical uppercase text written back to the host.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityBasis::Area => "AREA",
            QuantityBasis::Volume => "VOLUME",
            QuantityBasis::Length => "LENGTH",
            QuantityBasis::Count => "COUNT",
            QuantityBasis::Comp => "COMP",
        }
    }

    /// True for bases backed by a geometric measurement.
    #[inline]
    pub fn is_physical(&self) -> bool {
        self.dimension().is_some()
    }

    /// Dimension measured by this basis (None for COUNT and COMP).
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            QuantityBasis::Area => Some(Dimension::Area),
            QuantityBasis::Volume => Some(Dimension::Volume),
            QuantityBasis::Length => Some(Dimension::Length),
            QuantityBasis::Count | QuantityBasis::Comp => None,
        }
    }

    /// Bases a lump-sum line may be analysed against.
    #[inline]
    pub fn is_analysis_basis(&self) -> bool {
        !matches!(self, QuantityBasis::Comp)
    }
}

impl fmt::Display for QuantityBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityBasis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AREA" => Ok(QuantityBasis::Area),
            "VOLUME" => Ok(QuantityBasis::Volume),
            "LENGTH" => Ok(QuantityBasis::Length),
            "COUNT" => Ok(QuantityBasis::Count),
            "COMP" => Ok(QuantityBasis::Comp),
            _ => Err(Error::InvalidBasis(s.to_string())),
        }
    }
}
