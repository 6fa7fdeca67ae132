// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Internal-unit to metric conversion
//!
//! The host stores every measurement in feet-based internal units. Areas and
//! volumes scale with the square and cube of the linear factor.

use serde::{Deserialize, Serialize};

/// Meters per internal length unit (international foot).
pub const FEET_TO_METERS: f64 = 0.3048;

/// Decimals kept for per-element values.
pub const RAW_PRECISION: u32 = 4;

/// Decimals kept for aggregated display values.
pub const DISPLAY_PRECISION: u32 = 2;

/// Measured dimension of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Length,
    Area,
    Volume,
}

impl Dimension {
    /// Power of the linear factor for this dimension.
    #[inline]
    pub fn exponent(&self) -> i32 {
        match self {
            Dimension::Length => 1,
            Dimension::Area => 2,
            Dimension::Volume => 3,
        }
    }

    /// Metric unit symbol.
    pub fn unit(&self) -> &'static str {
        match self {
            Dimension::Length => "m",
            Dimension::Area => "m²",
            Dimension::Volume => "m³",
        }
    }
}

/// Round half away from zero to `decimals` places.
///
/// Non-finite input maps to 0.0.
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Fixed-factor converter from internal units to meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    /// Meters per internal length unit.
    pub length_factor: f64,
    /// Decimals for per-element values.
    pub raw_precision: u32,
    /// Decimals for aggregated values.
    pub display_precision: u32,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            length_factor: FEET_TO_METERS,
            raw_precision: RAW_PRECISION,
            display_precision: DISPLAY_PRECISION,
        }
    }
}

impl UnitConverter {
    pub fn new(length_factor: f64) -> Self {
        Self {
            length_factor,
            ..Self::default()
        }
    }

    /// Factor applied to a value of the given dimension (L, L², L³).
    #[inline]
    pub fn factor(&self, dimension: Dimension) -> f64 {
        self.length_factor.powi(dimension.exponent())
    }

    /// Convert without rounding.
    #[inline]
    pub fn to_metric_unrounded(&self, value: f64, dimension: Dimension) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        value * self.factor(dimension)
    }

    /// Convert and round to raw precision: `round(value * F, 4)`.
    #[inline]
    pub fn to_metric(&self, value: f64, dimension: Dimension) -> f64 {
        round_to(self.to_metric_unrounded(value, dimension), self.raw_precision)
    }

    /// Inverse conversion, metric back to internal units.
    #[inline]
    pub fn from_metric(&self, value: f64, dimension: Dimension) -> f64 {
        let factor = self.factor(dimension);
        if !value.is_finite() || factor == 0.0 {
            return 0.0;
        }
        value / factor
    }

    #[inline]
    pub fn round_raw(&self, value: f64) -> f64 {
        round_to(value, self.raw_precision)
    }

    #[inline]
    pub fn round_display(&self, value: f64) -> f64 {
        round_to(value, self.display_precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_factors() {
        let c = UnitConverter::default();
        assert_relative_eq!(c.factor(Dimension::Length), 0.3048);
        assert_relative_eq!(c.factor(Dimension::Area), 0.09290304, epsilon = 1e-12);
        assert_relative_eq!(c.factor(Dimension::Volume), 0.028316846592, epsilon = 1e-12);
    }

    #[test]
    fn test_volume_rounds_to_four_decimals() {
        let c = UnitConverter::default();
        assert_eq!(c.to_metric(10.0, Dimension::Volume), 0.2832);
        assert_eq!(c.to_metric(1.0, Dimension::Length), 0.3048);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.235, 1), 1.2);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(f64::NAN, 2), 0.0);
        assert_eq!(round_to(f64::INFINITY, 2), 0.0);
    }

    #[test]
    fn test_non_finite_never_fails() {
        let c = UnitConverter::default();
        assert_eq!(c.to_metric(f64::NAN, Dimension::Area), 0.0);
        assert_eq!(c.from_metric(f64::NEG_INFINITY, Dimension::Area), 0.0);
    }

    proptest! {
        #[test]
        fn prop_round_trip(value in -1.0e6f64..1.0e6) {
            let c = UnitConverter::default();
            for dim in [Dimension::Length, Dimension::Area, Dimension::Volume] {
                let back = c.from_metric(c.to_metric_unrounded(value, dim), dim);
                prop_assert!((back - value).abs() <= 1e-9 * value.abs().max(1.0));
            }
        }
    }
}
