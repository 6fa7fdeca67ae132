// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry fallback capability
//!
//! When an element carries no usable computed-quantity parameter, the takeoff
//! asks the host's geometry kernel for a measurement instead. The kernel lives
//! on the host side; this crate only defines the seam.

use crate::element::ElementRecord;

/// Measurements derived from element geometry, in internal units.
///
/// Implementations return `None` when the element has no geometry of the
/// requested kind.
///
/// # Example
///
/// ```rust,ignore
/// struct Kernel<'a> { doc: &'a HostDocument }
///
/// impl GeometrySource for Kernel<'_> {
///     fn face_area_sum(&self, e: &ElementRecord) -> Option<f64> {
///         self.doc.solids(e.id).map(|s| s.faces().map(|f| f.area()).sum())
///     }
///     // ...
/// }
/// ```
pub trait GeometrySource {
    /// Sum of face areas over all solids of the element.
    fn face_area_sum(&self, element: &ElementRecord) -> Option<f64>;

    /// Sum of solid volumes.
    fn solid_volume_sum(&self, element: &ElementRecord) -> Option<f64>;

    /// Length of the element's location curve.
    fn curve_length(&self, element: &ElementRecord) -> Option<f64>;
}

/// Reads the raw measurements captured with the element snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMeasurementSource;

impl GeometrySource for RawMeasurementSource {
    fn face_area_sum(&self, element: &ElementRecord) -> Option<f64> {
        element.measurements.area
    }

    fn solid_volume_sum(&self, element: &ElementRecord) -> Option<f64> {
        element.measurements.volume
    }

    fn curve_length(&self, element: &ElementRecord) -> Option<f64> {
        element.measurements.length
    }
}

/// Geometry source that never yields a measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeometry;

impl GeometrySource for NoGeometry {
    fn face_area_sum(&self, _element: &ElementRecord) -> Option<f64> {
        None
    }

    fn solid_volume_sum(&self, _element: &ElementRecord) -> Option<f64> {
        None
    }

    fn curve_length(&self, _element: &ElementRecord) -> Option<f64> {
        None
    }
}
