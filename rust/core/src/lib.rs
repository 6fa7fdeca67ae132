// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BOQ-Lite Core
//!
//! Data model shared by the quantity takeoff crates.
//!
//! ## Overview
//!
//! - **Element records**: a point-in-time snapshot of host elements with typed
//!   parameters and raw measurements in internal (feet-based) units
//! - **Quantity basis**: AREA / VOLUME / LENGTH / COUNT / COMP
//! - **Unit conversion**: fixed linear factor with squared/cubed variants and
//!   fixed-precision rounding
//! - **Parameter schema**: typed keys in place of lookups by raw parameter name
//! - **Geometry seam**: the [`GeometrySource`] trait the host implements to
//!   provide measurements from its modeling kernel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use boq_lite_core::{Dimension, ElementRecord, ParamValue, UnitConverter};
//!
//! let wall = ElementRecord::new(1, "Walls")
//!     .with_type_name("CONC-200")
//!     .with_param("HOST_VOLUME_COMPUTED", ParamValue::Number(10.0));
//!
//! let converter = UnitConverter::default();
//! assert_eq!(converter.to_metric(10.0, Dimension::Volume), 0.2832);
//! ```

pub mod basis;
pub mod element;
pub mod error;
pub mod geometry;
pub mod schema;
pub mod units;

pub use basis::QuantityBasis;
pub use element::{ElementId, ElementRecord, ParamValue, RawMeasurements};
pub use error::{Error, Result};
pub use geometry::{GeometrySource, NoGeometry, RawMeasurementSource};
pub use schema::{ParamKey, ParameterSchema};
pub use units::{round_to, Dimension, UnitConverter, DISPLAY_PRECISION, FEET_TO_METERS, RAW_PRECISION};
