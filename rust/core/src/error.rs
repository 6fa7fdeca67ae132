// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the takeoff data model.

use thiserror::Error;

/// Result type alias for data model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller.
///
/// Per-element problems (missing basis, missing price) are not errors: they are
/// collected as values next to whatever could be computed. Only structural
/// problems with the caller's setup end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The category/family taxonomy cannot be turned into aggregate keys.
    #[error("malformed taxonomy key {key:?}: {reason}")]
    Taxonomy { key: String, reason: String },

    /// Text that does not name a quantity basis.
    #[error("invalid quantity basis: {0:?}")]
    InvalidBasis(String),

    /// Inconsistent configuration (basis table, factors, parameter names).
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new taxonomy error
    pub fn taxonomy(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Taxonomy {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
