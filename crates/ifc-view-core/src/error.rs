// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer error taxonomy
//!
//! Teardown failures (closing an old model, removing an old overlay, releasing
//! library resources) never show up here: they are logged and swallowed where
//! they happen. Pick misses are not errors either.

use ifc_view_model::{ExpressId, LibraryError, ModelId};
use thiserror::Error;

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Errors surfaced to the caller and to [`ViewerListener::on_error`](crate::ViewerListener::on_error)
#[derive(Error, Debug)]
pub enum ViewerError {
    /// The file could not be decoded or parsed
    #[error("Failed to load IFC file: {0}")]
    Load(#[source] LibraryError),

    /// The file could not be exposed to the parser
    #[error("Could not open '{file}': {source}")]
    ObjectUrl {
        file: String,
        #[source]
        source: LibraryError,
    },

    /// One of the property queries for a picked element failed
    #[error("Failed to resolve properties of {element} in {model}: {source}")]
    PropertyResolution {
        model: ModelId,
        element: ExpressId,
        #[source]
        source: LibraryError,
    },

    /// The spatial hierarchy could not be fetched after a load
    #[error("Failed to fetch spatial structure of {model}: {source}")]
    SpatialStructure {
        model: ModelId,
        #[source]
        source: LibraryError,
    },

    /// The selection overlay could not be created
    #[error("Failed to highlight {element}: {source}")]
    Highlight {
        element: ExpressId,
        #[source]
        source: LibraryError,
    },

    /// A load was requested while another one is still running
    #[error("Another IFC file is still loading")]
    LoadInProgress,

    /// The viewer was used after `dispose`
    #[error("Viewer has been disposed")]
    Disposed,

    /// Configuration could not be parsed or is out of range
    #[error("Invalid viewer configuration: {0}")]
    Config(String),
}

impl ViewerError {
    /// Short machine-readable category, used by UI bindings
    pub fn kind(&self) -> &'static str {
        match self {
            ViewerError::Load(_) | ViewerError::ObjectUrl { .. } => "load",
            ViewerError::PropertyResolution { .. } => "properties",
            ViewerError::SpatialStructure { .. } => "spatial",
            ViewerError::Highlight { .. } => "highlight",
            ViewerError::LoadInProgress => "busy",
            ViewerError::Disposed => "disposed",
            ViewerError::Config(_) => "config",
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ViewerError::Config(msg.into())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Config(err.to_string())
    }
}
