// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types reported by the external IFC library

use crate::{ExpressId, ModelId};
use thiserror::Error;

/// Result type alias for IFC library operations
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Errors that can be raised by an [`IfcManager`](crate::IfcManager) implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibraryError {
    /// The file could not be decoded or parsed
    #[error("Failed to parse IFC content: {0}")]
    Parse(String),

    /// The library ran out of memory or another internal resource
    #[error("IFC library resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The model is not (or no longer) open in the library
    #[error("Model {0} is not loaded")]
    ModelNotLoaded(ModelId),

    /// The element does not exist in the model
    #[error("Element {element} not found in model {model}")]
    ElementNotFound { model: ModelId, element: ExpressId },

    /// A highlight subset could not be created or removed
    #[error("Subset '{custom_id}' failed: {message}")]
    Subset { custom_id: String, message: String },

    /// The payload returned by the library had an unexpected shape
    #[error("Malformed library response: {0}")]
    Malformed(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl LibraryError {
    /// Create a new parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        LibraryError::Parse(msg.into())
    }

    /// Create a new malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        LibraryError::Malformed(msg.into())
    }

    /// Create a new subset error
    pub fn subset(custom_id: impl Into<String>, msg: impl Into<String>) -> Self {
        LibraryError::Subset {
            custom_id: custom_id.into(),
            message: msg.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        LibraryError::Other(msg.into())
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Malformed(err.to_string())
    }
}
