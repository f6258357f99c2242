// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-View Model - shared types and the IFC library boundary
//!
//! The viewer never parses IFC itself. Everything it knows about a model comes
//! through the [`IfcManager`] trait, which is implemented by whichever IFC
//! library the host embeds (a WASM parser in the browser, an in-memory double
//! in tests).
//!
//! # Architecture
//!
//! - [`IfcManager`] - load/close models, property queries, spatial structure,
//!   geometry-to-element lookup, highlight subsets
//! - [`FileSource`] - a user-selected file that can be exposed as a temporary URL
//! - [`ElementProperties`] - the property bundle resolved for one element
//! - [`SpatialTree`] - the read-only containment hierarchy of a model
//!
//! # Example
//!
//! ```ignore
//! use ifc_view_model::{IfcManager, ModelId, ExpressId};
//!
//! async fn wall_name(manager: &impl IfcManager, model: ModelId) -> Option<String> {
//!     let attrs = manager.item_properties(model, ExpressId(42), true).await.ok()?;
//!     attrs.name().map(str::to_string)
//! }
//! ```

pub mod error;
pub mod properties;
pub mod spatial;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use properties::*;
pub use spatial::*;
pub use traits::*;
pub use types::*;
