// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-View Core - orchestration layer of the IFC viewer
//!
//! Turns a user-selected IFC file into an interactive 3D scene: load the
//! model, frame it with the camera, pick elements with the pointer, resolve
//! their properties, highlight the selection, cut the model with a section
//! plane.
//!
//! Parsing and drawing are not done here. The IFC library sits behind
//! [`IfcManager`](ifc_view_model::IfcManager); the 3D engine and the browser
//! sit behind [`RenderBackend`], [`Surface`] and [`FrameScheduler`].
//!
//! # Components
//!
//! - [`SceneHost`] - renderer setup, orbit camera, render loop, resize
//! - [`ModelLoader`] - file → library → scene, one active model at a time
//! - [`PropertyResolver`] - joined property queries, spatial tree
//! - [`PickSelector`] - pointer press → ray → element id
//! - [`IfcViewer`] - the facade tying them together
//!
//! Everything is single-threaded and `!Send`; shared state lives in
//! `Rc<RefCell<_>>` and async work runs on a local executor.

pub mod backend;
pub mod camera;
pub mod config;
pub mod error;
pub mod loader;
pub mod picking;
pub mod properties;
pub mod scene;
pub mod section;
pub mod viewer;

// Lets test doubles shared with the integration tests name this crate
#[cfg(test)]
extern crate self as ifc_view_core;

#[cfg(test)]
mod test_support;

pub use backend::{
    FrameId, FrameScheduler, Intersection, Light, PointerEvent, PointerEventKind, Rect,
    RenderBackend, Surface, Unsubscribe,
};
pub use camera::{Aabb, CameraFit, OrbitControls, PerspectiveCamera, Ray};
pub use config::{CameraConfig, ControlsConfig, LightsConfig, SceneConfig, ViewerConfig};
pub use error::{Result, ViewerError};
pub use loader::{ModelHandle, ModelLoader};
pub use picking::{pick_element, pointer_to_ndc, PickSelector};
pub use properties::PropertyResolver;
pub use scene::{SceneHandle, SceneHost};
pub use section::{Plane, SectionState};
pub use viewer::{ElementSelection, IfcViewer, ViewerHost, ViewerListener, ViewerState};

/// Re-exported so hosts need not depend on the model crate directly
pub use ifc_view_model as model;
