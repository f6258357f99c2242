// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host environment boundary
//!
//! The viewer never touches a DOM or a GPU directly. A host provides three
//! collaborators:
//!
//! - [`Surface`]: the container element the canvas is mounted into, its size
//!   and its pointer/resize events
//! - [`FrameScheduler`]: display-synchronized callbacks
//! - [`RenderBackend`]: the 3D engine that owns the scene graph and draws it
//!
//! The web crate implements them over three.js and the browser; tests use
//! in-memory doubles.

use crate::camera::{Aabb, PerspectiveCamera, Ray};
use crate::section::Plane;
use ifc_view_model::{GeometryHandle, NodeHandle};
use nalgebra::Point3;
use std::rc::Rc;

/// Detaches a listener when called
pub type Unsubscribe = Box<dyn FnOnce()>;

/// Client-space rectangle of an element
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Wheel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub client_x: f64,
    pub client_y: f64,
    pub button: i16,
    /// Wheel delta, zero for other kinds
    pub delta_y: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, client_x: f64, client_y: f64) -> Self {
        Self {
            kind,
            client_x,
            client_y,
            button: 0,
            delta_y: 0.0,
        }
    }

    pub fn wheel(delta_y: f64) -> Self {
        Self {
            delta_y,
            ..Self::new(PointerEventKind::Wheel, 0.0, 0.0)
        }
    }
}

/// Container element hosting the canvas
pub trait Surface {
    /// Client width and height in CSS pixels; either may be zero
    fn client_size(&self) -> (u32, u32);

    fn bounding_rect(&self) -> Rect;

    fn device_pixel_ratio(&self) -> f64;

    /// Empty the container, then append the renderer's canvas
    fn mount_canvas(&self);

    /// Empty the container
    fn clear(&self);

    /// Observe container and window size changes
    fn on_resize(&self, handler: Rc<dyn Fn()>) -> Unsubscribe;

    fn on_pointer(&self, kind: PointerEventKind, handler: Rc<dyn Fn(PointerEvent)>) -> Unsubscribe;
}

/// Opaque id of a scheduled frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(pub i32);

/// Display-synchronized callback scheduling (`requestAnimationFrame`)
pub trait FrameScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> FrameId;

    fn cancel_frame(&self, id: FrameId);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient {
        color: u32,
        intensity: f32,
    },
    Directional {
        color: u32,
        intensity: f32,
        position: Point3<f64>,
    },
}

/// One ray hit reported by the engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub distance: f64,
    pub point: Point3<f64>,
    /// Scene object that was hit
    pub node: NodeHandle,
    /// Mesh geometry of the hit, absent for helpers such as lines
    pub geometry: Option<GeometryHandle>,
    /// Triangle index within the geometry
    pub face_index: Option<u32>,
}

/// 3D engine owning the scene graph
pub trait RenderBackend {
    fn set_background(&mut self, color: u32);

    fn set_pixel_ratio(&mut self, ratio: f64);

    /// Drawing buffer size in CSS pixels
    fn set_size(&mut self, width: u32, height: u32);

    fn add_light(&mut self, light: Light) -> NodeHandle;

    fn add_to_scene(&mut self, node: NodeHandle);

    /// Returns whether the node was a child of the scene
    fn remove_from_scene(&mut self, node: NodeHandle) -> bool;

    /// Objects added with [`add_to_scene`](Self::add_to_scene), in insertion order
    fn scene_children(&self) -> Vec<NodeHandle>;

    /// World-space bounds of a node and its descendants; `None` when empty
    fn bounding_box(&self, node: NodeHandle) -> Option<Aabb>;

    /// Hits against all scene objects and their descendants, nearest first
    fn intersect(&self, ray: &Ray) -> Vec<Intersection>;

    /// Install global clipping planes; an empty slice disables clipping
    fn set_clipping_planes(&mut self, planes: &[Plane], local_clipping: bool);

    fn render(&mut self, camera: &PerspectiveCamera);

    /// Release GPU resources
    fn dispose(&mut self);
}
