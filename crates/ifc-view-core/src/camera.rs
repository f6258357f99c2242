// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera, orbit controls and the geometry they need
//!
//! The render engine draws with whatever camera it is handed each frame; the
//! camera state itself lives here so that picking rays and auto-fit are
//! computed by the viewer, not by the engine.

use crate::config::{CameraConfig, ControlsConfig};
use nalgebra::{Isometry3, Perspective3, Point3, Unit, Vector2, Vector3};
use std::f64::consts::PI;

/// Keeps the polar angle away from the poles
const POLAR_EPSILON: f64 = 1e-6;

/// Below this, pending orbit motion counts as settled
const SETTLE_EPSILON: f64 = 1e-6;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f64 {
        self.size().max()
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Ray-AABB intersection (slab method), distance to the entry point
    pub fn ray_intersection(&self, ray: &Ray) -> Option<f64> {
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir.abs() < f64::EPSILON {
                // Parallel to this slab: must already be inside it
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let t1 = (self.min[axis] - origin) * inv;
            let t2 = (self.max[axis] - origin) * inv;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }
        if t_enter <= t_exit && t_exit >= 0.0 {
            Some(t_enter.max(0.0))
        } else {
            None
        }
    }
}

/// Half-line used for picking
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: Unit::new_normalize(direction),
        }
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction.into_inner() * t
    }
}

/// Perspective camera looking at a target point
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
}

impl PerspectiveCamera {
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Point3::new(0.0, 0.0, 1.0),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }

    pub fn from_config(config: &CameraConfig, aspect: f64) -> Self {
        let [x, y, z] = config.position;
        let mut camera = Self::new(config.fov, aspect, config.near, config.far);
        camera.position = Point3::new(x, y, z);
        camera
    }

    /// World-to-view transform
    pub fn view(&self) -> Isometry3<f64> {
        Isometry3::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection(&self) -> Perspective3<f64> {
        Perspective3::new(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    /// Ray from the camera through a point in normalized device coordinates
    pub fn ray_through(&self, ndc: Vector2<f64>) -> Ray {
        let projection = self.projection();
        let near = projection.unproject_point(&Point3::new(ndc.x, ndc.y, -1.0));
        let far = projection.unproject_point(&Point3::new(ndc.x, ndc.y, 1.0));
        let to_world = self.view().inverse();
        let near = to_world * near;
        let far = to_world * far;
        Ray::new(self.position, far - near)
    }
}

/// Orbit-style camera controls with optional damping
///
/// Pointer drags queue up rotation which [`OrbitControls::update`] applies
/// to the camera; with damping only a fraction is applied per frame, so the
/// camera keeps gliding after the pointer is released.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Point3<f64>,
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub enabled: bool,
    pending_azimuth: f64,
    pending_polar: f64,
    pending_scale: f64,
    drag_from: Option<Vector2<f64>>,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            target: Point3::origin(),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            enabled: true,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_scale: 1.0,
            drag_from: None,
        }
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        if self.enabled {
            self.drag_from = Some(Vector2::new(x, y));
        }
    }

    /// Queue rotation for a pointer move; `viewport_height` scales pixels to radians
    pub fn drag_to(&mut self, x: f64, y: f64, viewport_height: f64) {
        let Some(from) = self.drag_from else { return };
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        let delta = Vector2::new(x, y) - from;
        let scale = 2.0 * PI * self.rotate_speed / viewport_height;
        self.pending_azimuth -= delta.x * scale;
        self.pending_polar -= delta.y * scale;
        self.drag_from = Some(Vector2::new(x, y));
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Queue a zoom step; positive `delta_y` (wheel down) moves away
    pub fn zoom(&mut self, delta_y: f64) {
        if !self.enabled || delta_y == 0.0 {
            return;
        }
        let step = 0.95f64.powf(self.zoom_speed);
        if delta_y > 0.0 {
            self.pending_scale /= step;
        } else {
            self.pending_scale *= step;
        }
    }

    /// Apply pending motion to the camera; returns whether anything moved
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.norm();
        let (mut azimuth, mut polar) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        let fraction = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        azimuth += self.pending_azimuth * fraction;
        polar = (polar + self.pending_polar * fraction).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius = (radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        let moved = self.pending_azimuth.abs() > SETTLE_EPSILON
            || self.pending_polar.abs() > SETTLE_EPSILON
            || (self.pending_scale - 1.0).abs() > SETTLE_EPSILON;

        let new_offset = Vector3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        );
        camera.position = self.target + new_offset;
        camera.target = self.target;

        if self.enable_damping {
            self.pending_azimuth *= 1.0 - self.damping_factor;
            self.pending_polar *= 1.0 - self.damping_factor;
        } else {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
        }
        self.pending_scale = 1.0;
        moved
    }

    /// Drop pending motion and stop reacting to input
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.drag_from = None;
        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_scale = 1.0;
    }
}

/// Camera placement that frames a bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFit {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub near: f64,
    pub far: f64,
}

impl CameraFit {
    /// Place the camera along the (1,1,1) diagonal, `distance_factor` times the
    /// largest box dimension away from the centre
    ///
    /// Returns `None` for empty, degenerate or non-finite boxes.
    pub fn from_bounds(bounds: &Aabb, distance_factor: f64) -> Option<Self> {
        if !bounds.is_finite() {
            return None;
        }
        let max_size = bounds.max_dimension();
        if !max_size.is_finite() || max_size <= 0.0 {
            return None;
        }
        let center = bounds.center();
        let direction = Vector3::new(1.0, 1.0, 1.0).normalize();
        Some(Self {
            position: center + direction * (max_size * distance_factor),
            target: center,
            near: max_size / 100.0,
            far: max_size * 20.0,
        })
    }

    pub fn apply(&self, camera: &mut PerspectiveCamera, controls: &mut OrbitControls) {
        camera.position = self.position;
        camera.near = self.near;
        camera.far = self.far;
        controls.target = self.target;
        camera.target = self.target;
        controls.update(camera);
    }
}
