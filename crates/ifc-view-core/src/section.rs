// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section plane state

use nalgebra::{Point3, Unit, Vector3};

/// Clipping plane `normal · p + constant = 0`
///
/// Geometry on the negative side is cut away.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Unit<Vector3<f64>>,
    pub constant: f64,
}

impl Plane {
    pub fn new(normal: Vector3<f64>, constant: f64) -> Self {
        Self {
            normal: Unit::new_normalize(normal),
            constant,
        }
    }

    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.constant
    }
}

/// The single section plane the viewer manages
///
/// The plane is created on first enable and survives disable, so toggling
/// keeps the last offset.
#[derive(Clone, Debug, Default)]
pub struct SectionState {
    plane: Option<Plane>,
    active: bool,
}

impl SectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate, creating the plane with `default_normal` at offset 0 if needed
    pub fn enable(&mut self, default_normal: Vector3<f64>) -> Plane {
        let plane = *self.plane.get_or_insert_with(|| Plane::new(default_normal, 0.0));
        self.active = true;
        plane
    }

    pub fn disable(&mut self) {
        self.active = false;
    }

    /// Move the plane; `None` if it was never created
    pub fn set_offset(&mut self, offset: f64) -> Option<Plane> {
        let plane = self.plane.as_mut()?;
        plane.constant = offset;
        Some(*plane)
    }

    pub fn offset(&self) -> Option<f64> {
        self.plane.map(|p| p.constant)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn plane(&self) -> Option<&Plane> {
        self.plane.as_ref()
    }

    /// The plane to install on the renderer, if clipping should be on
    pub fn active_plane(&self) -> Option<Plane> {
        self.plane.filter(|_| self.active)
    }
}
