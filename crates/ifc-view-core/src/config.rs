// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration
//!
//! Every field has a default, so a host can pass `{}` or only the keys it
//! wants to override.

use crate::{Result, ViewerError};
use ifc_view_model::HighlightMaterial;
use serde::{Deserialize, Serialize};

/// Top-level viewer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lights: LightsConfig,
    /// Material of the selection overlay
    pub highlight: HighlightMaterial,
    /// Custom id under which the selection subset is registered
    pub selection_subset_id: String,
    /// Normal of the section plane created on first enable
    pub section_normal: [f64; 3],
    /// Where the IFC library fetches its WASM binary from
    pub wasm_path: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lights: LightsConfig::default(),
            highlight: HighlightMaterial::default(),
            selection_subset_id: "ifc-selection".to_string(),
            section_normal: [0.0, -1.0, 0.0],
            wasm_path: "/web-ifc/".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scene host cannot work with
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ViewerError::config(format!(
                "camera.fov must be in (0, 180), got {}",
                camera.fov
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ViewerError::config(format!(
                "camera clip range must satisfy 0 < near < far, got {}..{}",
                camera.near, camera.far
            )));
        }
        if !(0.0..=1.0).contains(&self.controls.damping_factor) {
            return Err(ViewerError::config("controls.damping_factor must be in [0, 1]"));
        }
        if self.controls.min_distance > self.controls.max_distance {
            return Err(ViewerError::config(
                "controls.min_distance exceeds controls.max_distance",
            ));
        }
        if !(0.0..=1.0).contains(&self.highlight.opacity) {
            return Err(ViewerError::config("highlight.opacity must be in [0, 1]"));
        }
        let [x, y, z] = self.section_normal;
        if !(x * x + y * y + z * z > 0.0) {
            return Err(ViewerError::config("section_normal must not be zero"));
        }
        if self.selection_subset_id.is_empty() {
            return Err(ViewerError::config("selection_subset_id must not be empty"));
        }
        Ok(())
    }
}

/// Renderer setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Background colour as `0xRRGGBB`
    pub background: u32,
    pub antialias: bool,
    pub logarithmic_depth_buffer: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0xf2f2f2,
            antialias: true,
            logarithmic_depth_buffer: true,
        }
    }
}

/// Perspective camera defaults
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
    /// Auto-fit places the camera this many largest-box-dimensions away
    pub fit_distance_factor: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 0.1,
            far: 2000.0,
            position: [10.0, 10.0, 10.0],
            fit_distance_factor: 1.8,
        }
    }
}

/// Orbit controls tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    /// Fraction of the pending rotation applied per frame
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.08,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: 1.0e7,
        }
    }
}

/// Default light rig
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f64; 3],
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.6,
            directional_color: 0xffffff,
            directional_intensity: 0.8,
            directional_position: [10.0, 20.0, 10.0],
        }
    }
}
