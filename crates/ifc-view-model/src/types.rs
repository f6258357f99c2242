// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier types shared between the viewer and the IFC library

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one loaded model instance, assigned by the IFC library
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}", self.0)
    }
}

impl From<u32> for ModelId {
    fn from(id: u32) -> Self {
        ModelId(id)
    }
}

/// Type-safe element identifier (the STEP line number, e.g. `#123`)
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct ExpressId(pub u32);

impl ExpressId {
    /// Interpret a loosely typed lookup result as an element id
    ///
    /// Geometry-to-element lookups in JS land return `number | undefined`;
    /// anything that is not a finite, non-negative integer is rejected.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Some(ExpressId(value as u32))
        } else {
            None
        }
    }
}

impl fmt::Display for ExpressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ExpressId {
    fn from(id: u32) -> Self {
        ExpressId(id)
    }
}

impl From<ExpressId> for u32 {
    fn from(id: ExpressId) -> Self {
        id.0
    }
}

/// Opaque handle to an object in the external render graph
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

/// Opaque handle to a geometry buffer owned by the external render graph
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryHandle(pub u64);

/// A model as returned by the IFC library after a successful load
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LoadedModel {
    /// Library-assigned model id
    pub model_id: ModelId,
    /// Root node of the model's render representation
    pub root: NodeHandle,
}

/// Byte progress reported while a file streams through the library
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct LoadProgress {
    /// Bytes consumed so far
    pub loaded: Option<f64>,
    /// Total bytes, when known
    pub total: Option<f64>,
}

impl LoadProgress {
    pub fn new(loaded: f64, total: f64) -> Self {
        Self {
            loaded: Some(loaded),
            total: Some(total),
        }
    }

    /// Percentage in `[0, 100]`; `0` when the total is unknown or zero
    pub fn percent(&self) -> f64 {
        let loaded = self.loaded.unwrap_or(0.0);
        let total = self.total.unwrap_or(0.0);
        let ratio = if total > 0.0 {
            (loaded / total) * 100.0
        } else {
            0.0
        };
        if ratio.is_nan() {
            return 0.0;
        }
        ratio.clamp(0.0, 100.0)
    }
}

/// Highlight material used for the selection overlay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightMaterial {
    /// RGB colour as `0xRRGGBB`
    pub color: u32,
    pub opacity: f32,
    pub depth_test: bool,
    pub depth_write: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
}

impl Default for HighlightMaterial {
    fn default() -> Self {
        Self {
            color: 0xff6b00,
            opacity: 0.8,
            depth_test: true,
            depth_write: false,
            polygon_offset_factor: -4.0,
            polygon_offset_units: -4.0,
        }
    }
}

impl HighlightMaterial {
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Request to build a highlight subset for a set of elements
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetRequest {
    pub model_id: ModelId,
    pub ids: Vec<ExpressId>,
    pub remove_previous: bool,
    pub material: HighlightMaterial,
    #[serde(rename = "customID")]
    pub custom_id: String,
}
