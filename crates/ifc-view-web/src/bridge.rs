// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript FFI to the host page's rendering and IFC glue
//!
//! The page defines two global classes before the module starts:
//!
//! - `IfcViewRenderer`: owns a three.js `Scene` and `WebGLRenderer`. Scene
//!   objects are referred to by numeric handles.
//! - `IfcViewLibrary`: wraps web-ifc-three's `IFCLoader`/`IFCManager` and
//!   returns plain JSON-like objects. Subsets are created without adding them
//!   to the scene; the viewer does that itself.
//!
//! Handles cross the boundary as `f64`, which is exact for the small integer
//! ids the glue hands out.

use js_sys::Function;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

#[wasm_bindgen]
extern "C" {
    pub type IfcViewRenderer;

    /// `options`: `{ antialias, logarithmicDepthBuffer }`
    #[wasm_bindgen(constructor)]
    pub fn new(options: &JsValue) -> IfcViewRenderer;

    #[wasm_bindgen(method, getter, js_name = domElement)]
    pub fn dom_element(this: &IfcViewRenderer) -> HtmlCanvasElement;

    #[wasm_bindgen(method, js_name = setBackground)]
    pub fn set_background(this: &IfcViewRenderer, color: u32);

    #[wasm_bindgen(method, js_name = setPixelRatio)]
    pub fn set_pixel_ratio(this: &IfcViewRenderer, ratio: f64);

    #[wasm_bindgen(method, js_name = setSize)]
    pub fn set_size(this: &IfcViewRenderer, width: u32, height: u32);

    /// `kind` is `"ambient"` or `"directional"`; returns the light's handle
    #[wasm_bindgen(method, js_name = addLight)]
    pub fn add_light(
        this: &IfcViewRenderer,
        kind: &str,
        color: u32,
        intensity: f32,
        position: &[f64],
    ) -> f64;

    #[wasm_bindgen(method, js_name = addToScene)]
    pub fn add_to_scene(this: &IfcViewRenderer, node: f64);

    #[wasm_bindgen(method, js_name = removeFromScene)]
    pub fn remove_from_scene(this: &IfcViewRenderer, node: f64) -> bool;

    #[wasm_bindgen(method, js_name = sceneChildren)]
    pub fn scene_children(this: &IfcViewRenderer) -> Vec<f64>;

    /// `[minX, minY, minZ, maxX, maxY, maxZ]`, or `null` for an empty box
    #[wasm_bindgen(method, js_name = boundingBox)]
    pub fn bounding_box(this: &IfcViewRenderer, node: f64) -> JsValue;

    /// `ray`: `[ox, oy, oz, dx, dy, dz]`; returns an array of [`JsHit`]
    #[wasm_bindgen(method)]
    pub fn intersect(this: &IfcViewRenderer, ray: &[f64]) -> JsValue;

    /// `planes`: flattened `[nx, ny, nz, constant, ...]`
    #[wasm_bindgen(method, js_name = setClippingPlanes)]
    pub fn set_clipping_planes(this: &IfcViewRenderer, planes: &[f64], local_clipping: bool);

    /// `camera`: `[px, py, pz, tx, ty, tz, ux, uy, uz, fov, aspect, near, far]`
    #[wasm_bindgen(method)]
    pub fn render(this: &IfcViewRenderer, camera: &[f64]);

    #[wasm_bindgen(method)]
    pub fn dispose(this: &IfcViewRenderer);
}

#[wasm_bindgen]
extern "C" {
    pub type IfcViewLibrary;

    #[wasm_bindgen(constructor)]
    pub fn new(wasm_path: &str) -> IfcViewLibrary;

    /// Resolves to `{ modelID, root }`
    #[wasm_bindgen(method, catch, js_name = loadModel)]
    pub async fn load_model(
        this: &IfcViewLibrary,
        url: &str,
        on_progress: &Function,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = closeModel)]
    pub fn close_model(this: &IfcViewLibrary, model: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    pub async fn dispose(this: &IfcViewLibrary) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getItemProperties)]
    pub async fn item_properties(
        this: &IfcViewLibrary,
        model: u32,
        id: u32,
        recursive: bool,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getPropertySets)]
    pub async fn property_sets(
        this: &IfcViewLibrary,
        model: u32,
        id: u32,
        recursive: bool,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getTypeProperties)]
    pub async fn type_properties(
        this: &IfcViewLibrary,
        model: u32,
        id: u32,
        recursive: bool,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getMaterialsProperties)]
    pub async fn material_properties(
        this: &IfcViewLibrary,
        model: u32,
        id: u32,
        recursive: bool,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getSpatialStructure)]
    pub async fn spatial_structure(
        this: &IfcViewLibrary,
        model: u32,
        recursive: bool,
    ) -> Result<JsValue, JsValue>;

    /// Number, or `undefined` when the face has no element id
    #[wasm_bindgen(method, js_name = getExpressId)]
    pub fn express_id(this: &IfcViewLibrary, geometry: f64, face_index: u32) -> JsValue;

    /// `config`: `{ modelID, ids, removePrevious, material, customID }`; returns the subset handle
    #[wasm_bindgen(method, catch, js_name = createSubset)]
    pub fn create_subset(this: &IfcViewLibrary, config: &JsValue) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeSubset)]
    pub fn remove_subset(
        this: &IfcViewLibrary,
        model: u32,
        material: &JsValue,
        custom_id: &str,
    ) -> Result<(), JsValue>;
}

/// One entry of `IfcViewRenderer.intersect`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsHit {
    pub distance: f64,
    pub point: [f64; 3],
    pub node: f64,
    #[serde(default)]
    pub geometry: Option<f64>,
    #[serde(default)]
    pub face_index: Option<u32>,
}

/// Result of `IfcViewLibrary.loadModel`
#[derive(Debug, Deserialize)]
pub struct JsLoadedModel {
    #[serde(rename = "modelID")]
    pub model_id: u32,
    pub root: f64,
}

/// Best-effort message of a thrown JS value
pub fn js_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
