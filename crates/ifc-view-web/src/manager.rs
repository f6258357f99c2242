// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`IfcManager`] over web-ifc-three's `IFCManager`
//!
//! Library responses arrive as plain JS objects. They are converted to
//! `serde_json::Value` once and decoded by the model crate.

use crate::bridge::{js_message, IfcViewLibrary, JsLoadedModel};
use ifc_view_model::{
    ExpressId, GeometryHandle, HighlightMaterial, IfcManager, LibraryError, LoadProgress,
    LoadedModel, MaterialEntry, ModelId, NativeAttributes, NodeHandle, ProgressCallback,
    PropertySet, Result, SpatialNode, SubsetRequest, TypeProperties,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

fn js_error(value: JsValue) -> LibraryError {
    LibraryError::other(js_message(&value))
}

fn to_json(value: JsValue) -> Result<Value> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| LibraryError::malformed(e.to_string()))
}

/// `ProgressEvent` exposes `loaded`/`total` as prototype getters, so they are
/// read by name rather than deserialized
fn progress_of(event: &JsValue) -> LoadProgress {
    let field = |name: &str| {
        js_sys::Reflect::get(event, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_f64())
    };
    LoadProgress {
        loaded: field("loaded"),
        total: field("total"),
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| LibraryError::malformed(e.to_string()))
}

pub struct WebIfcManager {
    library: IfcViewLibrary,
}

impl WebIfcManager {
    /// `wasm_path` is where web-ifc fetches `web-ifc.wasm` from
    pub fn new(wasm_path: &str) -> Self {
        log::debug!("[Loader] IFC library WASM path: {}", wasm_path);
        Self {
            library: IfcViewLibrary::new(wasm_path),
        }
    }
}

impl IfcManager for WebIfcManager {
    async fn load_model(
        &self,
        url: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<LoadedModel> {
        // The glue may report progress after the load settles, so the closure
        // outlives this call and only its target is cleared
        let target = Rc::new(RefCell::new(on_progress));
        let sink = target.clone();
        let progress = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
            if let Some(on_progress) = sink.borrow().as_ref() {
                on_progress(progress_of(&event));
            }
        });
        let result = self
            .library
            .load_model(url, progress.as_ref().unchecked_ref())
            .await;
        target.borrow_mut().take();
        progress.forget();

        let raw = result.map_err(|e| LibraryError::parse(js_message(&e)))?;
        let loaded: JsLoadedModel = serde_wasm_bindgen::from_value(raw)
            .map_err(|e| LibraryError::malformed(e.to_string()))?;
        Ok(LoadedModel {
            model_id: ModelId(loaded.model_id),
            root: NodeHandle(loaded.root as u64),
        })
    }

    fn close_model(&self, model: ModelId) -> Result<()> {
        self.library.close_model(model.0).map_err(js_error)
    }

    async fn dispose(&self) -> Result<()> {
        self.library.dispose().await.map(|_| ()).map_err(js_error)
    }

    async fn item_properties(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<NativeAttributes> {
        let raw = self
            .library
            .item_properties(model.0, id.0, recursive)
            .await
            .map_err(js_error)?;
        let value = to_json(raw)?;
        if value.is_null() {
            return Err(LibraryError::ElementNotFound { model, element: id });
        }
        NativeAttributes::from_json(&value)
    }

    async fn property_sets(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<PropertySet>> {
        let raw = self
            .library
            .property_sets(model.0, id.0, recursive)
            .await
            .map_err(js_error)?;
        PropertySet::list_from_json(&to_json(raw)?)
    }

    async fn type_properties(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<TypeProperties>> {
        let raw = self
            .library
            .type_properties(model.0, id.0, recursive)
            .await
            .map_err(js_error)?;
        TypeProperties::list_from_json(&to_json(raw)?)
    }

    async fn material_properties(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<MaterialEntry>> {
        let raw = self
            .library
            .material_properties(model.0, id.0, recursive)
            .await
            .map_err(js_error)?;
        MaterialEntry::list_from_json(&to_json(raw)?)
    }

    async fn spatial_structure(&self, model: ModelId, recursive: bool) -> Result<SpatialNode> {
        let raw = self
            .library
            .spatial_structure(model.0, recursive)
            .await
            .map_err(js_error)?;
        SpatialNode::from_json(&to_json(raw)?)
    }

    fn express_id_at(&self, geometry: GeometryHandle, face_index: u32) -> Option<ExpressId> {
        self.library
            .express_id(geometry.0 as f64, face_index)
            .as_f64()
            .and_then(ExpressId::from_f64)
    }

    fn create_subset(&self, request: &SubsetRequest) -> Result<NodeHandle> {
        let config = to_js(request)?;
        self.library
            .create_subset(&config)
            .map(|node| NodeHandle(node as u64))
            .map_err(|e| LibraryError::subset(request.custom_id.clone(), js_message(&e)))
    }

    fn remove_subset(
        &self,
        model: ModelId,
        material: &HighlightMaterial,
        custom_id: &str,
    ) -> Result<()> {
        let material = to_js(material)?;
        self.library
            .remove_subset(model.0, &material, custom_id)
            .map_err(|e| LibraryError::subset(custom_id, js_message(&e)))
    }
}
