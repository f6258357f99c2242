// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forwards viewer events to the page's callback object

use crate::bridge::js_message;
use ifc_view_core::{ElementSelection, ViewerError, ViewerListener};
use ifc_view_model::{ModelId, SpatialTree};
use js_sys::{Function, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Optional JS callbacks, all taking one argument:
///
/// - `onLoaded(modelId)`
/// - `onLoadProgress(percent)`
/// - `onSelectionChanged(selection | null)`
/// - `onSpatialTree(tree)`
/// - `onError(error)` where `error.kind` names the failure
#[derive(Default)]
pub struct JsListener {
    on_loaded: Option<Function>,
    on_load_progress: Option<Function>,
    on_selection_changed: Option<Function>,
    on_spatial_tree: Option<Function>,
    on_error: Option<Function>,
}

fn callback(callbacks: &JsValue, name: &str) -> Option<Function> {
    if callbacks.is_undefined() || callbacks.is_null() {
        return None;
    }
    Reflect::get(callbacks, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

pub fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    match value.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
        Ok(js) => js,
        Err(e) => {
            log::error!("[Viewer] Could not serialize event payload: {}", e);
            JsValue::NULL
        }
    }
}

/// `Error` carrying the failure kind for `switch (err.kind)` on the JS side
pub fn error_to_js(error: &ViewerError) -> JsValue {
    let js = js_sys::Error::new(&error.to_string());
    let _ = Reflect::set(&js, &"kind".into(), &error.kind().into());
    js.into()
}

impl JsListener {
    pub fn from_js(callbacks: &JsValue) -> Self {
        Self {
            on_loaded: callback(callbacks, "onLoaded"),
            on_load_progress: callback(callbacks, "onLoadProgress"),
            on_selection_changed: callback(callbacks, "onSelectionChanged"),
            on_spatial_tree: callback(callbacks, "onSpatialTree"),
            on_error: callback(callbacks, "onError"),
        }
    }

    fn emit(&self, name: &str, function: &Option<Function>, arg: &JsValue) {
        let Some(function) = function else {
            return;
        };
        if let Err(e) = function.call1(&JsValue::NULL, arg) {
            log::error!("[Viewer] {} callback threw: {}", name, js_message(&e));
        }
    }
}

impl ViewerListener for JsListener {
    fn on_loaded(&self, model: ModelId) {
        self.emit("onLoaded", &self.on_loaded, &JsValue::from(model.0));
    }

    fn on_load_progress(&self, percent: f64) {
        self.emit("onLoadProgress", &self.on_load_progress, &JsValue::from_f64(percent));
    }

    fn on_selection_changed(&self, selection: Option<&ElementSelection>) {
        let arg = selection.map(to_js).unwrap_or(JsValue::NULL);
        self.emit("onSelectionChanged", &self.on_selection_changed, &arg);
    }

    fn on_spatial_tree(&self, tree: &SpatialTree) {
        self.emit("onSpatialTree", &self.on_spatial_tree, &to_js(tree));
    }

    fn on_error(&self, error: &ViewerError) {
        self.emit("onError", &self.on_error, &error_to_js(error));
    }
}
