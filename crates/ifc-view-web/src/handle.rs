// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The viewer as a JavaScript class

use crate::backend::ThreeBackend;
use crate::callbacks::{error_to_js, to_js, JsListener};
use crate::manager::WebIfcManager;
use crate::surface::{BrowserFile, DomSurface, RafScheduler, WasmSpawner};
use ifc_view_core::{IfcViewer, ViewerConfig, ViewerHost, ViewerState};
use ifc_view_model::ExpressId;
use js_sys::Promise;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlElement;

type WebViewer = IfcViewer<WebIfcManager, ThreeBackend, JsListener>;

/// IFC viewer mounted into a container element
///
/// ```javascript
/// const viewer = new IfcViewerHandle(document.getElementById('viewer'), {
///   onSelectionChanged: (sel) => console.log(sel?.properties.native.Name),
///   onError: (err) => console.warn(err.kind, err.message),
/// });
/// await viewer.loadIfcFile(input.files[0]);
/// ```
#[wasm_bindgen]
pub struct IfcViewerHandle {
    viewer: Rc<WebViewer>,
}

#[wasm_bindgen]
impl IfcViewerHandle {
    /// `config` is an optional JSON string overriding the defaults
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: HtmlElement,
        callbacks: JsValue,
        config: Option<String>,
    ) -> Result<IfcViewerHandle, JsValue> {
        let config = match config {
            Some(json) => ViewerConfig::from_json(&json).map_err(|e| error_to_js(&e))?,
            None => ViewerConfig::default(),
        };
        let backend = ThreeBackend::new(
            config.scene.antialias,
            config.scene.logarithmic_depth_buffer,
        );
        let surface = DomSurface::new(container, backend.canvas());
        let manager = Rc::new(WebIfcManager::new(&config.wasm_path));
        let host = ViewerHost {
            surface: Rc::new(surface),
            frames: Rc::new(RafScheduler),
            backend,
            spawner: Rc::new(WasmSpawner),
        };
        let viewer = IfcViewer::new(host, manager, JsListener::from_js(&callbacks), config)
            .map_err(|e| error_to_js(&e))?;
        log::info!("[Viewer] Mounted");
        Ok(Self {
            viewer: Rc::new(viewer),
        })
    }

    /// Load a user-selected file; resolves to the model id
    #[wasm_bindgen(js_name = loadIfcFile)]
    pub fn load_ifc_file(&self, file: web_sys::File) -> Promise {
        let viewer = self.viewer.clone();
        Promise::new(&mut |resolve, reject| {
            let viewer = viewer.clone();
            let file = BrowserFile(file.clone());
            spawn_local(async move {
                match viewer.load_ifc_file(&file).await {
                    Ok(model) => {
                        let _ = resolve.call1(&JsValue::NULL, &JsValue::from(model.0));
                    }
                    Err(e) => {
                        let _ = reject.call1(&JsValue::NULL, &error_to_js(&e));
                    }
                }
            });
        })
    }

    /// Select an element by express id; resolves to the selection or `null`
    #[wasm_bindgen(js_name = selectElementById)]
    pub fn select_element_by_id(&self, express_id: u32) -> Promise {
        let viewer = self.viewer.clone();
        Promise::new(&mut |resolve, reject| {
            let viewer = viewer.clone();
            spawn_local(async move {
                match viewer.select_element_by_id(ExpressId(express_id)).await {
                    Ok(selection) => {
                        let value = selection.as_ref().map(to_js).unwrap_or(JsValue::NULL);
                        let _ = resolve.call1(&JsValue::NULL, &value);
                    }
                    Err(e) => {
                        let _ = reject.call1(&JsValue::NULL, &error_to_js(&e));
                    }
                }
            });
        })
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.viewer.clear_selection();
    }

    #[wasm_bindgen(js_name = fitToModel)]
    pub fn fit_to_model(&self) -> bool {
        self.viewer.fit_to_model()
    }

    #[wasm_bindgen(js_name = enableSectionPlane)]
    pub fn enable_section_plane(&self, active: bool) {
        self.viewer.enable_section_plane(active);
    }

    #[wasm_bindgen(js_name = setSectionOffset)]
    pub fn set_section_offset(&self, offset: f64) {
        self.viewer.set_section_offset(offset);
    }

    /// `"empty"`, `"loading"` or `"ready"`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.viewer.state() {
            ViewerState::Empty => "empty",
            ViewerState::Loading => "loading",
            ViewerState::Ready => "ready",
        }
        .to_string()
    }

    #[wasm_bindgen(getter, js_name = modelId)]
    pub fn model_id(&self) -> Option<u32> {
        self.viewer.model_id().map(|m| m.0)
    }

    #[wasm_bindgen(getter)]
    pub fn selection(&self) -> JsValue {
        self.viewer
            .selection()
            .as_ref()
            .map(to_js)
            .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(getter, js_name = spatialTree)]
    pub fn spatial_tree(&self) -> JsValue {
        self.viewer
            .spatial_tree()
            .map(|tree| to_js(tree.as_ref()))
            .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(getter, js_name = sectionOffset)]
    pub fn section_offset(&self) -> Option<f64> {
        self.viewer.section_offset()
    }

    /// Stop rendering, detach listeners and release the library
    pub fn dispose(&self) -> Promise {
        let viewer = self.viewer.clone();
        Promise::new(&mut |resolve, _reject| {
            let viewer = viewer.clone();
            spawn_local(async move {
                viewer.dispose().await;
                let _ = resolve.call0(&JsValue::NULL);
            });
        })
    }
}
