// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-View Web
//!
//! WebAssembly bindings of the IFC viewer. The page loads three.js and
//! web-ifc-three, registers the `IfcViewRenderer` and `IfcViewLibrary` glue
//! classes (see [`bridge`]), then:
//!
//! ```javascript
//! import init, { IfcViewerHandle } from 'ifc-view-web';
//!
//! await init();
//! const viewer = new IfcViewerHandle(container, { onError: console.warn });
//! fileInput.onchange = () => viewer.loadIfcFile(fileInput.files[0]);
//! ```
//!
//! Append `?debug=1` to the page URL for debug logging.

use wasm_bindgen::prelude::*;

pub mod backend;
pub mod bridge;
pub mod callbacks;
pub mod handle;
pub mod logging;
pub mod manager;
pub mod surface;

pub use backend::ThreeBackend;
pub use callbacks::JsListener;
pub use handle::IfcViewerHandle;
pub use manager::WebIfcManager;
pub use surface::{BrowserFile, DomSurface, RafScheduler, WasmSpawner};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init();
}

/// Get the version of IFC-View
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
