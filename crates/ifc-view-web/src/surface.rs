// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser implementations of the host boundary: container element, frame
//! scheduling, picked files and the local executor

use crate::bridge::js_message;
use futures_util::task::{LocalFutureObj, LocalSpawn, SpawnError};
use ifc_view_core::{FrameId, FrameScheduler, PointerEvent, PointerEventKind, Rect, Surface, Unsubscribe};
use ifc_view_model::{FileSource, LibraryError};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent};

/// Container `div` plus the renderer's canvas
pub struct DomSurface {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
}

impl DomSurface {
    pub fn new(container: HtmlElement, canvas: HtmlCanvasElement) -> Self {
        Self { container, canvas }
    }
}

fn event_name(kind: PointerEventKind) -> &'static str {
    match kind {
        PointerEventKind::Down => "pointerdown",
        PointerEventKind::Move => "pointermove",
        PointerEventKind::Up => "pointerup",
        PointerEventKind::Wheel => "wheel",
    }
}

fn to_pointer_event(kind: PointerEventKind, event: &Event) -> Option<PointerEvent> {
    if kind == PointerEventKind::Wheel {
        let wheel = event.dyn_ref::<WheelEvent>()?;
        // Keep the page from scrolling while zooming
        wheel.prevent_default();
        return Some(PointerEvent::wheel(wheel.delta_y()));
    }
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(PointerEvent {
        button: mouse.button(),
        ..PointerEvent::new(kind, mouse.client_x() as f64, mouse.client_y() as f64)
    })
}

/// Attach `closure` to `target` and return a detach function owning it
fn listen(target: EventTarget, name: &'static str, closure: Closure<dyn FnMut(Event)>) -> Unsubscribe {
    if let Err(e) = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
        log::warn!("[Scene] Could not listen for '{}': {}", name, js_message(&e));
    }
    Box::new(move || {
        let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
    })
}

impl Surface for DomSurface {
    fn client_size(&self) -> (u32, u32) {
        (
            self.container.client_width().max(0) as u32,
            self.container.client_height().max(0) as u32,
        )
    }

    fn bounding_rect(&self) -> Rect {
        let r = self.canvas.get_bounding_client_rect();
        Rect {
            left: r.left(),
            top: r.top(),
            width: r.width(),
            height: r.height(),
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
    }

    fn mount_canvas(&self) {
        self.container.set_inner_html("");
        if let Err(e) = self.container.append_child(&self.canvas) {
            log::error!("[Scene] Could not mount canvas: {}", js_message(&e));
        }
    }

    fn clear(&self) {
        self.container.set_inner_html("");
    }

    fn on_resize(&self, handler: Rc<dyn Fn()>) -> Unsubscribe {
        let mut detach: Vec<Unsubscribe> = Vec::new();

        let observed = handler.clone();
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |_entries: JsValue| observed());
        match web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(&self.container);
                detach.push(Box::new(move || {
                    observer.disconnect();
                    drop(callback);
                }));
            }
            Err(e) => log::warn!("[Scene] ResizeObserver unavailable: {}", js_message(&e)),
        }

        if let Some(window) = web_sys::window() {
            let on_window = Closure::<dyn FnMut(Event)>::new(move |_event: Event| handler());
            detach.push(listen(window.into(), "resize", on_window));
        }

        Box::new(move || detach.into_iter().for_each(|f| f()))
    }

    fn on_pointer(&self, kind: PointerEventKind, handler: Rc<dyn Fn(PointerEvent)>) -> Unsubscribe {
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(pointer) = to_pointer_event(kind, &event) {
                handler(pointer);
            }
        });
        let target: &EventTarget = self.canvas.as_ref();
        listen(target.clone(), event_name(kind), closure)
    }
}

/// `requestAnimationFrame` scheduling
#[derive(Default)]
pub struct RafScheduler;

impl FrameScheduler for RafScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> FrameId {
        let Some(window) = web_sys::window() else {
            return FrameId(0);
        };
        // Freed by the JS side once it has run; a cancelled frame leaks its closure
        let callback = Closure::once_into_js(move |_time: f64| callback());
        match window.request_animation_frame(callback.unchecked_ref()) {
            Ok(id) => FrameId(id),
            Err(e) => {
                log::error!("[Scene] requestAnimationFrame failed: {}", js_message(&e));
                FrameId(0)
            }
        }
    }

    fn cancel_frame(&self, id: FrameId) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(id.0);
        }
    }
}

/// File handed over by an `<input type="file">` or a drop event
pub struct BrowserFile(pub web_sys::File);

impl FileSource for BrowserFile {
    fn name(&self) -> String {
        self.0.name()
    }

    fn size(&self) -> Option<u64> {
        Some(self.0.size() as u64)
    }

    fn create_object_url(&self) -> ifc_view_model::Result<String> {
        web_sys::Url::create_object_url_with_blob(&self.0)
            .map_err(|e| LibraryError::other(js_message(&e)))
    }

    fn revoke_object_url(&self, url: &str) {
        if let Err(e) = web_sys::Url::revoke_object_url(url) {
            log::warn!("[Loader] Could not revoke {}: {}", url, js_message(&e));
        }
    }
}

/// Runs spawned futures on the browser's microtask queue
#[derive(Default)]
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
