// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer picking: screen position → ray → nearest hit → element id

use crate::backend::{PointerEvent, PointerEventKind, Rect, RenderBackend, Surface, Unsubscribe};
use crate::scene::SceneHandle;
use ifc_view_model::{ExpressId, IfcManager};
use nalgebra::Vector2;
use std::cell::RefCell;
use std::rc::Rc;

/// Convert a client-space pointer position to normalized device coordinates
///
/// Returns `None` when the surface has no area.
pub fn pointer_to_ndc(event: &PointerEvent, bounds: &Rect) -> Option<Vector2<f64>> {
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }
    let x = event.client_x - bounds.left;
    let y = event.client_y - bounds.top;
    Some(Vector2::new(
        (x / bounds.width) * 2.0 - 1.0,
        -(y / bounds.height) * 2.0 + 1.0,
    ))
}

/// Resolve the element under the pointer, if any
///
/// Only the nearest hit counts; it must carry geometry and a face index that
/// the library can map to an element.
pub fn pick_element<M: IfcManager, B: RenderBackend>(
    surface: &dyn Surface,
    scene: &SceneHandle<B>,
    manager: &M,
    event: &PointerEvent,
) -> Option<ExpressId> {
    let ndc = pointer_to_ndc(event, &surface.bounding_rect())?;
    let ray = scene.pick_ray(ndc);
    let hits = scene.intersect(&ray);
    let nearest = hits.first()?;
    let (Some(geometry), Some(face)) = (nearest.geometry, nearest.face_index) else {
        log::debug!("[Picking] Nearest hit has no mesh face, ignoring");
        return None;
    };
    let id = manager.express_id_at(geometry, face);
    if id.is_none() {
        log::debug!("[Picking] No element id for {:?} face {}", geometry, face);
    }
    id
}

/// Listens for pointer presses and reports picked elements
pub struct PickSelector {
    unsubscribe: RefCell<Option<Unsubscribe>>,
}

impl PickSelector {
    /// Register on `surface`; `on_select` fires once per press that hits an element
    pub fn new<M, B>(
        surface: Rc<dyn Surface>,
        scene: SceneHandle<B>,
        manager: Rc<M>,
        on_select: impl Fn(ExpressId) + 'static,
    ) -> Self
    where
        M: IfcManager + 'static,
        B: RenderBackend + 'static,
    {
        let weak_surface = Rc::downgrade(&surface);
        let handler = Rc::new(move |event: PointerEvent| {
            let Some(surface) = weak_surface.upgrade() else {
                return;
            };
            if let Some(id) = pick_element(surface.as_ref(), &scene, manager.as_ref(), &event) {
                log::debug!("[Picking] Selected {}", id);
                on_select(id);
            }
        });
        let unsubscribe = surface.on_pointer(PointerEventKind::Down, handler);
        Self {
            unsubscribe: RefCell::new(Some(unsubscribe)),
        }
    }

    /// Stop listening; safe to call repeatedly
    pub fn dispose(&self) {
        if let Some(unsubscribe) = self.unsubscribe.borrow_mut().take() {
            unsubscribe();
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.borrow().is_some()
    }
}
