// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`RenderBackend`] over the page's three.js renderer

use crate::bridge::{IfcViewRenderer, JsHit};
use ifc_view_core::{Aabb, Intersection, Light, PerspectiveCamera, Plane, Ray, RenderBackend};
use ifc_view_model::{GeometryHandle, NodeHandle};
use nalgebra::Point3;
use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::HtmlCanvasElement;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RendererOptions {
    antialias: bool,
    logarithmic_depth_buffer: bool,
}

pub struct ThreeBackend {
    renderer: IfcViewRenderer,
}

impl ThreeBackend {
    pub fn new(antialias: bool, logarithmic_depth: bool) -> Self {
        let options = RendererOptions {
            antialias,
            logarithmic_depth_buffer: logarithmic_depth,
        };
        let options = serde_wasm_bindgen::to_value(&options).unwrap_or(JsValue::UNDEFINED);
        Self {
            renderer: IfcViewRenderer::new(&options),
        }
    }

    pub fn canvas(&self) -> HtmlCanvasElement {
        self.renderer.dom_element()
    }
}

fn handle(node: NodeHandle) -> f64 {
    node.0 as f64
}

fn node(value: f64) -> NodeHandle {
    NodeHandle(value as u64)
}

impl RenderBackend for ThreeBackend {
    fn set_background(&mut self, color: u32) {
        self.renderer.set_background(color);
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.renderer.set_pixel_ratio(ratio);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.renderer.set_size(width, height);
    }

    fn add_light(&mut self, light: Light) -> NodeHandle {
        let id = match light {
            Light::Ambient { color, intensity } => {
                self.renderer.add_light("ambient", color, intensity, &[])
            }
            Light::Directional {
                color,
                intensity,
                position,
            } => self.renderer.add_light(
                "directional",
                color,
                intensity,
                &[position.x, position.y, position.z],
            ),
        };
        node(id)
    }

    fn add_to_scene(&mut self, node: NodeHandle) {
        self.renderer.add_to_scene(handle(node));
    }

    fn remove_from_scene(&mut self, node: NodeHandle) -> bool {
        self.renderer.remove_from_scene(handle(node))
    }

    fn scene_children(&self) -> Vec<NodeHandle> {
        self.renderer
            .scene_children()
            .into_iter()
            .map(node)
            .collect()
    }

    fn bounding_box(&self, node: NodeHandle) -> Option<Aabb> {
        let raw = self.renderer.bounding_box(handle(node));
        if raw.is_null() || raw.is_undefined() {
            return None;
        }
        let b: [f64; 6] = match serde_wasm_bindgen::from_value(raw) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("[Scene] Unreadable bounding box for {:?}: {}", node, e);
                return None;
            }
        };
        Some(Aabb::new(
            Point3::new(b[0], b[1], b[2]),
            Point3::new(b[3], b[4], b[5]),
        ))
    }

    fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let o = ray.origin;
        let d = ray.direction;
        let raw = self.renderer.intersect(&[o.x, o.y, o.z, d.x, d.y, d.z]);
        let hits: Vec<JsHit> = match serde_wasm_bindgen::from_value(raw) {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("[Picking] Unreadable intersection list: {}", e);
                return Vec::new();
            }
        };
        hits.into_iter()
            .map(|hit| Intersection {
                distance: hit.distance,
                point: Point3::new(hit.point[0], hit.point[1], hit.point[2]),
                node: node(hit.node),
                geometry: hit.geometry.map(|g| GeometryHandle(g as u64)),
                face_index: hit.face_index,
            })
            .collect()
    }

    fn set_clipping_planes(&mut self, planes: &[Plane], local_clipping: bool) {
        let flat: Vec<f64> = planes
            .iter()
            .flat_map(|p| [p.normal.x, p.normal.y, p.normal.z, p.constant])
            .collect();
        self.renderer.set_clipping_planes(&flat, local_clipping);
    }

    fn render(&mut self, camera: &PerspectiveCamera) {
        let p = camera.position;
        let t = camera.target;
        let u = camera.up;
        self.renderer.render(&[
            p.x,
            p.y,
            p.z,
            t.x,
            t.y,
            t.z,
            u.x,
            u.y,
            u.z,
            camera.fov,
            camera.aspect,
            camera.near,
            camera.far,
        ]);
    }

    fn dispose(&mut self) {
        self.renderer.dispose();
    }
}
