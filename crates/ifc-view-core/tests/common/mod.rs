// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser-free host for driving the whole viewer
//!
//! [`FixtureLibrary`] answers every query from a JSON document shaped like
//! the web-ifc responses, so the decoding helpers of the model crate are
//! exercised along the way.

#![allow(dead_code)]

mod host;

pub use host::{FakeFile, FakeSurface, ManualFrames};

use ifc_view_core::{Aabb, Intersection, Light, PerspectiveCamera, Plane, Ray, RenderBackend};
use ifc_view_model::{
    ExpressId, GeometryHandle, HighlightMaterial, IfcManager, LibraryError,
    LoadProgress, LoadedModel, MaterialEntry, ModelId, NativeAttributes, NodeHandle,
    ProgressCallback, PropertySet, Result, SpatialNode, SubsetRequest, TypeProperties,
};
use nalgebra::Point3;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};

/// Render node of the loaded model
pub const MODEL_ROOT: NodeHandle = NodeHandle(1);
/// Render node returned for the selection subset
pub const OVERLAY: NodeHandle = NodeHandle(2);
/// Geometry buffer of the merged model mesh
pub const MODEL_GEOMETRY: GeometryHandle = GeometryHandle(10);

/// Small house: one storey with a wall (#186) and a slab (#220)
///
/// Face 1 of the model geometry belongs to the wall, face 0 to the slab.
pub fn house_fixture() -> Value {
    json!({
        "spatial": {
            "expressID": 1,
            "type": "IFCPROJECT",
            "Name": {"type": 1, "value": "Sample House"},
            "children": [{
                "expressID": 20,
                "type": "IFCSITE",
                "children": [{
                    "expressID": 30,
                    "type": "IFCBUILDING",
                    "children": [{
                        "expressID": 40,
                        "type": "IFCBUILDINGSTOREY",
                        "Name": {"type": 1, "value": "Ground Floor"},
                        "children": [
                            {"expressID": 186, "type": "IFCWALL", "children": []},
                            {"expressID": 220, "type": "IFCSLAB", "children": []}
                        ]
                    }]
                }]
            }]
        },
        "items": {
            "186": {
                "expressID": 186,
                "type": 2391406946u32,
                "GlobalId": {"type": 1, "value": "2O2Fr$t4X7Zf8NOew3FLOH"},
                "Name": {"type": 1, "value": "Basic Wall:Exterior"},
                "PredefinedType": {"type": 3, "value": "STANDARD"}
            },
            "220": {
                "expressID": 220,
                "type": 1529196076u32,
                "Name": {"type": 1, "value": "Floor:Concrete"}
            }
        },
        "psets": {
            "186": [{
                "expressID": 300,
                "Name": {"type": 1, "value": "Pset_WallCommon"},
                "HasProperties": [{
                    "expressID": 301,
                    "Name": {"type": 1, "value": "IsExternal"},
                    "NominalValue": {"type": 3, "value": "T"}
                }]
            }]
        },
        "types": {
            "186": [{
                "expressID": 400,
                "type": "IFCWALLTYPE",
                "Name": {"type": 1, "value": "Exterior - 300mm"}
            }]
        },
        "materials": {
            "186": [{
                "expressID": 500,
                "Name": {"type": 1, "value": "Brick"},
                "Category": {"type": 1, "value": "Masonry"}
            }]
        },
        "faces": {"0": 220, "1": 186}
    })
}

/// IFC library double answering from a JSON fixture
pub struct FixtureLibrary {
    fixture: Value,
    model_counter: Cell<u32>,
    pub progress: Vec<LoadProgress>,
    pub fail_load: Option<LibraryError>,
    pub fail_close: Cell<bool>,
    pub closed: RefCell<Vec<ModelId>>,
    pub subsets: RefCell<Vec<SubsetRequest>>,
    pub disposed: Cell<bool>,
}

impl FixtureLibrary {
    pub fn new(fixture: Value) -> Self {
        Self {
            fixture,
            model_counter: Cell::new(0),
            progress: vec![
                LoadProgress::new(0.0, 2048.0),
                LoadProgress::new(1024.0, 2048.0),
                LoadProgress::new(2048.0, 2048.0),
            ],
            fail_load: None,
            fail_close: Cell::new(false),
            closed: RefCell::default(),
            subsets: RefCell::default(),
            disposed: Cell::new(false),
        }
    }

    fn lookup(&self, table: &str, id: ExpressId) -> &Value {
        &self.fixture[table][id.0.to_string()]
    }
}

impl IfcManager for FixtureLibrary {
    async fn load_model(
        &self,
        _url: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<LoadedModel> {
        if let Some(report) = on_progress {
            for event in &self.progress {
                report(*event);
            }
        }
        if let Some(err) = &self.fail_load {
            return Err(err.clone());
        }
        let model_id = ModelId(self.model_counter.get());
        self.model_counter.set(model_id.0 + 1);
        Ok(LoadedModel {
            model_id,
            root: MODEL_ROOT,
        })
    }

    fn close_model(&self, model: ModelId) -> Result<()> {
        self.closed.borrow_mut().push(model);
        if self.fail_close.get() {
            return Err(LibraryError::other("close failed"));
        }
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.disposed.set(true);
        Ok(())
    }

    async fn item_properties(
        &self,
        _model: ModelId,
        id: ExpressId,
        _recursive: bool,
    ) -> Result<NativeAttributes> {
        match self.lookup("items", id) {
            Value::Null => Err(LibraryError::malformed(format!("no entity {}", id))),
            item => NativeAttributes::from_json(item),
        }
    }

    async fn property_sets(
        &self,
        _model: ModelId,
        id: ExpressId,
        _recursive: bool,
    ) -> Result<Vec<PropertySet>> {
        PropertySet::list_from_json(self.lookup("psets", id))
    }

    async fn type_properties(
        &self,
        _model: ModelId,
        id: ExpressId,
        _recursive: bool,
    ) -> Result<Vec<TypeProperties>> {
        TypeProperties::list_from_json(self.lookup("types", id))
    }

    async fn material_properties(
        &self,
        _model: ModelId,
        id: ExpressId,
        _recursive: bool,
    ) -> Result<Vec<MaterialEntry>> {
        MaterialEntry::list_from_json(self.lookup("materials", id))
    }

    async fn spatial_structure(&self, _model: ModelId, _recursive: bool) -> Result<SpatialNode> {
        SpatialNode::from_json(&self.fixture["spatial"])
    }

    fn express_id_at(&self, geometry: GeometryHandle, face_index: u32) -> Option<ExpressId> {
        if geometry != MODEL_GEOMETRY {
            return None;
        }
        self.fixture["faces"][face_index.to_string()]
            .as_f64()
            .and_then(ExpressId::from_f64)
    }

    fn create_subset(&self, request: &SubsetRequest) -> Result<NodeHandle> {
        self.subsets.borrow_mut().push(request.clone());
        Ok(OVERLAY)
    }

    fn remove_subset(
        &self,
        _model: ModelId,
        _material: &HighlightMaterial,
        custom_id: &str,
    ) -> Result<()> {
        if self.subsets.borrow().is_empty() {
            return Err(LibraryError::subset(custom_id, "nothing to remove"));
        }
        Ok(())
    }
}

/// Renderer whose model is a single box
///
/// Hits left of `x = -1.5` report face 0, everything else face 1.
#[derive(Default)]
pub struct BoxRenderer {
    pub children: Vec<NodeHandle>,
    pub clipping: Vec<Plane>,
    pub local_clipping: bool,
    pub lights: Vec<Light>,
    pub frames_drawn: u32,
    pub disposed: bool,
}

impl BoxRenderer {
    pub fn model_bounds() -> Aabb {
        Aabb::new(Point3::new(-3.0, 0.0, -1.0), Point3::new(3.0, 2.0, 1.0))
    }
}

impl RenderBackend for BoxRenderer {
    fn set_background(&mut self, _color: u32) {}

    fn set_pixel_ratio(&mut self, _ratio: f64) {}

    fn set_size(&mut self, _width: u32, _height: u32) {}

    fn add_light(&mut self, light: Light) -> NodeHandle {
        self.lights.push(light);
        NodeHandle(100 + self.lights.len() as u64)
    }

    fn add_to_scene(&mut self, node: NodeHandle) {
        self.children.push(node);
    }

    fn remove_from_scene(&mut self, node: NodeHandle) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != node);
        self.children.len() != before
    }

    fn scene_children(&self) -> Vec<NodeHandle> {
        self.children.clone()
    }

    fn bounding_box(&self, node: NodeHandle) -> Option<Aabb> {
        (node == MODEL_ROOT).then(Self::model_bounds)
    }

    fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        if !self.children.contains(&MODEL_ROOT) {
            return Vec::new();
        }
        let bounds = Self::model_bounds();
        let Some(distance) = bounds.ray_intersection(ray) else {
            return Vec::new();
        };
        let point = ray.at(distance);
        let face = if point.x < -1.5 { 0 } else { 1 };
        vec![Intersection {
            distance,
            point,
            node: MODEL_ROOT,
            geometry: Some(MODEL_GEOMETRY),
            face_index: Some(face),
        }]
    }

    fn set_clipping_planes(&mut self, planes: &[Plane], local_clipping: bool) {
        self.clipping = planes.to_vec();
        self.local_clipping = local_clipping;
    }

    fn render(&mut self, _camera: &PerspectiveCamera) {
        self.frames_drawn += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
