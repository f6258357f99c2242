// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory doubles for unit tests

#[path = "../tests/common/host.rs"]
mod host;

pub use host::{FakeFile, FakeSurface, ManualFrames};

use crate::backend::{Intersection, Light, RenderBackend};
use crate::camera::{Aabb, PerspectiveCamera, Ray};
use crate::error::ViewerError;
use crate::section::Plane;
use crate::viewer::{ElementSelection, ViewerListener};
use futures::channel::oneshot;
use ifc_view_model::{
    AttributeValue, ExpressId, GeometryHandle, HighlightMaterial, IfcManager,
    LibraryError, LoadProgress, LoadedModel, MaterialEntry, ModelId, NativeAttributes, NodeHandle,
    ProgressCallback, Property, PropertySet, Result, SpatialNode, SpatialTree, SubsetRequest,
    TypeProperties,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

const ROOT_BASE: u64 = 1000;
const SUBSET_BASE: u64 = 5000;

pub struct FakeMesh {
    pub node: NodeHandle,
    pub bounds: Aabb,
    pub geometry: Option<GeometryHandle>,
    pub face_index: Option<u32>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub size: (u32, u32),
    pub background: Option<u32>,
    pub pixel_ratio: f64,
    pub lights: Vec<Light>,
    pub children: Vec<NodeHandle>,
    pub meshes: Vec<FakeMesh>,
    pub clipping: Vec<Plane>,
    pub local_clipping: bool,
    pub renders: u32,
    pub disposed: bool,
}

impl FakeBackend {
    /// Give `node` a box-shaped mesh that rays can hit
    pub fn with_mesh(
        mut self,
        node: NodeHandle,
        bounds: Aabb,
        geometry: Option<GeometryHandle>,
        face_index: Option<u32>,
    ) -> Self {
        self.meshes.push(FakeMesh {
            node,
            bounds,
            geometry,
            face_index,
        });
        self
    }
}

impl RenderBackend for FakeBackend {
    fn set_background(&mut self, color: u32) {
        self.background = Some(color);
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn add_light(&mut self, light: Light) -> NodeHandle {
        self.lights.push(light);
        NodeHandle(9000 + self.lights.len() as u64)
    }

    fn add_to_scene(&mut self, node: NodeHandle) {
        self.children.push(node);
    }

    fn remove_from_scene(&mut self, node: NodeHandle) -> bool {
        match self.children.iter().position(|c| *c == node) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }

    fn scene_children(&self) -> Vec<NodeHandle> {
        self.children.clone()
    }

    fn bounding_box(&self, node: NodeHandle) -> Option<Aabb> {
        self.meshes
            .iter()
            .filter(|m| m.node == node)
            .map(|m| m.bounds)
            .reduce(|a, b| a.union(&b))
    }

    fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = self
            .meshes
            .iter()
            .filter(|m| self.children.contains(&m.node))
            .filter_map(|m| {
                let distance = m.bounds.ray_intersection(ray)?;
                Some(Intersection {
                    distance,
                    point: ray.at(distance),
                    node: m.node,
                    geometry: m.geometry,
                    face_index: m.face_index,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn set_clipping_planes(&mut self, planes: &[Plane], local_clipping: bool) {
        self.clipping = planes.to_vec();
        self.local_clipping = local_clipping;
    }

    fn render(&mut self, _camera: &PerspectiveCamera) {
        self.renders += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Scriptable IFC library
///
/// Every element resolves to a wall named `Element <id>` with one property
/// set, one type and one material. The spatial tree is
/// project #1 / site #2 / building #3 / storey #4 / walls #10, #11, #12.
#[derive(Default)]
pub struct FakeManager {
    next_model: Cell<u32>,
    faces: RefCell<HashMap<(GeometryHandle, u32), ExpressId>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    pub progress: RefCell<Vec<LoadProgress>>,
    pub loaded_urls: RefCell<Vec<String>>,
    pub closed: RefCell<Vec<ModelId>>,
    pub recursive_flags: RefCell<Vec<bool>>,
    pub subsets: RefCell<Vec<SubsetRequest>>,
    pub removed_subsets: RefCell<Vec<String>>,
    pub disposed: Cell<u32>,
    pub fail_load: RefCell<Option<LibraryError>>,
    pub fail_materials: RefCell<Option<LibraryError>>,
    pub fail_spatial: RefCell<Option<LibraryError>>,
    pub fail_close: Cell<bool>,
    pub fail_dispose: Cell<bool>,
    pub fail_create: Cell<bool>,
    pub fail_remove: Cell<bool>,
}

impl FakeManager {
    pub fn map_face(&self, geometry: GeometryHandle, face: u32, id: ExpressId) {
        self.faces.borrow_mut().insert((geometry, face), id);
    }

    /// Root node the next successful load will return
    pub fn next_root(&self) -> NodeHandle {
        NodeHandle(ROOT_BASE + u64::from(self.next_model.get()))
    }

    /// Make the next load wait until the returned sender fires
    pub fn hold_next_load(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn tree() -> SpatialNode {
        let storey = SpatialNode::new(ExpressId(4), "IFCBUILDINGSTOREY")
            .with_name("Level 1")
            .with_child(SpatialNode::new(ExpressId(10), "IFCWALL").with_name("Wall A"))
            .with_child(SpatialNode::new(ExpressId(11), "IFCWALL").with_name("Wall B"))
            .with_child(SpatialNode::new(ExpressId(12), "IFCSLAB").with_name("Slab"));
        SpatialNode::new(ExpressId(1), "IFCPROJECT")
            .with_name("Project")
            .with_child(
                SpatialNode::new(ExpressId(2), "IFCSITE").with_child(
                    SpatialNode::new(ExpressId(3), "IFCBUILDING").with_child(storey),
                ),
            )
    }
}

impl IfcManager for FakeManager {
    async fn load_model(
        &self,
        url: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<LoadedModel> {
        self.loaded_urls.borrow_mut().push(url.to_string());
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(report) = on_progress {
            let events = self.progress.borrow().clone();
            for event in events {
                report(event);
            }
        }
        if let Some(err) = self.fail_load.borrow().clone() {
            return Err(err);
        }
        let root = self.next_root();
        let model_id = ModelId(self.next_model.get());
        self.next_model.set(model_id.0 + 1);
        Ok(LoadedModel { model_id, root })
    }

    fn close_model(&self, model: ModelId) -> Result<()> {
        self.closed.borrow_mut().push(model);
        if self.fail_close.get() {
            return Err(LibraryError::ModelNotLoaded(model));
        }
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.disposed.set(self.disposed.get() + 1);
        if self.fail_dispose.get() {
            return Err(LibraryError::other("worker already terminated"));
        }
        Ok(())
    }

    async fn item_properties(
        &self,
        _model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<NativeAttributes> {
        self.recursive_flags.borrow_mut().push(recursive);
        Ok(NativeAttributes::new(id)
            .with_type("IFCWALL")
            .with_attribute("Name", AttributeValue::Text(format!("Element {}", id.0))))
    }

    async fn property_sets(
        &self,
        _model: ModelId,
        _id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<PropertySet>> {
        self.recursive_flags.borrow_mut().push(recursive);
        let mut pset = PropertySet::new("Pset_WallCommon");
        pset.add(Property::new("IsExternal", "true"));
        pset.add(Property::with_unit("Width", "0.2", "m"));
        Ok(vec![pset])
    }

    async fn type_properties(
        &self,
        _model: ModelId,
        _id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<TypeProperties>> {
        self.recursive_flags.borrow_mut().push(recursive);
        Ok(vec![TypeProperties {
            express_id: ExpressId(900),
            name: Some("Basic Wall".to_string()),
            ifc_type: Some("IFCWALLTYPE".to_string()),
            property_sets: Vec::new(),
        }])
    }

    async fn material_properties(
        &self,
        _model: ModelId,
        _id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<MaterialEntry>> {
        self.recursive_flags.borrow_mut().push(recursive);
        if let Some(err) = self.fail_materials.borrow().clone() {
            return Err(err);
        }
        Ok(vec![MaterialEntry::new(ExpressId(800), "Concrete")])
    }

    async fn spatial_structure(&self, _model: ModelId, _recursive: bool) -> Result<SpatialNode> {
        if let Some(err) = self.fail_spatial.borrow().clone() {
            return Err(err);
        }
        Ok(Self::tree())
    }

    fn express_id_at(&self, geometry: GeometryHandle, face_index: u32) -> Option<ExpressId> {
        self.faces.borrow().get(&(geometry, face_index)).copied()
    }

    fn create_subset(&self, request: &SubsetRequest) -> Result<NodeHandle> {
        if self.fail_create.get() {
            return Err(LibraryError::subset(&request.custom_id, "no geometry for ids"));
        }
        let mut subsets = self.subsets.borrow_mut();
        subsets.push(request.clone());
        Ok(NodeHandle(SUBSET_BASE + subsets.len() as u64))
    }

    fn remove_subset(
        &self,
        _model: ModelId,
        _material: &HighlightMaterial,
        custom_id: &str,
    ) -> Result<()> {
        if self.fail_remove.get() {
            return Err(LibraryError::subset(custom_id, "subset not found"));
        }
        self.removed_subsets.borrow_mut().push(custom_id.to_string());
        Ok(())
    }
}

/// Listener that records every event in order
#[derive(Default)]
pub struct RecordingListener {
    pub events: RefCell<Vec<String>>,
    pub loaded: RefCell<Vec<ModelId>>,
    pub progress: RefCell<Vec<f64>>,
    pub selections: RefCell<Vec<Option<ElementSelection>>>,
    pub trees: RefCell<Vec<SpatialTree>>,
    pub errors: RefCell<Vec<String>>,
}

impl ViewerListener for RecordingListener {
    fn on_loaded(&self, model: ModelId) {
        self.events.borrow_mut().push("loaded".to_string());
        self.loaded.borrow_mut().push(model);
    }

    fn on_load_progress(&self, percent: f64) {
        self.events.borrow_mut().push("progress".to_string());
        self.progress.borrow_mut().push(percent);
    }

    fn on_selection_changed(&self, selection: Option<&ElementSelection>) {
        self.events.borrow_mut().push("selection".to_string());
        self.selections.borrow_mut().push(selection.cloned());
    }

    fn on_spatial_tree(&self, tree: &SpatialTree) {
        self.events.borrow_mut().push("tree".to_string());
        self.trees.borrow_mut().push(tree.clone());
    }

    fn on_error(&self, error: &ViewerError) {
        self.events.borrow_mut().push("error".to_string());
        self.errors.borrow_mut().push(error.kind().to_string());
    }
}
