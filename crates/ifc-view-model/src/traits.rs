// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary traits for the external IFC library and user files
//!
//! Everything here is single-threaded: implementations live on the browser's
//! main thread and hand out `!Send` futures.

use crate::{
    ExpressId, GeometryHandle, HighlightMaterial, LoadProgress, LoadedModel, MaterialEntry,
    ModelId, NativeAttributes, NodeHandle, PropertySet, Result, SpatialNode, SubsetRequest,
    TypeProperties,
};

/// Progress callback type for load operations
pub type ProgressCallback = Box<dyn Fn(LoadProgress)>;

/// The external IFC parsing/geometry library
///
/// The library keeps every open model in its own in-memory store; the viewer
/// only ever refers to models and elements by id. All property queries take a
/// `recursive` flag asking the library to resolve linked entities in place
/// instead of returning bare references.
#[allow(async_fn_in_trait)]
pub trait IfcManager {
    /// Stream the file behind `url` through the parser and build its render
    /// representation
    async fn load_model(
        &self,
        url: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<LoadedModel>;

    /// Release one model's parser-side resources
    fn close_model(&self, model: ModelId) -> Result<()>;

    /// Release everything the library holds
    async fn dispose(&self) -> Result<()>;

    /// Native attributes of one element
    async fn item_properties(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<NativeAttributes>;

    /// Property and quantity sets related to the element
    async fn property_sets(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<PropertySet>>;

    /// Type objects of the element with their property sets
    async fn type_properties(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<TypeProperties>>;

    /// Material assignments of the element
    async fn material_properties(
        &self,
        model: ModelId,
        id: ExpressId,
        recursive: bool,
    ) -> Result<Vec<MaterialEntry>>;

    /// Spatial containment hierarchy of the model
    async fn spatial_structure(&self, model: ModelId, recursive: bool) -> Result<SpatialNode>;

    /// Map a hit face of a render geometry back to the element that owns it
    ///
    /// Returns `None` when the library has no numeric id for that face.
    fn express_id_at(&self, geometry: GeometryHandle, face_index: u32) -> Option<ExpressId>;

    /// Build a subset of the model's geometry rendered with `request.material`
    ///
    /// Returns the subset's render node; the caller decides where it goes in
    /// the scene.
    fn create_subset(&self, request: &SubsetRequest) -> Result<NodeHandle>;

    /// Forget a subset previously created under `custom_id`
    fn remove_subset(
        &self,
        model: ModelId,
        material: &HighlightMaterial,
        custom_id: &str,
    ) -> Result<()>;
}

/// A file chosen by the user
pub trait FileSource {
    /// File name as shown by the picker
    fn name(&self) -> String;

    /// Size in bytes, when known
    fn size(&self) -> Option<u64>;

    /// Expose the file under a temporary local URL
    fn create_object_url(&self) -> Result<String>;

    /// Release a URL obtained from [`FileSource::create_object_url`]
    fn revoke_object_url(&self, url: &str);
}
