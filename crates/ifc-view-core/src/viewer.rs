// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer facade
//!
//! [`IfcViewer`] wires the scene host, model loader, property resolver and
//! pick selector together and reports everything through a
//! [`ViewerListener`].
//!
//! ```text
//! Empty --load--> Loading --ok--> Ready --select--> Ready
//!                    |                 \--load--> Loading
//!                    \--err--> Empty
//! ```

use crate::backend::{FrameScheduler, RenderBackend, Surface};
use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::loader::ModelLoader;
use crate::picking::PickSelector;
use crate::properties::PropertyResolver;
use crate::scene::{SceneHandle, SceneHost};
use crate::section::SectionState;
use futures_util::task::{LocalSpawn, LocalSpawnExt};
use ifc_view_model::{
    ElementProperties, ExpressId, FileSource, IfcManager, ModelId, NodeHandle, SpatialTree,
    SubsetRequest,
};
use nalgebra::Vector3;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Receives viewer events; every method defaults to a no-op
pub trait ViewerListener {
    fn on_loaded(&self, _model: ModelId) {}

    /// Load progress in percent, within `[0, 100]`
    fn on_load_progress(&self, _percent: f64) {}

    /// `None` when the selection was cleared
    fn on_selection_changed(&self, _selection: Option<&ElementSelection>) {}

    fn on_spatial_tree(&self, _tree: &SpatialTree) {}

    fn on_error(&self, _error: &ViewerError) {}
}

impl ViewerListener for () {}

impl<T: ViewerListener + ?Sized> ViewerListener for Rc<T> {
    fn on_loaded(&self, model: ModelId) {
        (**self).on_loaded(model)
    }

    fn on_load_progress(&self, percent: f64) {
        (**self).on_load_progress(percent)
    }

    fn on_selection_changed(&self, selection: Option<&ElementSelection>) {
        (**self).on_selection_changed(selection)
    }

    fn on_spatial_tree(&self, tree: &SpatialTree) {
        (**self).on_spatial_tree(tree)
    }

    fn on_error(&self, error: &ViewerError) {
        (**self).on_error(error)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViewerState {
    Empty,
    Loading,
    Ready,
}

/// The selected element with everything known about it
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSelection {
    pub model_id: ModelId,
    pub express_id: ExpressId,
    pub properties: ElementProperties,
    /// Spatial containers from the project down to the element's parent;
    /// empty when the element is not in the spatial tree
    pub spatial_path: Vec<ExpressId>,
}

#[derive(Clone, Copy, Debug)]
struct SelectionOverlay {
    model_id: ModelId,
    node: NodeHandle,
}

/// Host-side collaborators handed to [`IfcViewer::new`]
pub struct ViewerHost<B> {
    pub surface: Rc<dyn Surface>,
    pub frames: Rc<dyn FrameScheduler>,
    pub backend: B,
    /// Executor for pick-driven selection tasks
    pub spawner: Rc<dyn LocalSpawn>,
}

struct ViewerShared<M, B, L> {
    config: ViewerConfig,
    listener: L,
    manager: Rc<M>,
    scene_host: SceneHost<B>,
    loader: ModelLoader<M, B>,
    properties: PropertyResolver<M>,
    state: Cell<ViewerState>,
    selection: RefCell<Option<ElementSelection>>,
    overlay: Cell<Option<SelectionOverlay>>,
    section: RefCell<SectionState>,
    tree: RefCell<Option<Rc<SpatialTree>>>,
    disposed: Cell<bool>,
}

/// Browser-independent IFC viewer
pub struct IfcViewer<M, B, L> {
    shared: Rc<ViewerShared<M, B, L>>,
    selector: PickSelector,
}

impl<M, B, L> IfcViewer<M, B, L>
where
    M: IfcManager + 'static,
    B: RenderBackend + 'static,
    L: ViewerListener + 'static,
{
    /// Mount the scene on the host surface, start rendering and listen for picks
    pub fn new(host: ViewerHost<B>, manager: Rc<M>, listener: L, config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        let ViewerHost {
            surface,
            frames,
            backend,
            spawner,
        } = host;

        let scene_host = SceneHost::new(surface.clone(), frames, backend, &config);
        let scene = scene_host.scene().clone();
        let shared = Rc::new(ViewerShared {
            loader: ModelLoader::new(manager.clone(), scene.clone()),
            properties: PropertyResolver::new(manager.clone()),
            manager: manager.clone(),
            config,
            listener,
            scene_host,
            state: Cell::new(ViewerState::Empty),
            selection: RefCell::new(None),
            overlay: Cell::new(None),
            section: RefCell::new(SectionState::new()),
            tree: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak = Rc::downgrade(&shared);
        let selector = PickSelector::new(surface, scene, manager, move |id| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            // Failures were already reported to the listener
            let task = async move {
                let _ = shared.select(id).await;
            };
            if let Err(e) = spawner.spawn_local(task) {
                log::error!("[Viewer] Failed to spawn selection of {}: {}", id, e);
            }
        });

        shared.scene_host.start();
        log::info!("[Viewer] Ready");
        Ok(Self { shared, selector })
    }

    /// Load an IFC file, replacing the current model
    ///
    /// On success the camera is fitted to the model and the spatial tree is
    /// published. Failures are reported to the listener and returned.
    pub async fn load_ifc_file<F: ?Sized + FileSource>(&self, file: &F) -> Result<ModelId> {
        let shared = &self.shared;
        if shared.disposed.get() {
            return Err(shared.report(ViewerError::Disposed));
        }
        if shared.state.get() == ViewerState::Loading {
            return Err(shared.report(ViewerError::LoadInProgress));
        }
        shared.state.set(ViewerState::Loading);
        shared.drop_selection();
        shared.tree.borrow_mut().take();
        log::info!("[Viewer] Loading {}", file.name());

        let weak = Rc::downgrade(shared);
        let on_progress = Box::new(move |percent: f64| {
            if let Some(shared) = weak.upgrade() {
                shared.listener.on_load_progress(percent);
            }
        });
        let loaded = shared.loader.load_from_file(file, Some(on_progress)).await;

        if shared.disposed.get() {
            // Disposed mid-load: whatever the library produced is not wanted
            shared.loader.clear();
            return Err(ViewerError::Disposed);
        }
        let handle = match loaded {
            Ok(handle) => handle,
            Err(e) => {
                shared.loader.clear();
                shared.state.set(ViewerState::Empty);
                return Err(shared.report(e));
            }
        };

        shared.state.set(ViewerState::Ready);
        shared.listener.on_loaded(handle.model_id);
        shared
            .scene()
            .fit_to(handle.root, shared.config.camera.fit_distance_factor);

        let tree = match shared.properties.spatial_structure(handle.model_id).await {
            Ok(tree) => Rc::new(tree),
            Err(e) => return Err(shared.report(e)),
        };
        if shared.disposed.get() || shared.loader.model_id() != Some(handle.model_id) {
            log::debug!("[Viewer] Dropping spatial tree of replaced {}", handle.model_id);
            return Ok(handle.model_id);
        }
        *shared.tree.borrow_mut() = Some(tree.clone());
        log::info!(
            "[Viewer] {} ready, {} spatial nodes",
            handle.model_id,
            tree.node_count()
        );
        shared.listener.on_spatial_tree(&tree);
        Ok(handle.model_id)
    }

    /// Select an element programmatically, as if it had been picked
    ///
    /// Returns `Ok(None)` when no model is loaded or a load is in progress.
    pub async fn select_element_by_id(&self, id: ExpressId) -> Result<Option<ElementSelection>> {
        self.shared.select(id).await
    }

    /// Remove the highlight and forget the selection
    pub fn clear_selection(&self) {
        if !self.shared.disposed.get() {
            self.shared.drop_selection();
        }
    }

    /// Re-run the camera fit on the active model; `false` if there was nothing to fit
    pub fn fit_to_model(&self) -> bool {
        let shared = &self.shared;
        if shared.disposed.get() {
            return false;
        }
        match shared.loader.model_object() {
            Some(root) => shared
                .scene()
                .fit_to(root, shared.config.camera.fit_distance_factor),
            None => false,
        }
    }

    /// Turn the section plane on or off
    ///
    /// The plane is created on first enable; disabling keeps its offset.
    pub fn enable_section_plane(&self, active: bool) {
        let shared = &self.shared;
        if shared.disposed.get() {
            return;
        }
        let plane = {
            let mut section = shared.section.borrow_mut();
            if active {
                let [x, y, z] = shared.config.section_normal;
                section.enable(Vector3::new(x, y, z));
            } else {
                section.disable();
            }
            section.active_plane()
        };
        shared
            .scene()
            .set_clipping_planes(plane.as_ref().map(std::slice::from_ref));
        log::debug!("[Viewer] Section plane {}", if active { "on" } else { "off" });
    }

    /// Move the section plane; ignored until it has been enabled once
    pub fn set_section_offset(&self, offset: f64) {
        let shared = &self.shared;
        if shared.disposed.get() {
            return;
        }
        let installed = {
            let mut section = shared.section.borrow_mut();
            match section.set_offset(offset) {
                Some(plane) if section.is_active() => Some(plane),
                _ => None,
            }
        };
        if let Some(plane) = installed {
            shared.scene().set_clipping_planes(Some(&[plane]));
        }
    }

    pub fn state(&self) -> ViewerState {
        self.shared.state.get()
    }

    pub fn model_id(&self) -> Option<ModelId> {
        self.shared.loader.model_id()
    }

    pub fn selection(&self) -> Option<ElementSelection> {
        self.shared.selection.borrow().clone()
    }

    pub fn spatial_tree(&self) -> Option<Rc<SpatialTree>> {
        self.shared.tree.borrow().clone()
    }

    pub fn section_offset(&self) -> Option<f64> {
        self.shared.section.borrow().offset()
    }

    pub fn is_section_enabled(&self) -> bool {
        self.shared.section.borrow().is_active()
    }

    pub fn scene(&self) -> &SceneHandle<B> {
        self.shared.scene()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.shared.config
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }

    /// Tear everything down; later calls are no-ops
    pub async fn dispose(&self) {
        let shared = &self.shared;
        if shared.disposed.replace(true) {
            return;
        }
        self.selector.dispose();
        shared.scene_host.dispose();
        shared.loader.dispose().await;
        shared.overlay.set(None);
        shared.selection.borrow_mut().take();
        shared.tree.borrow_mut().take();
        shared.state.set(ViewerState::Empty);
        log::info!("[Viewer] Disposed");
    }
}

impl<M, B, L> ViewerShared<M, B, L>
where
    M: IfcManager,
    B: RenderBackend + 'static,
    L: ViewerListener,
{
    fn scene(&self) -> &SceneHandle<B> {
        self.scene_host.scene()
    }

    /// Resolve, highlight, publish
    ///
    /// Properties are resolved before the overlay is touched, so a failed
    /// query leaves the previous selection fully in place.
    async fn select(&self, id: ExpressId) -> Result<Option<ElementSelection>> {
        if self.disposed.get() {
            return Err(self.report(ViewerError::Disposed));
        }
        if self.state.get() != ViewerState::Ready {
            log::debug!("[Viewer] Not ready, ignoring selection of {}", id);
            return Ok(None);
        }
        let Some(model) = self.loader.model_id() else {
            log::debug!("[Viewer] No model loaded, ignoring selection of {}", id);
            return Ok(None);
        };

        let properties = match self.properties.element_properties(model, id).await {
            Ok(properties) => properties,
            Err(e) => return Err(self.report(e)),
        };
        if self.disposed.get()
            || self.state.get() != ViewerState::Ready
            || self.loader.model_id() != Some(model)
        {
            log::debug!("[Viewer] {} was replaced while resolving {}", model, id);
            return Ok(None);
        }

        if let Err(e) = self.highlight(model, id) {
            return Err(self.report(e));
        }

        let spatial_path = self
            .tree
            .borrow()
            .as_ref()
            .map(|tree| tree.ancestors(id))
            .unwrap_or_default();
        let selection = ElementSelection {
            model_id: model,
            express_id: id,
            properties,
            spatial_path,
        };
        *self.selection.borrow_mut() = Some(selection.clone());
        log::debug!("[Viewer] Selected {} in {}", id, model);
        self.listener.on_selection_changed(Some(&selection));
        Ok(Some(selection))
    }

    /// Replace the overlay with one showing only `id`
    fn highlight(&self, model: ModelId, id: ExpressId) -> Result<()> {
        self.remove_overlay(Some(model));
        let request = SubsetRequest {
            model_id: model,
            ids: vec![id],
            remove_previous: true,
            material: self.config.highlight.clone(),
            custom_id: self.config.selection_subset_id.clone(),
        };
        let node = self
            .manager
            .create_subset(&request)
            .map_err(|source| ViewerError::Highlight {
                element: id,
                source,
            })?;
        self.scene().add(node);
        self.overlay.set(Some(SelectionOverlay {
            model_id: model,
            node,
        }));
        Ok(())
    }

    /// Remove the current overlay, tolerating one that does not exist
    ///
    /// With no tracked overlay, `fallback` names the model whose selection
    /// subset should still be cleared on the library side.
    fn remove_overlay(&self, fallback: Option<ModelId>) {
        let previous = self.overlay.take();
        let Some(model) = previous.map(|o| o.model_id).or(fallback) else {
            return;
        };
        let removed = self.manager.remove_subset(
            model,
            &self.config.highlight,
            &self.config.selection_subset_id,
        );
        match (removed, previous) {
            (Err(e), Some(_)) => {
                log::warn!("[Viewer] Failed to remove selection subset of {}: {}", model, e)
            }
            (Err(e), None) => log::debug!("[Viewer] No selection subset to remove: {}", e),
            (Ok(()), _) => {}
        }
        if let Some(overlay) = previous {
            self.scene().remove(overlay.node);
        }
    }

    /// Remove the overlay and tell the listener if something was selected
    fn drop_selection(&self) {
        self.remove_overlay(None);
        let previous = self.selection.borrow_mut().take();
        if previous.is_some() {
            self.listener.on_selection_changed(None);
        }
    }

    fn report(&self, error: ViewerError) -> ViewerError {
        log::error!("[Viewer] {}", error);
        self.listener.on_error(&error);
        error
    }
}
