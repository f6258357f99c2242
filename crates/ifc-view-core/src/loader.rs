// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loader: file → library → scene
//!
//! At most one model is active at a time. A successful load replaces the
//! previous one; a failed load leaves the scene as it was.

use crate::backend::RenderBackend;
use crate::error::{Result, ViewerError};
use crate::scene::SceneHandle;
use ifc_view_model::{FileSource, IfcManager, LoadProgress, ModelId, NodeHandle, ProgressCallback};
use std::cell::RefCell;
use std::rc::Rc;

/// The active model: library id plus its root in the scene
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelHandle {
    pub model_id: ModelId,
    pub root: NodeHandle,
}

/// Revokes the object URL when dropped, whatever the load outcome
struct ObjectUrl<'a, F: ?Sized + FileSource> {
    file: &'a F,
    url: String,
}

impl<F: ?Sized + FileSource> Drop for ObjectUrl<'_, F> {
    fn drop(&mut self) {
        self.file.revoke_object_url(&self.url);
    }
}

pub struct ModelLoader<M, B> {
    manager: Rc<M>,
    scene: SceneHandle<B>,
    active: RefCell<Option<ModelHandle>>,
}

impl<M: IfcManager, B: RenderBackend> ModelLoader<M, B> {
    pub fn new(manager: Rc<M>, scene: SceneHandle<B>) -> Self {
        Self {
            manager,
            scene,
            active: RefCell::new(None),
        }
    }

    pub fn manager(&self) -> &Rc<M> {
        &self.manager
    }

    /// Stream `file` through the library and make it the active model
    ///
    /// `on_progress` receives percentages in `[0, 100]`.
    pub async fn load_from_file<F: ?Sized + FileSource>(
        &self,
        file: &F,
        on_progress: Option<Box<dyn Fn(f64)>>,
    ) -> Result<ModelHandle> {
        let name = file.name();
        let url = file
            .create_object_url()
            .map_err(|source| ViewerError::ObjectUrl {
                file: name.clone(),
                source,
            })?;
        let url = ObjectUrl { file, url };
        log::debug!(
            "[Loader] Loading '{}' ({} bytes)",
            name,
            file.size().map_or_else(|| "?".to_string(), |s| s.to_string())
        );

        let progress: Option<ProgressCallback> = on_progress.map(|report| {
            Box::new(move |event: LoadProgress| report(event.percent())) as ProgressCallback
        });
        let loaded = self.manager.load_model(&url.url, progress).await;
        drop(url);
        let loaded = loaded.map_err(ViewerError::Load)?;

        self.clear();
        self.scene.add(loaded.root);
        let handle = ModelHandle {
            model_id: loaded.model_id,
            root: loaded.root,
        };
        *self.active.borrow_mut() = Some(handle);
        log::debug!("[Loader] '{}' loaded as {}", name, loaded.model_id);
        Ok(handle)
    }

    pub fn model_id(&self) -> Option<ModelId> {
        self.active().map(|h| h.model_id)
    }

    pub fn model_object(&self) -> Option<NodeHandle> {
        self.active().map(|h| h.root)
    }

    pub fn active(&self) -> Option<ModelHandle> {
        *self.active.borrow()
    }

    /// Drop the active model from the library and the scene
    ///
    /// Closing on the library side is best-effort; the scene root is removed
    /// either way.
    pub fn clear(&self) {
        let Some(handle) = self.active.borrow_mut().take() else {
            return;
        };
        if let Err(e) = self.manager.close_model(handle.model_id) {
            log::warn!("[Loader] Failed to close {}: {}", handle.model_id, e);
        }
        self.scene.remove(handle.root);
    }

    /// Clear and release every library resource
    pub async fn dispose(&self) {
        self.clear();
        if let Err(e) = self.manager.dispose().await {
            log::warn!("[Loader] Failed to dispose IFC library: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::scene::SceneHost;
    use crate::test_support::{FakeBackend, FakeFile, FakeManager, FakeSurface, ManualFrames};
    use futures::executor::block_on;
    use ifc_view_model::LibraryError;
    use std::cell::RefCell;

    fn setup(manager: &Rc<FakeManager>) -> (SceneHost<FakeBackend>, ModelLoader<FakeManager, FakeBackend>) {
        let host = SceneHost::new(
            Rc::new(FakeSurface::new(100, 100)),
            Rc::new(ManualFrames::default()),
            FakeBackend::default(),
            &ViewerConfig::default(),
        );
        let loader = ModelLoader::new(manager.clone(), host.scene().clone());
        (host, loader)
    }

    #[test]
    fn test_load_adds_root_and_revokes_url() {
        let manager = Rc::new(FakeManager::default());
        let (host, loader) = setup(&manager);
        let file = FakeFile::new("house.ifc");
        let handle = block_on(loader.load_from_file(&file, None)).unwrap();
        assert_eq!(loader.model_id(), Some(handle.model_id));
        assert_eq!(host.scene().children(), vec![handle.root]);
        assert_eq!(file.revoked(), file.created());
        assert_eq!(manager.loaded_urls.borrow().as_slice(), file.created().as_slice());
    }

    #[test]
    fn test_replacement_leaves_single_root_even_if_close_fails() {
        let manager = Rc::new(FakeManager::default());
        let (host, loader) = setup(&manager);
        let first = block_on(loader.load_from_file(&FakeFile::new("a.ifc"), None)).unwrap();
        manager.fail_close.set(true);
        let second = block_on(loader.load_from_file(&FakeFile::new("b.ifc"), None)).unwrap();
        assert_ne!(first.root, second.root);
        assert_eq!(host.scene().children(), vec![second.root]);
        assert_eq!(loader.model_id(), Some(second.model_id));
    }

    #[test]
    fn test_failed_load_keeps_previous_model_and_revokes() {
        let manager = Rc::new(FakeManager::default());
        let (host, loader) = setup(&manager);
        let first = block_on(loader.load_from_file(&FakeFile::new("a.ifc"), None)).unwrap();
        *manager.fail_load.borrow_mut() = Some(LibraryError::parse("unexpected token"));
        let file = FakeFile::new("broken.ifc");
        let err = block_on(loader.load_from_file(&file, None)).unwrap_err();
        assert!(matches!(err, ViewerError::Load(LibraryError::Parse(_))));
        assert_eq!(file.revoked().len(), 1);
        assert_eq!(host.scene().children(), vec![first.root]);
        assert_eq!(loader.model_id(), Some(first.model_id));
    }

    #[test]
    fn test_object_url_failure() {
        let manager = Rc::new(FakeManager::default());
        let (_host, loader) = setup(&manager);
        let file = FakeFile::new("locked.ifc");
        file.fail_url.set(true);
        let err = block_on(loader.load_from_file(&file, None)).unwrap_err();
        assert!(matches!(err, ViewerError::ObjectUrl { .. }));
        assert!(manager.loaded_urls.borrow().is_empty());
    }

    #[test]
    fn test_progress_is_clamped() {
        let manager = Rc::new(FakeManager::default());
        *manager.progress.borrow_mut() = vec![
            LoadProgress::new(50.0, 200.0),
            LoadProgress::new(300.0, 200.0),
            LoadProgress::new(10.0, 0.0),
            LoadProgress::default(),
            LoadProgress::new(f64::NAN, 10.0),
        ];
        let (_host, loader) = setup(&manager);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        block_on(loader.load_from_file(
            &FakeFile::new("a.ifc"),
            Some(Box::new(move |p| sink.borrow_mut().push(p))),
        ))
        .unwrap();
        assert_eq!(*seen.borrow(), vec![25.0, 100.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clear_and_dispose_swallow_failures() {
        let manager = Rc::new(FakeManager::default());
        let (host, loader) = setup(&manager);
        block_on(loader.load_from_file(&FakeFile::new("a.ifc"), None)).unwrap();
        manager.fail_close.set(true);
        manager.fail_dispose.set(true);
        block_on(loader.dispose());
        assert!(loader.model_id().is_none());
        assert!(loader.model_object().is_none());
        assert!(host.scene().children().is_empty());
        assert_eq!(manager.disposed.get(), 1);
    }
}
