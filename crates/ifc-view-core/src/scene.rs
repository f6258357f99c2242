// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene host: renderer setup, camera, orbit controls, render loop
//!
//! [`SceneHost`] owns the lifecycle (listeners, frame loop, disposal).
//! [`SceneHandle`] is the cheap, clonable view of the scene that the loader,
//! picker and facade share.

use crate::backend::{
    FrameId, FrameScheduler, Intersection, Light, PointerEvent, PointerEventKind, RenderBackend, Surface,
    Unsubscribe,
};
use crate::camera::{Aabb, CameraFit, OrbitControls, PerspectiveCamera, Ray};
use crate::config::ViewerConfig;
use crate::section::Plane;
use ifc_view_model::NodeHandle;
use nalgebra::{Point3, Vector2};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Mutable scene state behind a [`SceneHandle`]
pub(crate) struct SceneState<B> {
    backend: B,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    size: (u32, u32),
    clipping: Vec<Plane>,
    local_clipping: bool,
    frame: Option<FrameId>,
    disposed: bool,
}

impl<B: RenderBackend> SceneState<B> {
    fn draw(&mut self) {
        self.controls.update(&mut self.camera);
        self.backend.render(&self.camera);
    }
}

/// Shared handle to the scene graph, camera and controls
pub struct SceneHandle<B> {
    state: Rc<RefCell<SceneState<B>>>,
}

impl<B> Clone for SceneHandle<B> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<B: RenderBackend> SceneHandle<B> {
    /// Add an object to the scene; ignored after disposal
    pub fn add(&self, node: NodeHandle) {
        let mut state = self.state.borrow_mut();
        if !state.disposed {
            state.backend.add_to_scene(node);
        }
    }

    pub fn remove(&self, node: NodeHandle) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return false;
        }
        state.backend.remove_from_scene(node)
    }

    pub fn children(&self) -> Vec<NodeHandle> {
        self.state.borrow().backend.scene_children()
    }

    pub fn contains(&self, node: NodeHandle) -> bool {
        self.children().contains(&node)
    }

    pub fn bounding_box(&self, node: NodeHandle) -> Option<Aabb> {
        self.state.borrow().backend.bounding_box(node)
    }

    /// Hits along `ray` against everything in the scene, nearest first
    pub fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let state = self.state.borrow();
        if state.disposed {
            return Vec::new();
        }
        state.backend.intersect(ray)
    }

    /// Ray from the current camera through a point in normalized device coordinates
    pub fn pick_ray(&self, ndc: Vector2<f64>) -> Ray {
        self.state.borrow().camera.ray_through(ndc)
    }

    /// Snapshot of the camera
    pub fn camera(&self) -> PerspectiveCamera {
        self.state.borrow().camera.clone()
    }

    pub fn controls_target(&self) -> Point3<f64> {
        self.state.borrow().controls.target
    }

    /// Mutate camera and controls together
    pub fn with_view<R>(&self, f: impl FnOnce(&mut PerspectiveCamera, &mut OrbitControls) -> R) -> R {
        let mut state = self.state.borrow_mut();
        let SceneState {
            camera, controls, ..
        } = &mut *state;
        f(camera, controls)
    }

    /// Frame `node` with the camera; `false` if it has no usable bounds
    pub fn fit_to(&self, node: NodeHandle, distance_factor: f64) -> bool {
        let Some(bounds) = self.bounding_box(node) else {
            return false;
        };
        match CameraFit::from_bounds(&bounds, distance_factor) {
            Some(fit) => {
                self.with_view(|camera, controls| fit.apply(camera, controls));
                log::debug!(
                    "[Scene] Fitted camera to {:?}, distance {:.2}",
                    fit.target,
                    (fit.position - fit.target).norm()
                );
                true
            }
            None => {
                log::debug!("[Scene] Skipping fit, bounds are empty or not finite");
                false
            }
        }
    }

    /// Install global clipping planes
    ///
    /// A non-empty list enables local clipping; `None` or an empty list clears
    /// clipping and disables it.
    pub fn set_clipping_planes(&self, planes: Option<&[Plane]>) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        let planes = planes.unwrap_or_default();
        state.clipping = planes.to_vec();
        state.local_clipping = !planes.is_empty();
        let local = state.local_clipping;
        state.backend.set_clipping_planes(planes, local);
    }

    pub fn clipping_planes(&self) -> Vec<Plane> {
        self.state.borrow().clipping.clone()
    }

    pub fn is_local_clipping_enabled(&self) -> bool {
        self.state.borrow().local_clipping
    }

    /// Borrow the render backend
    pub fn with_backend<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.state.borrow().backend)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }
}

/// Owns the renderer, the frame loop and the surface listeners
pub struct SceneHost<B> {
    scene: SceneHandle<B>,
    surface: Rc<dyn Surface>,
    frames: Rc<dyn FrameScheduler>,
    listeners: RefCell<Vec<Unsubscribe>>,
    disposed: Cell<bool>,
}

impl<B: RenderBackend + 'static> SceneHost<B> {
    /// Set up the renderer on `surface` and mount its canvas
    ///
    /// The frame loop does not run until [`start`](Self::start).
    pub fn new(
        surface: Rc<dyn Surface>,
        frames: Rc<dyn FrameScheduler>,
        mut backend: B,
        config: &ViewerConfig,
    ) -> Self {
        let (width, height) = clamped_size(surface.as_ref());
        let mut camera = PerspectiveCamera::from_config(&config.camera, aspect(width, height));
        let mut controls = OrbitControls::new(&config.controls);
        controls.update(&mut camera);

        backend.set_pixel_ratio(surface.device_pixel_ratio());
        backend.set_size(width, height);
        backend.set_background(config.scene.background);
        backend.set_clipping_planes(&[], false);
        surface.mount_canvas();

        let lights = &config.lights;
        backend.add_light(Light::Ambient {
            color: lights.ambient_color,
            intensity: lights.ambient_intensity,
        });
        let [x, y, z] = lights.directional_position;
        backend.add_light(Light::Directional {
            color: lights.directional_color,
            intensity: lights.directional_intensity,
            position: Point3::new(x, y, z),
        });

        let state = Rc::new(RefCell::new(SceneState {
            backend,
            camera,
            controls,
            size: (width, height),
            clipping: Vec::new(),
            local_clipping: false,
            frame: None,
            disposed: false,
        }));

        let host = Self {
            scene: SceneHandle { state },
            surface,
            frames,
            listeners: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        };
        host.observe_resize();
        host.attach_controls();
        log::debug!("[Scene] Initialized at {}x{}", width, height);
        host
    }

    fn observe_resize(&self) {
        let state = Rc::downgrade(&self.scene.state);
        let surface = Rc::downgrade(&self.surface);
        let unsubscribe = self.surface.on_resize(Rc::new(move || {
            if let (Some(state), Some(surface)) = (state.upgrade(), surface.upgrade()) {
                apply_resize(&state, surface.as_ref());
            }
        }));
        self.listeners.borrow_mut().push(unsubscribe);
    }

    fn attach_controls(&self) {
        for kind in [
            PointerEventKind::Down,
            PointerEventKind::Move,
            PointerEventKind::Up,
            PointerEventKind::Wheel,
        ] {
            let state = Rc::downgrade(&self.scene.state);
            let unsubscribe = self.surface.on_pointer(
                kind,
                Rc::new(move |event: PointerEvent| {
                    if let Some(state) = state.upgrade() {
                        if let Ok(mut state) = state.try_borrow_mut() {
                            drive_controls(&mut state, &event);
                        }
                    }
                }),
            );
            self.listeners.borrow_mut().push(unsubscribe);
        }
    }

    pub fn scene(&self) -> &SceneHandle<B> {
        &self.scene
    }

    /// Draw one frame now, then keep drawing on every animation frame until disposal
    pub fn start(&self) {
        if self.disposed.get() || self.is_running() {
            return;
        }
        self.scene.state.borrow_mut().draw();
        schedule_next(&self.scene.state, &self.frames);
        log::debug!("[Scene] Render loop started");
    }

    pub fn is_running(&self) -> bool {
        self.scene.state.borrow().frame.is_some()
    }

    /// Re-read the surface size; normally driven by the resize listener
    pub fn resize(&self) {
        if !self.disposed.get() {
            apply_resize(&self.scene.state, self.surface.as_ref());
        }
    }

    /// Draw one frame outside the loop
    pub fn render_frame(&self) {
        let mut state = self.scene.state.borrow_mut();
        if !state.disposed {
            state.draw();
        }
    }

    /// Stop the loop, detach listeners, release the renderer, empty the surface
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let frame = {
            let mut state = self.scene.state.borrow_mut();
            state.disposed = true;
            state.frame.take()
        };
        if let Some(frame) = frame {
            self.frames.cancel_frame(frame);
        }
        let listeners: Vec<Unsubscribe> = self.listeners.borrow_mut().drain(..).collect();
        for unsubscribe in listeners {
            unsubscribe();
        }
        {
            let mut state = self.scene.state.borrow_mut();
            state.controls.dispose();
            state.backend.dispose();
        }
        self.surface.clear();
        log::debug!("[Scene] Disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

fn schedule_next<B: RenderBackend + 'static>(
    state: &Rc<RefCell<SceneState<B>>>,
    frames: &Rc<dyn FrameScheduler>,
) {
    let weak: Weak<RefCell<SceneState<B>>> = Rc::downgrade(state);
    let scheduler = Rc::downgrade(frames);
    let id = frames.request_frame(Box::new(move || {
        let (Some(state), Some(frames)) = (weak.upgrade(), scheduler.upgrade()) else {
            return;
        };
        {
            let mut guard = state.borrow_mut();
            guard.frame = None;
            if guard.disposed {
                return;
            }
            guard.draw();
        }
        schedule_next(&state, &frames);
    }));
    state.borrow_mut().frame = Some(id);
}

fn apply_resize<B: RenderBackend>(state: &RefCell<SceneState<B>>, surface: &dyn Surface) {
    let (width, height) = clamped_size(surface);
    let mut state = state.borrow_mut();
    if state.disposed {
        return;
    }
    state.size = (width, height);
    state.camera.aspect = aspect(width, height);
    state.backend.set_size(width, height);
}

fn drive_controls<B>(state: &mut SceneState<B>, event: &PointerEvent) {
    if state.disposed {
        return;
    }
    let controls = &mut state.controls;
    match event.kind {
        PointerEventKind::Down if event.button == 0 => {
            controls.begin_drag(event.client_x, event.client_y)
        }
        PointerEventKind::Down => {}
        PointerEventKind::Move => {
            controls.drag_to(event.client_x, event.client_y, f64::from(state.size.1))
        }
        PointerEventKind::Up => controls.end_drag(),
        PointerEventKind::Wheel => controls.zoom(event.delta_y),
    }
}

fn clamped_size(surface: &dyn Surface) -> (u32, u32) {
    let (width, height) = surface.client_size();
    (width.max(1), height.max(1))
}

fn aspect(width: u32, height: u32) -> f64 {
    f64::from(width) / f64::from(height)
}
