// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host doubles shared by the unit and integration tests: container
//! surface, frame queue and picked file

#![allow(dead_code)]

use ifc_view_core::{
    FrameId, FrameScheduler, PointerEvent, PointerEventKind, Rect, Surface, Unsubscribe,
};
use ifc_view_model::{FileSource, LibraryError, Result};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

type ResizeHandlers = Rc<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>;
type PointerHandlers = Rc<RefCell<Vec<(u64, PointerEventKind, Rc<dyn Fn(PointerEvent)>)>>>;

/// Container element with a settable size
pub struct FakeSurface {
    size: Cell<(u32, u32)>,
    pub mounted: Cell<u32>,
    pub cleared: Cell<u32>,
    resize: ResizeHandlers,
    pointer: PointerHandlers,
    next_id: Cell<u64>,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
            mounted: Cell::new(0),
            cleared: Cell::new(0),
            resize: Rc::default(),
            pointer: Rc::default(),
            next_id: Cell::new(0),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    pub fn fire_resize(&self) {
        let handlers: Vec<_> = self.resize.borrow().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn pointer(&self, event: PointerEvent) {
        let handlers: Vec<_> = self
            .pointer
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Primary-button press at client coordinates
    pub fn press(&self, x: f64, y: f64) {
        self.pointer(PointerEvent::new(PointerEventKind::Down, x, y));
    }

    /// Press and release at the same spot
    pub fn click(&self, x: f64, y: f64) {
        self.press(x, y);
        self.pointer(PointerEvent::new(PointerEventKind::Up, x, y));
    }

    /// Emptied at least once
    pub fn is_empty(&self) -> bool {
        self.cleared.get() > 0
    }

    pub fn listener_count(&self) -> usize {
        self.resize.borrow().len() + self.pointer.borrow().len()
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl Surface for FakeSurface {
    fn client_size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn bounding_rect(&self) -> Rect {
        let (width, height) = self.size.get();
        Rect {
            left: 0.0,
            top: 0.0,
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    fn mount_canvas(&self) {
        self.mounted.set(self.mounted.get() + 1);
    }

    fn clear(&self) {
        self.cleared.set(self.cleared.get() + 1);
    }

    fn on_resize(&self, handler: Rc<dyn Fn()>) -> Unsubscribe {
        let id = self.next_id();
        self.resize.borrow_mut().push((id, handler));
        let handlers = self.resize.clone();
        Box::new(move || handlers.borrow_mut().retain(|(i, _)| *i != id))
    }

    fn on_pointer(&self, kind: PointerEventKind, handler: Rc<dyn Fn(PointerEvent)>) -> Unsubscribe {
        let id = self.next_id();
        self.pointer.borrow_mut().push((id, kind, handler));
        let handlers = self.pointer.clone();
        Box::new(move || handlers.borrow_mut().retain(|(i, _, _)| *i != id))
    }
}

/// Frame scheduler that only runs frames when told to
#[derive(Default)]
pub struct ManualFrames {
    queue: RefCell<VecDeque<(FrameId, Box<dyn FnOnce()>)>>,
    next: Cell<i32>,
}

impl ManualFrames {
    /// Run the oldest pending frame; `false` if none was queued
    pub fn run_next(&self) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some((_, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Run up to `count` frames, including ones queued along the way
    pub fn pump(&self, count: usize) {
        for _ in 0..count {
            if !self.run_next() {
                return;
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> FrameId {
        let id = FrameId(self.next.get() + 1);
        self.next.set(id.0);
        self.queue.borrow_mut().push_back((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameId) {
        self.queue.borrow_mut().retain(|(i, _)| *i != id);
    }
}

pub struct FakeFile {
    name: String,
    created: RefCell<Vec<String>>,
    revoked: RefCell<Vec<String>>,
    pub fail_url: Cell<bool>,
}

impl FakeFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created: RefCell::default(),
            revoked: RefCell::default(),
            fail_url: Cell::new(false),
        }
    }

    pub fn created(&self) -> Vec<String> {
        self.created.borrow().clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.borrow().clone()
    }

    /// URLs created but not yet revoked
    pub fn open_urls(&self) -> Vec<String> {
        let revoked = self.revoked.borrow();
        self.created
            .borrow()
            .iter()
            .filter(|url| !revoked.contains(url))
            .cloned()
            .collect()
    }
}

impl FileSource for FakeFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> Option<u64> {
        Some(1024)
    }

    fn create_object_url(&self) -> Result<String> {
        if self.fail_url.get() {
            return Err(LibraryError::other("file is no longer readable"));
        }
        let mut created = self.created.borrow_mut();
        let url = format!("blob:test/{}-{}", self.name, created.len());
        created.push(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        self.revoked.borrow_mut().push(url.to_string());
    }
}
