// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser console logger
//!
//! Debug output is off unless the page URL carries `?debug=1`.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::atomic::{AtomicBool, Ordering};

/// Global debug mode flag (set from URL parameter ?debug=1)
static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

static LOGGER: ConsoleLogger = ConsoleLogger;

pub fn is_debug() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

/// Initialize debug mode from URL parameters
pub fn init_debug_from_url() {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Ok(search) = window.location().search() {
        if search.contains("debug=1") || search.contains("debug=true") {
            DEBUG_MODE.store(true, Ordering::Relaxed);
            // Always log this one
            web_sys::console::log_1(&"[IFC-View] Debug mode enabled via URL".into());
        }
    }
}

/// Install the console logger; later calls only adjust the level
pub fn init() {
    init_debug_from_url();
    // Fails only if a logger is already installed, which is fine
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if is_debug() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info || is_debug()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = wasm_bindgen::JsValue::from(format!("{}", record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            Level::Info => web_sys::console::info_1(&message),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}
