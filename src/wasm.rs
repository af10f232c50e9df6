//! Browser bridge
//!
//! The page owns rendering, input and `requestAnimationFrame`; it calls
//! `frame()` from its callback and stops rescheduling once it returns false.
//! While idle it calls `pollSync()` from a timer to pick up score results.

use wasm_bindgen::prelude::*;

use crate::Engine;
use crate::platform::{LocalStorage, SystemClock};
use crate::sim::RotateDir;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("Perfect Fit starting...");
}

#[wasm_bindgen]
pub struct WasmEngine {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmEngine {
    /// `tuning_json` overrides individual balance values
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<WasmEngine, JsValue> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => Tuning::default(),
        };
        let seed = js_sys::Date::now() as u64;
        Ok(Self {
            engine: Engine::new(seed, tuning, Box::new(SystemClock::new()), Box::new(LocalStorage)),
        })
    }

    pub fn start(&mut self) -> bool {
        self.engine.start()
    }

    pub fn restart(&mut self) {
        self.engine.restart();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn resume(&mut self) {
        self.engine.resume();
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&mut self) {
        self.engine.toggle_pause();
    }

    #[wasm_bindgen(js_name = rotateLeft)]
    pub fn rotate_left(&mut self) {
        self.engine.rotate(RotateDir::Left);
    }

    #[wasm_bindgen(js_name = rotateRight)]
    pub fn rotate_right(&mut self) {
        self.engine.rotate(RotateDir::Right);
    }

    /// Playfield x of a tap or click
    pub fn tap(&mut self, x: f32) {
        self.engine.tap(x);
    }

    #[wasm_bindgen(js_name = setFastDrop)]
    pub fn set_fast_drop(&mut self, held: bool) {
        self.engine.set_fast_drop(held);
    }

    pub fn frame(&mut self) -> bool {
        self.engine.frame()
    }

    /// Apply score-service answers while no frames are scheduled
    #[wasm_bindgen(js_name = pollSync)]
    pub fn poll_sync(&mut self) -> bool {
        self.engine.poll_sync()
    }

    /// Snapshot as a JSON string
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.engine.snapshot()).unwrap_or_default()
    }

    /// Gameplay events since the last call, as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        serde_json::to_string(&self.engine.drain_events()).unwrap_or_default()
    }
}
