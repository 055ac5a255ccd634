//! JavaScript binding
//!
//! Wraps one `PlinkoEngine` per JS object. Paths cross the boundary as
//! `Uint8Array`s (non-zero = right) and events come back as a JSON array.

use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::engine::PlinkoEngine;
use crate::error::EngineError;

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Install the console logger and panic hook; safe to call more than once
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // Already initialised on repeat calls
    let _ = console_log::init_with_level(log::Level::Info);
}

#[wasm_bindgen]
pub struct WasmEngine {
    inner: PlinkoEngine,
}

#[wasm_bindgen]
impl WasmEngine {
    /// Build from a JSON config; an empty string uses defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmEngine, JsValue> {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(config_json).map_err(to_js)?
        };
        let inner = PlinkoEngine::new(config).map_err(to_js)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = dropBall)]
    pub fn drop_ball(&mut self, id: u32, path: &[u8]) -> Result<(), JsValue> {
        let path: Vec<bool> = path.iter().map(|b| *b != 0).collect();
        self.inner.drop_ball(id, &path).map_err(to_js)
    }

    #[wasm_bindgen(js_name = dropBallIntoBucket)]
    pub fn drop_ball_into_bucket(&mut self, id: u32, delay_ms: u32) -> Result<(), JsValue> {
        self.inner.drop_ball_into_bucket(id, delay_ms).map_err(to_js)
    }

    #[wasm_bindgen(js_name = assignPathToBall)]
    pub fn assign_path_to_ball(&mut self, id: u32, path: &[u8]) -> Result<(), JsValue> {
        let path: Vec<bool> = path.iter().map(|b| *b != 0).collect();
        self.inner.assign_path_to_ball(id, &path).map_err(to_js)
    }

    #[wasm_bindgen(js_name = openBucket)]
    pub fn open_bucket(&mut self) -> Result<u32, JsValue> {
        self.inner.open_bucket().map(|n| n as u32).map_err(to_js)
    }

    #[wasm_bindgen(js_name = areBallsSettled)]
    pub fn are_balls_settled(&mut self) -> bool {
        self.inner.are_balls_settled()
    }

    #[wasm_bindgen(js_name = resetBucket)]
    pub fn reset_bucket(&mut self) {
        self.inner.reset_bucket();
    }

    #[wasm_bindgen(js_name = clearBalls)]
    pub fn clear_balls(&mut self) {
        self.inner.clear_balls();
    }

    pub fn tick(&mut self) {
        self.inner.tick();
    }

    /// Drain queued events as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        let events = self.inner.drain_events();
        serde_json::to_string(&events).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Peg positions as a flat `[x0, y0, x1, y1, ...]` array
    #[wasm_bindgen(js_name = pegPositions)]
    pub fn peg_positions(&self) -> Vec<f32> {
        self.inner
            .lattice()
            .pegs()
            .iter()
            .flat_map(|p| [p.pos.x, p.pos.y])
            .collect()
    }

    /// Tear down; the JS object must not be used afterwards
    pub fn destroy(self) {
        self.inner.destroy();
    }
}
