//! Browser bindings
//!
//! A thin `wasm_bindgen` wrapper over `LaunchController`. Structured values
//! cross the boundary as JSON strings; errors come back as JS strings.

use std::fmt::Display;

use wasm_bindgen::prelude::*;

use crate::params::ParameterSet;
use crate::settings::Settings;
use crate::sim::{Archetype, LaunchController};

fn to_js(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json(value: &impl serde::Serialize) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(to_js)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the first logger
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Trebuchet Sim starting...");
}

#[wasm_bindgen]
pub struct TrebuchetApp {
    controller: LaunchController,
}

#[wasm_bindgen]
impl TrebuchetApp {
    /// `settings_json` may be partial; missing fields take defaults
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<TrebuchetApp, JsValue> {
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(to_js)?,
            None => Settings::default(),
        };
        Ok(Self {
            controller: LaunchController::new(settings),
        })
    }

    /// Parameter schema for an archetype, as JSON
    #[wasm_bindgen(js_name = getDefaultParameters)]
    pub fn get_default_parameters(&self, archetype: &str) -> Result<String, JsValue> {
        let archetype = Archetype::from_name(archetype)
            .ok_or_else(|| to_js(format!("unknown archetype '{}'", archetype)))?;
        to_json(&LaunchController::default_parameters(archetype))
    }

    /// Rebuild; `params_json` is a `{ name: value }` object or absent for defaults
    #[wasm_bindgen(js_name = buildTrebuchet)]
    pub fn build_trebuchet(&mut self, archetype: &str, params_json: Option<String>) -> Result<(), JsValue> {
        let params = match params_json {
            Some(json) => Some(serde_json::from_str::<ParameterSet>(&json).map_err(to_js)?),
            None => None,
        };
        self.controller.build_trebuchet(archetype, params).map_err(to_js)
    }

    pub fn fire(&mut self) -> bool {
        self.controller.fire()
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    pub fn pause(&mut self) -> bool {
        self.controller.pause()
    }

    pub fn step(&mut self, n: u32) {
        self.controller.step(n);
    }

    /// Feed one animation frame's worth of time; returns ticks run
    pub fn tick(&mut self, frame_dt: f32) -> u32 {
        self.controller.update(frame_dt)
    }

    #[wasm_bindgen(js_name = updateParameter)]
    pub fn update_parameter(&mut self, name: &str, value: f32) -> Result<(), JsValue> {
        self.controller.update_parameter(name, value).map_err(to_js)
    }

    /// Two-decimal display strings
    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<String, JsValue> {
        to_json(&self.controller.formatted_stats())
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        to_json(&self.controller.snapshot())
    }

    /// Launch events since the previous call
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        to_json(&self.controller.drain_events())
    }

    pub fn records(&self) -> Result<String, JsValue> {
        to_json(self.controller.records())
    }

    pub fn phase(&self) -> String {
        self.controller.phase().as_str().to_string()
    }

    #[wasm_bindgen(js_name = isPaused)]
    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }
}
