//! WASM bindings for the ACC / ethylene / ACCD simulator.
//!
//! Every core failure is reported uniformly as a rejected call whose value is the
//! diagnostic message.

mod request;

pub use request::{Health, RawRequest, API_VERSION, MODEL_NAME};

use anyhow::{anyhow, Result};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| anyhow!("Failed to serialize response: {err}"))
}

fn describe(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&describe(&err))
}

pub(crate) fn run_simulation(raw: RawRequest) -> Result<accd_core::response::SimulationResult> {
    let request = raw.into_request()?;
    Ok(accd_core::simulate(&request)?)
}

#[wasm_bindgen]
pub fn simulate(request: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let raw: RawRequest = serde_wasm_bindgen::from_value(request)
        .map_err(|err| JsValue::from_str(&format!("Invalid request: {err}")))?;
    run_simulation(raw)
        .and_then(|result| to_js(&result))
        .map_err(to_js_error)
}

#[wasm_bindgen]
pub fn defaults() -> Result<JsValue, JsValue> {
    to_js(&accd_core::defaults()).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn health() -> Result<JsValue, JsValue> {
    to_js(&Health::default()).map_err(to_js_error)
}
