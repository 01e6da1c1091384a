//! WASM bridge: browser probes, the Kepler oracle and the frame-loop
//! exports the TypeScript host calls.

pub mod kepler;
pub mod probe;
pub mod runner;

use std::cell::RefCell;

use orrery_engine::InputEvent;
use wasm_bindgen::prelude::*;

pub use kepler::KeplerOracle;
pub use probe::WebProbeSource;
pub use runner::EngineRunner;

thread_local! {
    static RUNNER: RefCell<Option<EngineRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the runner, or return `fallback` before `engine_init`.
fn with_runner<R>(fallback: R, f: impl FnOnce(&mut EngineRunner) -> R) -> R {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner),
        None => {
            log::warn!("Engine not initialized. Call engine_init() first.");
            fallback
        }
    })
}

#[wasm_bindgen]
pub fn engine_init(config_json: &str, query: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = EngineRunner::new(config_json, query)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("orrery: initialized");
    Ok(())
}

#[wasm_bindgen]
pub fn engine_tick(dt: f64, frame_ms: f64) -> u32 {
    with_runner(0, |r| r.tick(dt, frame_ms))
}

#[wasm_bindgen]
pub fn engine_key_down(key_code: u32) {
    with_runner((), |r| r.push_input(InputEvent::KeyDown { key_code }));
}

#[wasm_bindgen]
pub fn engine_resize(width: u32, height: u32) {
    with_runner((), |r| r.push_input(InputEvent::Resize { width, height }));
}

/// Hook to `navigator.connection`'s `change` event.
#[wasm_bindgen]
pub fn engine_connection_change() {
    with_runner((), |r| r.push_input(InputEvent::ConnectionChange));
}

#[wasm_bindgen]
pub fn engine_custom_event(kind: u32, a: f64, b: f64, c: f64) {
    with_runner((), |r| r.push_input(InputEvent::Custom { kind, a, b, c }));
}

#[wasm_bindgen]
pub fn engine_memory(used_bytes: f64, limit_bytes: f64) {
    with_runner((), |r| r.record_memory(used_bytes, limit_bytes));
}

/// Register a cinematic track. Returns its name.
#[wasm_bindgen]
pub fn engine_load_track(json: &str) -> Result<String, JsValue> {
    with_runner(Err(JsValue::from_str("engine not initialized")), |r| {
        r.load_track(json)
            .map_err(|err| JsValue::from_str(&err.to_string()))
    })
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_snapshot_json() -> String {
    with_runner(String::new(), |r| r.snapshot_json())
}

#[wasm_bindgen]
pub fn get_quality_json() -> String {
    with_runner(String::new(), |r| r.quality_json())
}

#[wasm_bindgen]
pub fn get_profile_json() -> String {
    with_runner(String::new(), |r| r.profile_json())
}

#[wasm_bindgen]
pub fn get_status_sentence() -> String {
    with_runner(String::new(), |r| r.status_sentence())
}

#[wasm_bindgen]
pub fn get_positions_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.positions_ptr())
}

#[wasm_bindgen]
pub fn get_position_count() -> u32 {
    with_runner(0, |r| r.position_count())
}

#[wasm_bindgen]
pub fn get_buffer_len() -> u32 {
    with_runner(0, |r| r.buffer_len_floats())
}
