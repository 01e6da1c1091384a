//! Browser capability probes over `web-sys`.
//!
//! Non-standard APIs (`navigator.connection`, `navigator.deviceMemory`,
//! `performance.memory`) are read through `js_sys::Reflect` since browsers
//! that lack them simply return `undefined`.

use js_sys::Reflect;
use orrery_engine::{ConnectionInfo, NetworkClass, ProbeError, ProbeSource, WebGlInfo, WebGlTier};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, Navigator, WebGl2RenderingContext, WebGlRenderingContext, Window};

/// `WEBGL_debug_renderer_info.UNMASKED_RENDERER_WEBGL`
const UNMASKED_RENDERER_WEBGL: u32 = 0x9246;

pub struct WebProbeSource {
    window: Option<Window>,
}

impl WebProbeSource {
    pub fn new() -> Self {
        Self {
            window: web_sys::window(),
        }
    }

    fn window(&self, probe: &'static str) -> Result<&Window, ProbeError> {
        self.window.as_ref().ok_or(ProbeError::Unavailable(probe))
    }

    fn navigator(&self, probe: &'static str) -> Result<Navigator, ProbeError> {
        Ok(self.window(probe)?.navigator())
    }

    /// `performance.memory` as (used, limit) bytes. Chromium only.
    pub fn heap_usage(&self) -> Option<(f64, f64)> {
        let performance = self.window.as_ref()?.performance()?;
        let memory = Reflect::get(&performance, &JsValue::from_str("memory")).ok()?;
        if memory.is_undefined() {
            return None;
        }
        let used = Reflect::get(&memory, &JsValue::from_str("usedJSHeapSize")).ok()?.as_f64()?;
        let limit = Reflect::get(&memory, &JsValue::from_str("jsHeapSizeLimit")).ok()?.as_f64()?;
        Some((used, limit))
    }

    fn canvas(&self) -> Result<HtmlCanvasElement, ProbeError> {
        let document = self
            .window("webgl")?
            .document()
            .ok_or(ProbeError::Unavailable("webgl"))?;
        document
            .create_element("canvas")
            .map_err(|e| invalid("webgl", e))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ProbeError::Unavailable("webgl"))
    }
}

impl Default for WebProbeSource {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(probe: &'static str, value: JsValue) -> ProbeError {
    ProbeError::Invalid {
        probe,
        detail: format!("{:?}", value),
    }
}

/// Unmasked GPU name. Needs the debug extension, which privacy-minded
/// browsers withhold.
fn renderer_name(
    extension: Option<js_sys::Object>,
    parameter: impl Fn(u32) -> Result<JsValue, JsValue>,
) -> Option<String> {
    extension.as_ref()?;
    parameter(UNMASKED_RENDERER_WEBGL).ok()?.as_string()
}

impl ProbeSource for WebProbeSource {
    fn now_ms(&self) -> f64 {
        self.window
            .as_ref()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn max_touch_points(&self) -> Result<u32, ProbeError> {
        let points = self.navigator("touch")?.max_touch_points();
        Ok(points.max(0) as u32)
    }

    fn user_agent(&self) -> Result<String, ProbeError> {
        self.navigator("user_agent")?
            .user_agent()
            .map_err(|e| invalid("user_agent", e))
    }

    fn pixel_ratio(&self) -> Result<f64, ProbeError> {
        Ok(self.window("pixel_ratio")?.device_pixel_ratio())
    }

    fn viewport(&self) -> Result<(u32, u32), ProbeError> {
        let window = self.window("viewport")?;
        let dimension = |v: Result<JsValue, JsValue>| -> Result<u32, ProbeError> {
            let v = v.map_err(|e| invalid("viewport", e))?;
            v.as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u32)
                .ok_or_else(|| invalid("viewport", v))
        };
        Ok((dimension(window.inner_width())?, dimension(window.inner_height())?))
    }

    fn connection(&self) -> Result<ConnectionInfo, ProbeError> {
        let navigator = self.navigator("connection")?;
        if !navigator.on_line() {
            return Ok(ConnectionInfo {
                class: NetworkClass::Offline,
                save_data: false,
            });
        }
        let connection = Reflect::get(&navigator, &JsValue::from_str("connection"))
            .map_err(|e| invalid("connection", e))?;
        if connection.is_undefined() || connection.is_null() {
            return Err(ProbeError::Unavailable("connection"));
        }
        let class = Reflect::get(&connection, &JsValue::from_str("effectiveType"))
            .ok()
            .and_then(|v| v.as_string())
            .map(|s| NetworkClass::from_effective_type(&s))
            .unwrap_or(NetworkClass::Unknown);
        let save_data = Reflect::get(&connection, &JsValue::from_str("saveData"))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(ConnectionInfo { class, save_data })
    }

    fn prefers_reduced_motion(&self) -> Result<bool, ProbeError> {
        let query = self
            .window("reduced_motion")?
            .match_media("(prefers-reduced-motion: reduce)")
            .map_err(|e| invalid("reduced_motion", e))?
            .ok_or(ProbeError::Unavailable("reduced_motion"))?;
        Ok(query.matches())
    }

    fn webgl(&self) -> Result<WebGlInfo, ProbeError> {
        let canvas = self.canvas()?;

        if let Ok(Some(ctx)) = canvas.get_context("webgl2") {
            if let Ok(gl) = ctx.dyn_into::<WebGl2RenderingContext>() {
                let max_texture_size = gl
                    .get_parameter(WebGl2RenderingContext::MAX_TEXTURE_SIZE)
                    .map_err(|e| invalid("webgl", e))?
                    .as_f64()
                    .unwrap_or(2048.0) as u32;
                let ext = gl.get_extension("WEBGL_debug_renderer_info").ok().flatten();
                return Ok(WebGlInfo {
                    tier: WebGlTier::WebGl2,
                    max_texture_size,
                    renderer: renderer_name(ext, |p| gl.get_parameter(p)),
                });
            }
        }

        if let Ok(Some(ctx)) = canvas.get_context("webgl") {
            if let Ok(gl) = ctx.dyn_into::<WebGlRenderingContext>() {
                let max_texture_size = gl
                    .get_parameter(WebGlRenderingContext::MAX_TEXTURE_SIZE)
                    .map_err(|e| invalid("webgl", e))?
                    .as_f64()
                    .unwrap_or(2048.0) as u32;
                let ext = gl.get_extension("WEBGL_debug_renderer_info").ok().flatten();
                return Ok(WebGlInfo {
                    tier: WebGlTier::WebGl1,
                    max_texture_size,
                    renderer: renderer_name(ext, |p| gl.get_parameter(p)),
                });
            }
        }

        Ok(WebGlInfo {
            tier: WebGlTier::None,
            max_texture_size: 0,
            renderer: None,
        })
    }

    fn hardware_concurrency(&self) -> Result<u32, ProbeError> {
        let cores = self.navigator("hardware_concurrency")?.hardware_concurrency();
        if cores.is_finite() && cores >= 1.0 {
            Ok(cores as u32)
        } else {
            Err(ProbeError::Invalid {
                probe: "hardware_concurrency",
                detail: cores.to_string(),
            })
        }
    }

    fn device_memory_gb(&self) -> Result<f64, ProbeError> {
        let navigator = self.navigator("device_memory")?;
        Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
            .ok()
            .and_then(|v| v.as_f64())
            .ok_or(ProbeError::Unavailable("device_memory"))
    }
}
