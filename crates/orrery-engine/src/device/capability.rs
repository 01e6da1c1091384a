//! Device capability classification.
//!
//! The host is probed through `ProbeSource` so the logic can run against a
//! fake in tests. Every probe is optional: failures and probes that would
//! overrun the detection budget fall back to conservative (low-end) values
//! rather than holding up the first frame.

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebGlTier {
    None,
    WebGl1,
    WebGl2,
}

/// Network Information API `effectiveType`, plus offline/unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkClass {
    Offline,
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    Unknown,
}

impl NetworkClass {
    pub fn from_effective_type(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => NetworkClass::Slow2g,
            "2g" => NetworkClass::TwoG,
            "3g" => NetworkClass::ThreeG,
            "4g" => NetworkClass::FourG,
            "offline" => NetworkClass::Offline,
            _ => NetworkClass::Unknown,
        }
    }

    /// Slow links where texture and mesh budgets should be capped.
    pub fn is_metered(self) -> bool {
        matches!(self, NetworkClass::Slow2g | NetworkClass::TwoG | NetworkClass::ThreeG)
    }
}

/// Viewport width class. Crossing one triggers re-derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    Compact,
    Medium,
    Expanded,
}

impl Breakpoint {
    pub fn from_width(width: u32) -> Self {
        match width {
            0..=639 => Breakpoint::Compact,
            640..=1023 => Breakpoint::Medium,
            _ => Breakpoint::Expanded,
        }
    }
}

/// What the WebGL probe reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebGlInfo {
    pub tier: WebGlTier,
    pub max_texture_size: u32,
    /// Unmasked renderer string, when the debug extension is exposed.
    pub renderer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub class: NetworkClass,
    pub save_data: bool,
}

/// Immutable record of device traits. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityProfile {
    pub is_touch: bool,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub pixel_ratio: f64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub breakpoint: Breakpoint,
    pub is_low_end: bool,
    pub network: NetworkClass,
    pub save_data: bool,
    pub prefers_reduced_motion: bool,
    pub webgl: WebGlTier,
    pub max_texture_size: u32,
    pub gpu_tier: GpuTier,
}

impl CapabilityProfile {
    /// Profile used before detection finishes or when probes fail.
    pub fn conservative() -> Self {
        Self {
            is_touch: false,
            is_mobile: false,
            is_tablet: false,
            pixel_ratio: 1.0,
            screen_width: 800,
            screen_height: 600,
            breakpoint: Breakpoint::from_width(800),
            is_low_end: true,
            network: NetworkClass::Unknown,
            save_data: false,
            prefers_reduced_motion: false,
            webgl: WebGlTier::WebGl1,
            max_texture_size: 2048,
            gpu_tier: GpuTier::Low,
        }
    }
}

/// Host environment probes. One method per trait so each can fail alone.
pub trait ProbeSource {
    /// Monotonic milliseconds, used to enforce the detection budget.
    fn now_ms(&self) -> f64;
    fn max_touch_points(&self) -> Result<u32, ProbeError>;
    fn user_agent(&self) -> Result<String, ProbeError>;
    fn pixel_ratio(&self) -> Result<f64, ProbeError>;
    fn viewport(&self) -> Result<(u32, u32), ProbeError>;
    fn connection(&self) -> Result<ConnectionInfo, ProbeError>;
    fn prefers_reduced_motion(&self) -> Result<bool, ProbeError>;
    fn webgl(&self) -> Result<WebGlInfo, ProbeError>;
    fn hardware_concurrency(&self) -> Result<u32, ProbeError>;
    fn device_memory_gb(&self) -> Result<f64, ProbeError>;
}

/// Renderer substrings of GPUs that struggle with the full scene.
const LOW_END_GPUS: [&str; 7] = [
    "swiftshader",
    "llvmpipe",
    "mali-4",
    "mali-t",
    "adreno (tm) 3",
    "powervr sgx",
    "intel(r) hd graphics",
];

pub struct CapabilityClassifier {
    budget_ms: f64,
}

struct Budget<'a> {
    source: &'a dyn ProbeSource,
    started_ms: f64,
    budget_ms: f64,
}

impl Budget<'_> {
    fn run<T>(
        &self,
        name: &'static str,
        fallback: T,
        probe: impl FnOnce() -> Result<T, ProbeError>,
    ) -> T {
        let elapsed = self.source.now_ms() - self.started_ms;
        let result = if elapsed > self.budget_ms {
            Err(ProbeError::TimedOut(name))
        } else {
            probe()
        };
        match result {
            Ok(value) => value,
            Err(ProbeError::TimedOut(_)) => {
                log::debug!("Probe `{}` skipped after {:.1} ms, using fallback", name, elapsed);
                fallback
            }
            Err(err) => {
                log::warn!("{}; using conservative fallback", err);
                fallback
            }
        }
    }
}

impl CapabilityClassifier {
    pub fn new(budget_ms: f64) -> Self {
        Self { budget_ms }
    }

    /// Run every probe once and classify. Never fails.
    pub fn detect(&self, source: &dyn ProbeSource) -> CapabilityProfile {
        let base = CapabilityProfile::conservative();
        let budget = Budget {
            source,
            started_ms: source.now_ms(),
            budget_ms: self.budget_ms,
        };

        let touch_points = budget.run("touch", 0, || source.max_touch_points());
        let ua = budget.run("user_agent", String::new(), || source.user_agent());
        let pixel_ratio = budget.run("pixel_ratio", base.pixel_ratio, || {
            source.pixel_ratio().and_then(|r| {
                if r.is_finite() && r > 0.0 {
                    Ok(r)
                } else {
                    Err(ProbeError::Invalid {
                        probe: "pixel_ratio",
                        detail: r.to_string(),
                    })
                }
            })
        });
        let (screen_width, screen_height) = budget.run(
            "viewport",
            (base.screen_width, base.screen_height),
            || source.viewport(),
        );
        let connection = budget.run(
            "connection",
            ConnectionInfo {
                class: NetworkClass::Unknown,
                save_data: false,
            },
            || source.connection(),
        );
        let prefers_reduced_motion = budget.run("reduced_motion", false, || {
            source.prefers_reduced_motion()
        });
        let webgl = budget.run(
            "webgl",
            WebGlInfo {
                tier: base.webgl,
                max_texture_size: base.max_texture_size,
                renderer: None,
            },
            || source.webgl(),
        );
        let cores = budget.run("hardware_concurrency", 2, || source.hardware_concurrency());
        let memory_gb = budget.run("device_memory", 2.0, || source.device_memory_gb());

        let ua_lower = ua.to_ascii_lowercase();
        let is_touch = touch_points > 0;
        let is_tablet = ua_lower.contains("ipad")
            || (ua_lower.contains("android") && !ua_lower.contains("mobile"))
            || (ua_lower.contains("macintosh") && touch_points > 1);
        let is_mobile = !is_tablet && (ua_lower.contains("mobi") || ua_lower.contains("android"));

        let gpu_tier = classify_gpu(&webgl, is_mobile || is_tablet);
        let is_low_end = webgl.tier != WebGlTier::WebGl2
            || gpu_tier == GpuTier::Low
            || (is_mobile && cores <= 4)
            || memory_gb <= 2.0;

        let profile = CapabilityProfile {
            is_touch,
            is_mobile,
            is_tablet,
            pixel_ratio,
            screen_width,
            screen_height,
            breakpoint: Breakpoint::from_width(screen_width),
            is_low_end,
            network: connection.class,
            save_data: connection.save_data,
            prefers_reduced_motion,
            webgl: webgl.tier,
            max_texture_size: webgl.max_texture_size,
            gpu_tier,
        };
        log::info!(
            "Capabilities: gpu={:?} webgl={:?} low_end={} mobile={} dpr={:.2} {}x{}",
            profile.gpu_tier,
            profile.webgl,
            profile.is_low_end,
            profile.is_mobile,
            profile.pixel_ratio,
            profile.screen_width,
            profile.screen_height
        );
        profile
    }
}

fn classify_gpu(webgl: &WebGlInfo, handheld: bool) -> GpuTier {
    if webgl.tier == WebGlTier::None {
        return GpuTier::Low;
    }
    if let Some(renderer) = &webgl.renderer {
        let renderer = renderer.to_ascii_lowercase();
        if LOW_END_GPUS.iter().any(|marker| renderer.contains(marker)) {
            return GpuTier::Low;
        }
    }
    if webgl.tier == WebGlTier::WebGl1 || webgl.max_texture_size < 4096 {
        return GpuTier::Low;
    }
    if handheld {
        return GpuTier::Medium;
    }
    if webgl.tier == WebGlTier::WebGl2 && webgl.max_texture_size >= 16384 {
        GpuTier::High
    } else {
        GpuTier::Medium
    }
}

/// Collapses bursts of resize/orientation events into one re-detection.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet_ms: f64,
    pending: Option<(u32, u32)>,
    last_event_ms: f64,
}

impl ResizeDebouncer {
    pub fn new(quiet_ms: f64) -> Self {
        Self {
            quiet_ms,
            pending: None,
            last_event_ms: 0.0,
        }
    }

    pub fn record(&mut self, width: u32, height: u32, now_ms: f64) {
        self.pending = Some((width, height));
        self.last_event_ms = now_ms;
    }

    /// Returns the latest size once events have been quiet long enough.
    pub fn poll(&mut self, now_ms: f64) -> Option<(u32, u32)> {
        if self.pending.is_some() && now_ms - self.last_event_ms >= self.quiet_ms {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Scriptable probe source. Each probe advances the fake clock by
    /// `cost_ms`.
    pub(crate) struct FakeProbes {
        pub clock: Cell<f64>,
        pub cost_ms: f64,
        pub touch_points: Result<u32, ProbeError>,
        pub user_agent: Result<String, ProbeError>,
        pub pixel_ratio: Result<f64, ProbeError>,
        pub viewport: Result<(u32, u32), ProbeError>,
        pub connection: Result<ConnectionInfo, ProbeError>,
        pub reduced_motion: Result<bool, ProbeError>,
        pub webgl: Result<WebGlInfo, ProbeError>,
        pub cores: Result<u32, ProbeError>,
        pub memory_gb: Result<f64, ProbeError>,
    }

    impl FakeProbes {
        /// A fast desktop with a discrete GPU.
        pub(crate) fn desktop() -> Self {
            Self {
                clock: Cell::new(0.0),
                cost_ms: 0.0,
                touch_points: Ok(0),
                user_agent: Ok("Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0".into()),
                pixel_ratio: Ok(2.0),
                viewport: Ok((1920, 1080)),
                connection: Ok(ConnectionInfo {
                    class: NetworkClass::FourG,
                    save_data: false,
                }),
                reduced_motion: Ok(false),
                webgl: Ok(WebGlInfo {
                    tier: WebGlTier::WebGl2,
                    max_texture_size: 16384,
                    renderer: Some("ANGLE (NVIDIA GeForce RTX 3070)".into()),
                }),
                cores: Ok(16),
                memory_gb: Ok(8.0),
            }
        }

        fn tick<T: Clone>(&self, value: &Result<T, ProbeError>) -> Result<T, ProbeError> {
            self.clock.set(self.clock.get() + self.cost_ms);
            value.clone()
        }
    }

    impl ProbeSource for FakeProbes {
        fn now_ms(&self) -> f64 {
            self.clock.get()
        }
        fn max_touch_points(&self) -> Result<u32, ProbeError> {
            self.tick(&self.touch_points)
        }
        fn user_agent(&self) -> Result<String, ProbeError> {
            self.tick(&self.user_agent)
        }
        fn pixel_ratio(&self) -> Result<f64, ProbeError> {
            self.tick(&self.pixel_ratio)
        }
        fn viewport(&self) -> Result<(u32, u32), ProbeError> {
            self.tick(&self.viewport)
        }
        fn connection(&self) -> Result<ConnectionInfo, ProbeError> {
            self.tick(&self.connection)
        }
        fn prefers_reduced_motion(&self) -> Result<bool, ProbeError> {
            self.tick(&self.reduced_motion)
        }
        fn webgl(&self) -> Result<WebGlInfo, ProbeError> {
            self.tick(&self.webgl)
        }
        fn hardware_concurrency(&self) -> Result<u32, ProbeError> {
            self.tick(&self.cores)
        }
        fn device_memory_gb(&self) -> Result<f64, ProbeError> {
            self.tick(&self.memory_gb)
        }
    }

    #[test]
    fn desktop_is_high_tier() {
        let profile = CapabilityClassifier::new(50.0).detect(&FakeProbes::desktop());
        assert_eq!(profile.gpu_tier, GpuTier::High);
        assert!(!profile.is_low_end);
        assert!(!profile.is_touch);
        assert_eq!(profile.breakpoint, Breakpoint::Expanded);
    }

    #[test]
    fn phone_is_mobile_and_touch() {
        let mut probes = FakeProbes::desktop();
        probes.touch_points = Ok(5);
        probes.user_agent = Ok("Mozilla/5.0 (Linux; Android 14; Pixel 8) Mobile Safari".into());
        probes.viewport = Ok((412, 915));
        probes.cores = Ok(8);
        let profile = CapabilityClassifier::new(50.0).detect(&probes);
        assert!(profile.is_mobile);
        assert!(!profile.is_tablet);
        assert!(profile.is_touch);
        assert_eq!(profile.gpu_tier, GpuTier::Medium);
        assert_eq!(profile.breakpoint, Breakpoint::Compact);
    }

    #[test]
    fn ipad_desktop_ua_is_tablet() {
        let mut probes = FakeProbes::desktop();
        probes.touch_points = Ok(5);
        probes.user_agent = Ok("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari".into());
        let profile = CapabilityClassifier::new(50.0).detect(&probes);
        assert!(profile.is_tablet);
        assert!(!profile.is_mobile);
    }

    #[test]
    fn software_renderer_is_low_end() {
        let mut probes = FakeProbes::desktop();
        probes.webgl = Ok(WebGlInfo {
            tier: WebGlTier::WebGl2,
            max_texture_size: 8192,
            renderer: Some("Google SwiftShader".into()),
        });
        let profile = CapabilityClassifier::new(50.0).detect(&probes);
        assert_eq!(profile.gpu_tier, GpuTier::Low);
        assert!(profile.is_low_end);
    }

    #[test]
    fn failed_webgl_probe_falls_back_to_low_end() {
        let mut probes = FakeProbes::desktop();
        probes.webgl = Err(ProbeError::Unavailable("webgl"));
        let profile = CapabilityClassifier::new(50.0).detect(&probes);
        assert_eq!(profile.webgl, WebGlTier::WebGl1);
        assert_eq!(profile.gpu_tier, GpuTier::Low);
        assert!(profile.is_low_end);
    }

    #[test]
    fn slow_probes_past_budget_use_fallbacks() {
        let mut probes = FakeProbes::desktop();
        probes.cost_ms = 20.0;
        // budget covers the first three probes only
        let profile = CapabilityClassifier::new(50.0).detect(&probes);
        assert_eq!(profile.pixel_ratio, 2.0);
        assert_eq!((profile.screen_width, profile.screen_height), (800, 600));
        assert_eq!(profile.gpu_tier, GpuTier::Low);
        assert!(profile.is_low_end);
    }

    #[test]
    fn invalid_pixel_ratio_is_rejected() {
        let mut probes = FakeProbes::desktop();
        probes.pixel_ratio = Ok(f64::NAN);
        let profile = CapabilityClassifier::new(50.0).detect(&probes);
        assert_eq!(profile.pixel_ratio, 1.0);
    }

    #[test]
    fn network_classes() {
        assert_eq!(NetworkClass::from_effective_type("slow-2g"), NetworkClass::Slow2g);
        assert_eq!(NetworkClass::from_effective_type("4G"), NetworkClass::FourG);
        assert!(NetworkClass::ThreeG.is_metered());
        assert!(!NetworkClass::Unknown.is_metered());
    }

    #[test]
    fn debouncer_waits_for_quiet() {
        let mut d = ResizeDebouncer::new(250.0);
        d.record(800, 600, 0.0);
        d.record(900, 600, 100.0);
        assert_eq!(d.poll(200.0), None);
        assert_eq!(d.poll(350.0), Some((900, 600)));
        assert_eq!(d.poll(1000.0), None);
        assert!(!d.is_pending());
    }
}
