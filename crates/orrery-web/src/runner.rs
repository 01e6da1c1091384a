use orrery_engine::{
    ConfigError, DeepLink, EngineConfig, InputEvent, Instant, OrbitEngine, TickOutcome,
    TrackError,
};

use crate::kepler::KeplerOracle;
use crate::probe::WebProbeSource;

/// Owns the engine for the lifetime of the page.
///
/// wasm-bindgen cannot export the engine directly, so `lib.rs` keeps one of
/// these in a `thread_local!` and exports free functions over it.
pub struct EngineRunner {
    engine: OrbitEngine,
    /// Cached JSON, rebuilt only when the snapshot revision changes.
    snapshot_json: String,
    snapshot_revision: u64,
    /// Samples `performance.memory` where the browser exposes it.
    memory_probe: WebProbeSource,
}

impl EngineRunner {
    /// Build from host-supplied config JSON (may be empty) and the page's
    /// query string. A bad config is logged and replaced by defaults.
    pub fn new(config_json: &str, query: &str) -> Result<Self, ConfigError> {
        let link = DeepLink::parse(query);
        let now = Instant::from_unix_millis(js_sys::Date::now()).unwrap_or_else(|| {
            log::warn!("Host clock unreadable; starting at J2000");
            Instant::J2000
        });

        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(config_json).unwrap_or_else(|err| {
                log::warn!("{}; falling back to default config", err);
                EngineConfig::default()
            })
        };

        let engine = match Self::build(config, link, now) {
            Ok(engine) => engine,
            Err(err) => {
                log::warn!("{}; retrying with default config", err);
                Self::build(EngineConfig::default(), link, now)?
            }
        };

        Ok(Self {
            engine,
            snapshot_json: String::new(),
            snapshot_revision: 0,
            memory_probe: WebProbeSource::new(),
        })
    }

    fn build(config: EngineConfig, link: DeepLink, now: Instant) -> Result<OrbitEngine, ConfigError> {
        OrbitEngine::new(
            config,
            Box::new(KeplerOracle::new()),
            Box::new(WebProbeSource::new()),
            link,
            now,
        )
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.engine.push_input(event);
    }

    /// Run one frame. Returns the outcome as a small code for JS:
    /// 0 held, 1 advanced, 2 cinematic, 3 track finished.
    pub fn tick(&mut self, dt_secs: f64, frame_ms: f64) -> u32 {
        if let Some((used, limit)) = self.memory_probe.heap_usage() {
            self.engine.record_memory(used, limit);
        }
        match self.engine.tick(dt_secs, frame_ms) {
            TickOutcome::Held => 0,
            TickOutcome::Advanced { .. } => 1,
            TickOutcome::Cinematic => 2,
            TickOutcome::TrackFinished => 3,
        }
    }

    pub fn record_memory(&mut self, used_bytes: f64, limit_bytes: f64) {
        self.engine.record_memory(used_bytes, limit_bytes);
    }

    pub fn load_track(&mut self, json: &str) -> Result<String, TrackError> {
        self.engine.load_track_json(json)
    }

    pub fn snapshot_json(&mut self) -> String {
        let snapshot = self.engine.snapshot();
        if snapshot.revision != self.snapshot_revision {
            match snapshot.to_json() {
                Ok(json) => {
                    self.snapshot_json = json;
                    self.snapshot_revision = snapshot.revision;
                }
                Err(err) => log::warn!("Snapshot serialization failed: {}", err),
            }
        }
        self.snapshot_json.clone()
    }

    pub fn quality_json(&self) -> String {
        serde_json::to_string(&*self.engine.quality()).unwrap_or_else(|err| {
            log::warn!("Quality serialization failed: {}", err);
            String::from("{}")
        })
    }

    pub fn profile_json(&self) -> String {
        serde_json::to_string(&*self.engine.profile()).unwrap_or_else(|err| {
            log::warn!("Profile serialization failed: {}", err);
            String::from("{}")
        })
    }

    pub fn status_sentence(&self) -> String {
        self.engine.snapshot().status_sentence()
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    pub fn positions_ptr(&self) -> *const f32 {
        self.engine.positions().as_ptr()
    }

    pub fn position_count(&self) -> u32 {
        self.engine.positions().body_count()
    }

    pub fn buffer_len_floats(&self) -> u32 {
        self.engine.positions().len_floats() as u32
    }
}
