use std::sync::Arc;

use crate::bridge::{PositionBuffer, ProtocolLayout};
use crate::config::{DeepLink, EngineConfig};
use crate::core::cinematic::CinematicTrack;
use crate::core::instant::Instant;
use crate::core::time::TickOutcome;
use crate::device::{CapabilityProfile, DeviceContext, ProbeSource, QualitySettings};
use crate::ephemeris::EphemerisOracle;
use crate::error::{ConfigError, TrackError};
use crate::input::{Command, InputEvent, InputQueue};
use crate::store::{OrbitSnapshot, OrbitStore, StoreOptions};

/// Everything the host frame callback drives.
///
/// Per tick: drain input, feed the performance monitor, settle pending
/// resizes, advance the store, then refresh the renderer buffer.
pub struct OrbitEngine {
    store: OrbitStore,
    device: DeviceContext,
    input: InputQueue,
    buffer: PositionBuffer,
    probes: Box<dyn ProbeSource>,
}

impl OrbitEngine {
    /// Detect capabilities, then build the store with `link` applied so the
    /// very first snapshot already reflects the URL.
    pub fn new(
        config: EngineConfig,
        oracle: Box<dyn EphemerisOracle>,
        probes: Box<dyn ProbeSource>,
        link: DeepLink,
        now: Instant,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracks = config.build_tracks()?;

        let mut device = DeviceContext::new(&config.device);
        device.detect(probes.as_ref());
        let settings = device.settings();

        let mut store = OrbitStore::new(
            oracle,
            StoreOptions {
                start: link.date.unwrap_or_else(|| config.start_instant(now)),
                speed: config.speed,
                limits: config.clock,
                include_dwarf_planets: config.include_dwarf_planets,
                selected: link.planet,
                orbits_visible: config.orbits_visible,
                labels_visible: config.labels_visible,
                orbit_samples: settings.orbit_samples as usize,
                orbit_refresh_ticks: settings.orbit_refresh_ticks,
            },
        );
        for track in tracks {
            store.add_track(track);
        }

        let mut buffer = PositionBuffer::new(ProtocolLayout::for_quality(&settings));
        buffer.write_snapshot(&store.snapshot(), &settings);
        log::info!(
            "Engine ready at {} ({:?} quality, {} tracks)",
            store.snapshot().date,
            settings.tier,
            store.track_names().len()
        );

        Ok(Self {
            store,
            device,
            input: InputQueue::new(),
            buffer,
            probes,
        })
    }

    /// Run one frame. `dt_secs` is real time since the previous frame and
    /// `frame_ms` the measured cost of that frame.
    pub fn tick(&mut self, dt_secs: f64, frame_ms: f64) -> TickOutcome {
        let now_ms = self.probes.now_ms();
        let mut settings_changed = false;
        for event in self.input.drain() {
            settings_changed |= self.handle_event(event, now_ms);
        }

        settings_changed |= self.device.record_frame(frame_ms);
        settings_changed |= self.device.poll_resize(self.probes.as_ref(), now_ms);
        if settings_changed {
            self.on_settings_changed();
        }

        let outcome = self.store.advance_time(dt_secs);
        let settings = self.device.settings();
        self.buffer.write_snapshot(&self.store.snapshot(), &settings);
        outcome
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn apply_command(&mut self, command: Command) {
        log::debug!("Command {:?}", command);
        match command {
            Command::ToggleOrbits => self.store.toggle_orbits_visible(),
            Command::ToggleLabels => self.store.toggle_labels_visible(),
            Command::ToggleCinematic => self.store.toggle_cinematic(),
            Command::TogglePause => self.store.toggle_pause(),
            Command::Select(selection) => {
                self.store.select_planet(selection);
            }
            Command::SetSpeed(speed) => self.store.set_speed(speed),
            Command::SetInstant(instant) => self.store.set_instant(instant),
        }
    }

    /// Latest JS heap reading, fed to the performance monitor.
    pub fn record_memory(&mut self, used_bytes: f64, limit_bytes: f64) {
        self.device.record_memory(used_bytes, limit_bytes);
    }

    /// Parse and register a track. Returns its name.
    pub fn load_track_json(&mut self, json: &str) -> Result<String, TrackError> {
        let track = CinematicTrack::from_json(json)?;
        let name = track.name().to_string();
        self.store.add_track(track);
        Ok(name)
    }

    pub fn snapshot(&self) -> Arc<OrbitSnapshot> {
        self.store.snapshot()
    }

    pub fn quality(&self) -> Arc<QualitySettings> {
        self.device.settings()
    }

    pub fn profile(&self) -> Arc<CapabilityProfile> {
        self.device.profile()
    }

    pub fn store(&self) -> &OrbitStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OrbitStore {
        &mut self.store
    }

    pub fn positions(&self) -> &PositionBuffer {
        &self.buffer
    }

    /// Returns true when the event changed the quality settings.
    fn handle_event(&mut self, event: InputEvent, now_ms: f64) -> bool {
        match event {
            InputEvent::KeyDown { key_code } => {
                if let Some(command) = Command::from_key(key_code) {
                    self.apply_command(command);
                }
            }
            InputEvent::Resize { width, height } => self.device.on_resize(width, height, now_ms),
            InputEvent::ConnectionChange => {
                return self.device.on_connection_change(self.probes.as_ref());
            }
            InputEvent::Custom { kind, a, .. } => {
                if let Some(command) = Command::from_custom(kind, a) {
                    self.apply_command(command);
                }
            }
        }
        false
    }

    fn on_settings_changed(&mut self) {
        let settings = self.device.settings();
        self.store.apply_quality(&settings);
        self.buffer.ensure_layout(ProtocolLayout::for_quality(&settings));
        self.buffer.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Body;
    use crate::core::time::Playback;
    use crate::device::capability::tests::FakeProbes;
    use crate::device::{PerfConfig, QualityTier};
    use crate::ephemeris::{FnOracle, ReferenceFrame};
    use crate::error::OracleError;
    use crate::input::{
        CUSTOM_SELECT_BODY, CUSTOM_SET_INSTANT, CUSTOM_SET_SPEED, KEY_O, KEY_RIGHT, KEY_SPACE,
    };
    use glam::DVec3;

    fn oracle() -> Box<dyn EphemerisOracle> {
        Box::new(FnOracle(
            |body: Body, instant: Instant, _frame: ReferenceFrame| -> Result<DVec3, OracleError> {
                let info = body.info();
                if info.orbital_period_days == 0.0 {
                    return Ok(DVec3::ZERO);
                }
                let angle = std::f64::consts::TAU * instant.days() / info.orbital_period_days;
                let r = info.semi_major_axis_au;
                Ok(DVec3::new(r * angle.cos(), r * angle.sin(), 0.0))
            },
        ))
    }

    fn engine(config: EngineConfig, query: &str) -> OrbitEngine {
        OrbitEngine::new(
            config,
            oracle(),
            Box::new(FakeProbes::desktop()),
            DeepLink::parse(query),
            Instant::from_calendar(2024, 6, 1, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn deep_link_applies_to_first_snapshot() {
        let e = engine(EngineConfig::default(), "?planet=Earth&date=2000-01-01");
        let snap = e.snapshot();
        assert_eq!(snap.selected, Some(Body::Earth));
        assert_eq!(snap.date, "2000-01-01");
        assert_eq!(e.positions().body_count() as usize, snap.planets.len());
    }

    #[test]
    fn starts_at_now_without_link() {
        let e = engine(EngineConfig::default(), "");
        assert_eq!(e.snapshot().date, "2024-06-01");
        assert_eq!(e.quality().tier, QualityTier::High);
    }

    #[test]
    fn keyboard_drives_store() {
        let mut e = engine(EngineConfig::default(), "");
        e.push_input(InputEvent::KeyDown { key_code: KEY_SPACE });
        e.push_input(InputEvent::KeyDown { key_code: KEY_O });
        e.push_input(InputEvent::KeyDown { key_code: KEY_RIGHT });
        e.tick(0.016, 16.0);
        let snap = e.snapshot();
        assert_eq!(snap.playback, Playback::Paused);
        assert!(!snap.orbits_visible);
        assert_eq!(snap.selected, Some(Body::Mercury));
    }

    #[test]
    fn custom_events_drive_store() {
        let mut e = engine(EngineConfig::default(), "");
        e.push_input(InputEvent::Custom { kind: CUSTOM_SET_SPEED, a: 10.0, b: 0.0, c: 0.0 });
        e.push_input(InputEvent::Custom { kind: CUSTOM_SELECT_BODY, a: 5.0, b: 0.0, c: 0.0 });
        let before = e.snapshot().instant;
        e.tick(1.0, 16.0);
        let snap = e.snapshot();
        assert_eq!(snap.speed, 10.0);
        assert_eq!(snap.selected, Some(Body::Jupiter));
        assert_eq!(snap.instant, before.add_days(10.0));
    }

    #[test]
    fn out_of_range_instant_event_still_publishes_a_date() {
        let mut e = engine(EngineConfig::default(), "");
        e.push_input(InputEvent::Custom { kind: CUSTOM_SET_INSTANT, a: 1e300, b: 0.0, c: 0.0 });
        e.tick(0.016, 16.0);
        let snap = e.snapshot();
        assert_eq!(snap.instant, Instant::MAX);
        assert!(snap.date.starts_with("9939-"), "date = {}", snap.date);
        assert!(!snap.status_sentence().is_empty());
    }

    #[test]
    fn sustained_slow_frames_lower_quality() {
        let config = EngineConfig {
            device: crate::device::DeviceConfig {
                performance: PerfConfig {
                    sustained_frames: 3,
                    ..PerfConfig::default()
                },
                ..Default::default()
            },
            ..EngineConfig::default()
        };
        let mut e = engine(config, "");
        for _ in 0..3 {
            e.tick(0.1, 100.0);
        }
        assert_eq!(e.quality().tier, QualityTier::Medium);
        let paths = e.snapshot().orbit_paths.clone();
        assert!(paths.iter().all(|p| p.points.len() == 128));
    }

    #[test]
    fn loads_tracks_at_runtime() {
        let mut e = engine(EngineConfig::default(), "");
        let name = e
            .load_track_json(r#"{ "name": "flyby", "keyframes": [ { "instant": 0.0, "viewpoint": { "distance_au": 1.0 } } ] }"#)
            .unwrap();
        assert_eq!(name, "flyby");
        assert!(e.store_mut().start_cinematic("flyby"));
        assert!(e.load_track_json("not json").is_err());
    }

    #[test]
    fn bad_config_track_is_rejected() {
        let config = EngineConfig::from_json(
            r#"{ "tracks": [ { "name": "x", "keyframes": [] } ] }"#,
        )
        .unwrap();
        let result = OrbitEngine::new(
            config,
            oracle(),
            Box::new(FakeProbes::desktop()),
            DeepLink::default(),
            Instant::J2000,
        );
        assert!(matches!(result, Err(ConfigError::Track(_))));
    }
}
