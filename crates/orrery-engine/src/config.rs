//! Engine configuration and URL deep links.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! yields a working engine.

use serde::{Deserialize, Serialize};

use crate::bodies::Body;
use crate::core::cinematic::{CinematicTrack, Keyframe};
use crate::core::instant::Instant;
use crate::core::time::ClockLimits;
use crate::device::DeviceConfig;
use crate::error::{ConfigError, TrackError};

/// A track as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial instant in days from J2000. `None` starts at the host's
    /// current date.
    pub start_days: Option<f64>,
    /// Initial signed speed in days per real second.
    pub speed: f64,
    pub clock: ClockLimits,
    pub include_dwarf_planets: bool,
    pub orbits_visible: bool,
    pub labels_visible: bool,
    /// Capability detection, resize debounce and performance thresholds.
    pub device: DeviceConfig,
    /// Extra cinematic tracks added to the library.
    pub tracks: Vec<TrackConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_days: None,
            speed: 1.0,
            clock: ClockLimits::default(),
            include_dwarf_planets: false,
            orbits_visible: true,
            labels_visible: true,
            device: DeviceConfig::default(),
            tracks: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() {
            return Err(ConfigError::Invalid(format!("speed {} is not finite", self.speed)));
        }
        if let Some(days) = self.start_days {
            if !days.is_finite() {
                return Err(ConfigError::Invalid("start_days is not finite".into()));
            }
        }
        if !positive(self.clock.max_days_per_tick) {
            return Err(ConfigError::Invalid("clock.max_days_per_tick must be positive".into()));
        }
        if !positive(self.clock.max_cinematic_step_secs) {
            return Err(ConfigError::Invalid(
                "clock.max_cinematic_step_secs must be positive".into(),
            ));
        }
        let perf = &self.device.performance;
        if perf.window_frames == 0 || perf.sustained_frames == 0 {
            return Err(ConfigError::Invalid("performance window must be non-empty".into()));
        }
        if !positive(perf.frame_budget_ms) {
            return Err(ConfigError::Invalid("frame_budget_ms must be positive".into()));
        }
        Ok(())
    }

    /// Validate and build the configured tracks.
    pub fn build_tracks(&self) -> Result<Vec<CinematicTrack>, TrackError> {
        self.tracks
            .iter()
            .map(|t| CinematicTrack::new(t.name.clone(), t.keyframes.clone()))
            .collect()
    }

    /// Start instant, falling back to `now` when the config leaves it open.
    pub fn start_instant(&self, now: Instant) -> Instant {
        self.start_days.map(Instant::from_days).unwrap_or(now)
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// State carried in the page URL: `?planet=Mars&date=2024-03-15`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeepLink {
    pub planet: Option<Body>,
    pub date: Option<Instant>,
}

impl DeepLink {
    /// Parse a query string, with or without the leading `?`. Unknown keys
    /// and unparseable values are ignored.
    pub fn parse(query: &str) -> Self {
        let mut link = DeepLink::default();
        let query = query.trim().trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value);
            match key {
                "planet" => match Body::from_name(&value) {
                    Some(body) => link.planet = Some(body),
                    None => log::debug!("Deep link names unknown body '{}'", value),
                },
                "date" => match Instant::parse_date(&value) {
                    Some(date) => link.date = Some(date),
                    None => log::debug!("Deep link date '{}' is not YYYY-MM-DD", value),
                },
                _ => {}
            }
        }
        link
    }
}

/// Minimal `application/x-www-form-urlencoded` value decoding.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.speed, 1.0);
        assert_eq!(config.clock.max_days_per_tick, 30.0);
        assert_eq!(config.device.probe_budget_ms, 50.0);
        assert_eq!(config.device.resize_debounce_ms, 250.0);
        assert_eq!(config.device.performance.sustained_frames, 90);
        assert!(!config.include_dwarf_planets);
    }

    #[test]
    fn partial_nested_override() {
        let config = EngineConfig::from_json(
            r#"{ "speed": -2.0, "device": { "performance": { "frame_budget_ms": 20.0 } } }"#,
        )
        .unwrap();
        assert_eq!(config.speed, -2.0);
        assert_eq!(config.device.performance.frame_budget_ms, 20.0);
        assert_eq!(config.device.performance.window_frames, 60);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(EngineConfig::from_json("{ speed"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_values_rejected() {
        let err = EngineConfig::from_json(r#"{ "clock": { "max_days_per_tick": 0.0 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn tracks_are_validated() {
        let config = EngineConfig::from_json(
            r#"{ "tracks": [ { "name": "empty", "keyframes": [] } ] }"#,
        )
        .unwrap();
        assert!(matches!(config.build_tracks(), Err(TrackError::Empty(_))));
    }

    #[test]
    fn start_instant_defaults_to_now() {
        let now = Instant::from_days(9000.0);
        assert_eq!(EngineConfig::default().start_instant(now), now);
        let fixed = EngineConfig {
            start_days: Some(0.0),
            ..EngineConfig::default()
        };
        assert_eq!(fixed.start_instant(now), Instant::J2000);
    }

    #[test]
    fn deep_link_planet_is_case_insensitive() {
        let link = DeepLink::parse("?planet=earth");
        assert_eq!(link.planet, Some(Body::Earth));
        assert_eq!(link.date, None);
    }

    #[test]
    fn deep_link_date_and_junk() {
        let link = DeepLink::parse("date=2024-03-15&planet=Vulcan&utm_source=x");
        assert_eq!(link.date, Some(Instant::from_calendar(2024, 3, 15, 0, 0).unwrap()));
        assert_eq!(link.planet, None);

        let bad = DeepLink::parse("date=2024-02-30");
        assert_eq!(bad.date, None);
    }

    #[test]
    fn deep_link_dates_before_1582_round_trip() {
        for date in ["1000-01-01", "-0500-03-01"] {
            let link = DeepLink::parse(&format!("date={date}"));
            assert_eq!(link.date.map(|d| d.to_string()).as_deref(), Some(date));
        }
    }

    #[test]
    fn deep_link_decodes_values() {
        assert_eq!(DeepLink::parse("planet=%20Mars+").planet, Some(Body::Mars));
    }
}
