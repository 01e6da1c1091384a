//! Scripted cinematic tracks: an ordered keyframe schedule of
//! (instant, viewpoint) pairs played back in real time.
//!
//! While a track plays, the clock's instant comes from the track, not from
//! the user's speed. Playback only ever moves forward.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bodies::Body;
use crate::core::instant::Instant;
use crate::error::TrackError;
use crate::extensions::easing::{ease, ease_angle_deg, Easing};

/// Name of the built-in tour, generated relative to the current instant.
pub const GRAND_TOUR: &str = "grand-tour";

/// Real seconds spent travelling between two grand-tour stops.
const TOUR_HOLD_SECS: f64 = 4.0;
/// Simulated days that pass between two grand-tour stops.
const TOUR_DAYS_PER_STOP: f64 = 30.0;

/// Camera pose requested by a keyframe. Consumed by the camera rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    /// Body the camera looks at; `None` is the Sun-centred overview.
    #[serde(default)]
    pub focus: Option<Body>,
    /// Camera distance from the focus (AU).
    pub distance_au: f64,
    #[serde(default)]
    pub azimuth_deg: f64,
    #[serde(default)]
    pub elevation_deg: f64,
}

impl Viewpoint {
    pub fn overview() -> Self {
        Self {
            focus: None,
            distance_au: 40.0,
            azimuth_deg: 0.0,
            elevation_deg: 35.0,
        }
    }

    /// Blend towards `other`. Focus switches halfway through the transition.
    pub fn blend(&self, other: &Viewpoint, t: f64, easing: Easing) -> Viewpoint {
        Viewpoint {
            focus: if easing.apply(t) < 0.5 { self.focus } else { other.focus },
            distance_au: ease(self.distance_au, other.distance_au, t, easing),
            azimuth_deg: ease_angle_deg(self.azimuth_deg, other.azimuth_deg, t, easing),
            elevation_deg: ease(self.elevation_deg, other.elevation_deg, t, easing),
        }
    }
}

fn default_hold() -> f64 {
    TOUR_HOLD_SECS
}

/// One stop in a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub instant: Instant,
    pub viewpoint: Viewpoint,
    /// Real seconds to travel from this keyframe to the next one.
    #[serde(default = "default_hold")]
    pub hold_secs: f64,
    #[serde(default)]
    pub easing: Easing,
}

#[derive(Deserialize)]
struct TrackDef {
    name: String,
    keyframes: Vec<Keyframe>,
}

/// A validated, immutable keyframe schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct CinematicTrack {
    name: String,
    keyframes: Vec<Keyframe>,
}

impl CinematicTrack {
    pub fn new(name: impl Into<String>, keyframes: Vec<Keyframe>) -> Result<Self, TrackError> {
        let name = name.into();
        if keyframes.is_empty() {
            return Err(TrackError::Empty(name));
        }
        for (index, kf) in keyframes.iter().enumerate() {
            if !kf.hold_secs.is_finite() || kf.hold_secs < 0.0 {
                return Err(TrackError::InvalidHold { track: name, index });
            }
            if !kf.instant.is_finite() {
                return Err(TrackError::InvalidInstant { track: name, index });
            }
        }
        Ok(Self { name, keyframes })
    }

    /// Parse `{ "name": ..., "keyframes": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let def: TrackDef = serde_json::from_str(json).map_err(TrackError::Parse)?;
        Self::new(def.name, def.keyframes)
    }

    /// Visit `stops` in order starting at `from`, ending on the overview.
    pub fn grand_tour(from: Instant, stops: &[Body]) -> Self {
        let mut keyframes = Vec::with_capacity(stops.len() + 2);
        keyframes.push(Keyframe {
            instant: from,
            viewpoint: Viewpoint::overview(),
            hold_secs: TOUR_HOLD_SECS,
            easing: Easing::SineInOut,
        });
        for (i, body) in stops.iter().enumerate() {
            let info = body.info();
            keyframes.push(Keyframe {
                instant: from.add_days(TOUR_DAYS_PER_STOP * (i + 1) as f64),
                viewpoint: Viewpoint {
                    focus: Some(*body),
                    distance_au: (info.radius_earths * 0.02).max(0.05),
                    azimuth_deg: 45.0 * i as f64,
                    elevation_deg: 15.0,
                },
                hold_secs: TOUR_HOLD_SECS,
                easing: Easing::SineInOut,
            });
        }
        keyframes.push(Keyframe {
            instant: from.add_days(TOUR_DAYS_PER_STOP * (stops.len() + 1) as f64),
            viewpoint: Viewpoint::overview(),
            hold_secs: 0.0,
            easing: Easing::Linear,
        });
        Self {
            name: GRAND_TOUR.to_string(),
            keyframes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    fn last_index(&self) -> usize {
        self.keyframes.len() - 1
    }

    /// Real seconds from the first keyframe to the last.
    pub fn duration_secs(&self) -> f64 {
        self.keyframes[..self.last_index()]
            .iter()
            .map(|kf| kf.hold_secs)
            .sum()
    }
}

/// Position within a track. Ordered: later cursors compare greater.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
pub struct TrackCursor {
    /// Index of the keyframe the current transition starts from.
    pub segment: usize,
    /// Real seconds spent in the current transition.
    pub elapsed_secs: f64,
}

/// A track being played.
#[derive(Debug, Clone)]
pub struct TrackPlayback {
    track: Arc<CinematicTrack>,
    cursor: TrackCursor,
}

impl TrackPlayback {
    pub fn new(track: Arc<CinematicTrack>) -> Self {
        Self {
            track,
            cursor: TrackCursor::default(),
        }
    }

    pub fn track(&self) -> &Arc<CinematicTrack> {
        &self.track
    }

    pub fn cursor(&self) -> TrackCursor {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor.segment >= self.track.last_index()
    }

    /// Normalized progress [0, 1].
    pub fn progress(&self) -> f64 {
        let total = self.track.duration_secs();
        if total <= 0.0 || self.is_finished() {
            return 1.0;
        }
        let done: f64 = self.track.keyframes[..self.cursor.segment]
            .iter()
            .map(|kf| kf.hold_secs)
            .sum();
        ((done + self.cursor.elapsed_secs) / total).clamp(0.0, 1.0)
    }

    /// Move the cursor forward by `dt` real seconds. Returns true once the
    /// last keyframe has been reached.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.is_finished() {
            return true;
        }
        self.cursor.elapsed_secs += dt.max(0.0);
        let last = self.track.last_index();
        while self.cursor.segment < last {
            let hold = self.track.keyframes[self.cursor.segment].hold_secs;
            if self.cursor.elapsed_secs < hold {
                break;
            }
            self.cursor.elapsed_secs -= hold;
            self.cursor.segment += 1;
        }
        if self.cursor.segment >= last {
            self.cursor.elapsed_secs = 0.0;
        }
        self.is_finished()
    }

    /// Interpolated instant and viewpoint at the cursor.
    pub fn sample(&self) -> (Instant, Viewpoint) {
        let frames = &self.track.keyframes;
        if self.is_finished() {
            let last = &frames[self.track.last_index()];
            return (last.instant, last.viewpoint);
        }
        let from = &frames[self.cursor.segment];
        let to = &frames[self.cursor.segment + 1];
        let t = if from.hold_secs > 0.0 {
            self.cursor.elapsed_secs / from.hold_secs
        } else {
            1.0
        };
        let instant = from.instant.lerp(to.instant, from.easing.apply(t));
        (instant, from.viewpoint.blend(&to.viewpoint, t, from.easing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(days: f64, hold: f64) -> Keyframe {
        Keyframe {
            instant: Instant::from_days(days),
            viewpoint: Viewpoint::overview(),
            hold_secs: hold,
            easing: Easing::Linear,
        }
    }

    fn track(frames: Vec<Keyframe>) -> Arc<CinematicTrack> {
        Arc::new(CinematicTrack::new("test", frames).unwrap())
    }

    #[test]
    fn rejects_empty_and_negative_hold() {
        assert!(matches!(
            CinematicTrack::new("empty", vec![]),
            Err(TrackError::Empty(_))
        ));
        assert!(matches!(
            CinematicTrack::new("neg", vec![frame(0.0, -1.0), frame(1.0, 0.0)]),
            Err(TrackError::InvalidHold { index: 0, .. })
        ));
    }

    #[test]
    fn interpolates_between_keyframes() {
        let mut play = TrackPlayback::new(track(vec![frame(0.0, 2.0), frame(100.0, 0.0)]));
        play.advance(1.0);
        let (instant, _) = play.sample();
        assert!((instant.days() - 50.0).abs() < 1e-9);
        assert!((play.progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cursor_only_moves_forward() {
        let mut play = TrackPlayback::new(track(vec![
            frame(0.0, 1.0),
            frame(10.0, 0.5),
            frame(20.0, 1.5),
            frame(30.0, 0.0),
        ]));
        let mut prev = play.cursor();
        for _ in 0..40 {
            play.advance(0.1);
            let cur = play.cursor();
            assert!(cur >= prev, "{cur:?} < {prev:?}");
            prev = cur;
        }
        assert!(play.is_finished());
        assert_eq!(play.sample().0, Instant::from_days(30.0));
    }

    #[test]
    fn large_step_crosses_several_segments() {
        let mut play = TrackPlayback::new(track(vec![
            frame(0.0, 1.0),
            frame(10.0, 1.0),
            frame(20.0, 1.0),
            frame(30.0, 0.0),
        ]));
        assert!(!play.advance(2.5));
        assert_eq!(play.cursor().segment, 2);
        assert!(play.advance(1.0));
    }

    #[test]
    fn single_keyframe_finishes_immediately() {
        let play = TrackPlayback::new(track(vec![frame(5.0, 3.0)]));
        assert!(play.is_finished());
        assert_eq!(play.sample().0, Instant::from_days(5.0));
    }

    #[test]
    fn parses_json_track() {
        let json = r#"{
            "name": "mars-flyby",
            "keyframes": [
                { "instant": 8766.0, "viewpoint": { "focus": "Mars", "distance_au": 0.1 }, "hold_secs": 3.0 },
                { "instant": 8800.0, "viewpoint": { "distance_au": 40.0 }, "easing": "linear" }
            ]
        }"#;
        let track = CinematicTrack::from_json(json).unwrap();
        assert_eq!(track.name(), "mars-flyby");
        assert_eq!(track.keyframes()[0].viewpoint.focus, Some(Body::Mars));
        assert!((track.duration_secs() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn grand_tour_visits_every_stop() {
        let tour = CinematicTrack::grand_tour(Instant::J2000, &Body::PLANETS);
        let focused: Vec<Body> = tour
            .keyframes()
            .iter()
            .filter_map(|kf| kf.viewpoint.focus)
            .collect();
        assert_eq!(focused, Body::PLANETS.to_vec());
        assert_eq!(tour.name(), GRAND_TOUR);
    }
}
