//! Simulation clock: the only thing allowed to move the simulated instant.
//!
//! Advancement is frame-delta based (variable frame rate safe), with a cap on
//! simulated days per tick so a backgrounded tab doesn't produce a visible
//! jump when it resumes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::cinematic::{CinematicTrack, TrackCursor, TrackPlayback, Viewpoint};
use crate::core::instant::Instant;

/// Bounds applied on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockLimits {
    /// Largest simulated advance (either direction) in one tick, in days.
    pub max_days_per_tick: f64,
    /// Largest real-time step fed to a cinematic track, in seconds.
    pub max_cinematic_step_secs: f64,
}

impl Default for ClockLimits {
    fn default() -> Self {
        Self {
            max_days_per_tick: 30.0,
            max_cinematic_step_secs: 0.25,
        }
    }
}

/// Playback state machine.
#[derive(Debug, Clone)]
enum ClockState {
    Paused,
    Running { speed: f64 },
    Cinematic(TrackPlayback),
}

/// Published view of the playback state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Playback {
    Paused,
    Running,
    Cinematic {
        track: String,
        cursor: TrackCursor,
        progress: f64,
    },
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused: the instant did not move.
    Held,
    /// Free-running advance; `clamped` when the per-tick cap kicked in.
    Advanced { clamped: bool },
    /// A track drove the instant and is still playing.
    Cinematic,
    /// The track reached its last keyframe; free-running state restored.
    TrackFinished,
}

pub struct SimulationClock {
    instant: Instant,
    state: ClockState,
    /// Last non-zero speed, used when resuming from pause.
    resume_speed: f64,
    /// Speed active when the current track started (0 = was paused).
    pre_cinematic_speed: f64,
    viewpoint: Option<Viewpoint>,
    limits: ClockLimits,
}

impl SimulationClock {
    pub fn new(start: Instant, speed: f64, limits: ClockLimits) -> Self {
        let speed = if speed.is_finite() { speed } else { 0.0 };
        let state = if speed == 0.0 {
            ClockState::Paused
        } else {
            ClockState::Running { speed }
        };
        Self {
            instant: if start.is_finite() { start.clamp_to_calendar() } else { Instant::J2000 },
            state,
            resume_speed: if speed == 0.0 { 1.0 } else { speed },
            pre_cinematic_speed: 0.0,
            viewpoint: None,
            limits,
        }
    }

    pub fn instant(&self) -> Instant {
        self.instant
    }

    /// Signed days per real second; 0 when paused. While a track plays this
    /// is the speed that will be restored when it ends.
    pub fn speed(&self) -> f64 {
        match &self.state {
            ClockState::Paused => 0.0,
            ClockState::Running { speed } => *speed,
            ClockState::Cinematic(_) => self.pre_cinematic_speed,
        }
    }

    pub fn is_cinematic(&self) -> bool {
        matches!(self.state, ClockState::Cinematic(_))
    }

    /// Camera pose requested by the active track.
    pub fn viewpoint(&self) -> Option<Viewpoint> {
        self.viewpoint
    }

    pub fn limits(&self) -> ClockLimits {
        self.limits
    }

    pub fn playback(&self) -> Playback {
        match &self.state {
            ClockState::Paused => Playback::Paused,
            ClockState::Running { .. } => Playback::Running,
            ClockState::Cinematic(play) => Playback::Cinematic {
                track: play.track().name().to_string(),
                cursor: play.cursor(),
                progress: play.progress(),
            },
        }
    }

    /// Set the signed speed. 0 pauses. Cancels an active track.
    pub fn set_speed(&mut self, days_per_sec: f64) {
        if !days_per_sec.is_finite() {
            log::warn!("Ignoring non-finite speed {}", days_per_sec);
            return;
        }
        if self.is_cinematic() {
            log::debug!("Speed change cancels cinematic playback");
            self.viewpoint = None;
        }
        self.apply_speed(days_per_sec);
    }

    /// Space bar: Running <-> Paused. During a track, cancels it and pauses.
    pub fn toggle_pause(&mut self) {
        match self.state {
            ClockState::Paused => {
                self.state = ClockState::Running {
                    speed: self.resume_speed,
                };
            }
            ClockState::Running { .. } => self.state = ClockState::Paused,
            ClockState::Cinematic(_) => {
                if self.pre_cinematic_speed != 0.0 {
                    self.resume_speed = self.pre_cinematic_speed;
                }
                self.viewpoint = None;
                self.state = ClockState::Paused;
            }
        }
    }

    /// Jump to an absolute instant. Cancels an active track. Instants past
    /// the calendar range are pulled to its nearest end.
    pub fn set_instant(&mut self, instant: Instant) {
        if !instant.is_finite() {
            log::warn!("Ignoring non-finite instant");
            return;
        }
        if !instant.is_in_calendar_range() {
            log::warn!("Instant {:.1} days from J2000 is out of range; clamping", instant.days());
        }
        self.stop_cinematic();
        self.instant = instant.clamp_to_calendar();
    }

    /// Enter cinematic mode. The instant snaps to the first keyframe.
    pub fn start_cinematic(&mut self, track: Arc<CinematicTrack>) {
        if !self.is_cinematic() {
            self.pre_cinematic_speed = self.speed();
        }
        let play = TrackPlayback::new(track);
        let (instant, viewpoint) = play.sample();
        log::info!("Cinematic '{}' started", play.track().name());
        self.instant = instant.clamp_to_calendar();
        self.viewpoint = Some(viewpoint);
        self.state = ClockState::Cinematic(play);
    }

    /// Leave cinematic mode, restoring the speed active before it started.
    /// Returns false when no track was playing.
    pub fn stop_cinematic(&mut self) -> bool {
        if !self.is_cinematic() {
            return false;
        }
        self.viewpoint = None;
        self.apply_speed(self.pre_cinematic_speed);
        true
    }

    /// Advance by one frame of `real_dt` seconds.
    pub fn tick(&mut self, real_dt: f64) -> TickOutcome {
        let dt = if real_dt.is_finite() && real_dt > 0.0 { real_dt } else { 0.0 };

        match &mut self.state {
            ClockState::Paused => TickOutcome::Held,
            ClockState::Running { speed } => {
                let max = self.limits.max_days_per_tick;
                let days = dt * *speed;
                let clamped = days.abs() > max;
                self.instant = self
                    .instant
                    .add_days(days.clamp(-max, max))
                    .clamp_to_calendar();
                TickOutcome::Advanced { clamped }
            }
            ClockState::Cinematic(play) => {
                let finished = play.advance(dt.min(self.limits.max_cinematic_step_secs));
                let (instant, viewpoint) = play.sample();
                self.instant = instant.clamp_to_calendar();
                if finished {
                    log::info!("Cinematic '{}' finished", play.track().name());
                    self.viewpoint = None;
                    self.apply_speed(self.pre_cinematic_speed);
                    TickOutcome::TrackFinished
                } else {
                    self.viewpoint = Some(viewpoint);
                    TickOutcome::Cinematic
                }
            }
        }
    }

    fn apply_speed(&mut self, speed: f64) {
        if speed == 0.0 {
            self.state = ClockState::Paused;
        } else {
            self.resume_speed = speed;
            self.state = ClockState::Running { speed };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cinematic::Keyframe;
    use crate::extensions::easing::Easing;

    fn clock(speed: f64) -> SimulationClock {
        SimulationClock::new(Instant::J2000, speed, ClockLimits::default())
    }

    fn two_stop_track() -> Arc<CinematicTrack> {
        let kf = |days: f64, hold: f64| Keyframe {
            instant: Instant::from_days(days),
            viewpoint: Viewpoint::overview(),
            hold_secs: hold,
            easing: Easing::Linear,
        };
        Arc::new(CinematicTrack::new("t", vec![kf(500.0, 1.0), kf(600.0, 0.0)]).unwrap())
    }

    #[test]
    fn two_seconds_at_one_day_per_second() {
        let mut c = clock(1.0);
        assert_eq!(c.tick(2.0), TickOutcome::Advanced { clamped: false });
        assert_eq!(c.instant(), Instant::from_days(2.0));
    }

    #[test]
    fn pause_holds_instant() {
        let mut c = clock(5.0);
        c.set_speed(0.0);
        for _ in 0..100 {
            assert_eq!(c.tick(0.016), TickOutcome::Held);
        }
        assert_eq!(c.instant(), Instant::J2000);
        assert_eq!(c.playback(), Playback::Paused);
    }

    #[test]
    fn negative_speed_rewinds() {
        let mut c = clock(-10.0);
        c.tick(0.5);
        assert_eq!(c.instant(), Instant::from_days(-5.0));
    }

    #[test]
    fn large_delta_is_clamped() {
        let mut c = clock(10.0);
        assert_eq!(c.tick(60.0), TickOutcome::Advanced { clamped: true });
        assert_eq!(c.instant(), Instant::from_days(30.0));
        c.set_speed(-10.0);
        c.tick(60.0);
        assert_eq!(c.instant(), Instant::J2000);
    }

    #[test]
    fn far_instants_are_clamped_to_calendar_range() {
        let mut c = clock(1.0);
        c.set_instant(Instant::from_days(1e300));
        assert_eq!(c.instant(), Instant::MAX);
        c.tick(1.0);
        assert_eq!(c.instant(), Instant::MAX);
        c.set_instant(Instant::from_days(-1e300));
        assert_eq!(c.instant(), Instant::MIN);
        c.set_instant(Instant::from_days(f64::INFINITY));
        assert_eq!(c.instant(), Instant::MIN);
    }

    #[test]
    fn garbage_delta_is_ignored() {
        let mut c = clock(1.0);
        c.tick(f64::NAN);
        c.tick(-3.0);
        assert_eq!(c.instant(), Instant::J2000);
    }

    #[test]
    fn toggle_pause_resumes_previous_speed() {
        let mut c = clock(7.0);
        c.toggle_pause();
        assert_eq!(c.speed(), 0.0);
        c.toggle_pause();
        assert_eq!(c.speed(), 7.0);
    }

    #[test]
    fn cinematic_ignores_user_speed_and_restores_it() {
        let mut c = clock(3.0);
        c.start_cinematic(two_stop_track());
        assert_eq!(c.instant(), Instant::from_days(500.0));
        c.tick(0.2);
        c.tick(0.2);
        assert!((c.instant().days() - 540.0).abs() < 1e-9);
        assert!(c.stop_cinematic());
        assert_eq!(c.speed(), 3.0);
        assert_eq!(c.playback(), Playback::Running);
        assert!(c.viewpoint().is_none());
    }

    #[test]
    fn cinematic_from_pause_restores_pause() {
        let mut c = clock(0.0);
        c.start_cinematic(two_stop_track());
        for _ in 0..10 {
            c.tick(0.25);
        }
        assert_eq!(c.playback(), Playback::Paused);
        assert_eq!(c.instant(), Instant::from_days(600.0));
    }

    #[test]
    fn track_end_reports_finish_once() {
        let mut c = clock(2.0);
        c.start_cinematic(two_stop_track());
        let outcomes: Vec<TickOutcome> = (0..6).map(|_| c.tick(0.25)).collect();
        assert_eq!(outcomes.iter().filter(|o| **o == TickOutcome::TrackFinished).count(), 1);
        assert_eq!(c.speed(), 2.0);
        assert!(!c.is_cinematic());
    }

    #[test]
    fn cinematic_step_is_clamped() {
        let mut c = clock(1.0);
        c.start_cinematic(two_stop_track());
        // 10 s of background time only advances the track by 0.25 s
        assert_eq!(c.tick(10.0), TickOutcome::Cinematic);
        assert!((c.instant().days() - 525.0).abs() < 1e-9);
    }

    #[test]
    fn restarting_a_track_keeps_original_speed() {
        let mut c = clock(4.0);
        c.start_cinematic(two_stop_track());
        c.start_cinematic(two_stop_track());
        c.stop_cinematic();
        assert_eq!(c.speed(), 4.0);
    }

    #[test]
    fn speed_change_cancels_track() {
        let mut c = clock(1.0);
        c.start_cinematic(two_stop_track());
        c.set_speed(9.0);
        assert!(!c.is_cinematic());
        assert_eq!(c.speed(), 9.0);
    }

    #[test]
    fn space_during_track_pauses_with_prior_speed() {
        let mut c = clock(6.0);
        c.start_cinematic(two_stop_track());
        c.toggle_pause();
        assert_eq!(c.playback(), Playback::Paused);
        c.toggle_pause();
        assert_eq!(c.speed(), 6.0);
    }
}
