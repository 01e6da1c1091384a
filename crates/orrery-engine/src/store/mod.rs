//! Orbit state store: the single writer of the published snapshot.
//!
//! Owns the clock, the resolver and the orbit path sampler. Every mutator
//! finishes by building a complete `OrbitSnapshot` and swapping it in, so
//! readers holding the previous `Arc` keep a consistent view.

pub mod selection;
pub mod snapshot;
pub mod status;

use std::collections::HashMap;
use std::sync::Arc;

use crate::bodies::{navigation_order, visible_bodies, Body};
use crate::core::cinematic::{CinematicTrack, GRAND_TOUR};
use crate::core::instant::Instant;
use crate::core::time::{ClockLimits, SimulationClock, TickOutcome};
use crate::device::QualitySettings;
use crate::ephemeris::{EphemerisOracle, EphemerisResolver, OrbitPathSampler};

pub use selection::Selection;
pub use snapshot::{OrbitSnapshot, PlanetViewModel};

pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&Arc<OrbitSnapshot>)>;

/// Initial store state. Deep-link values land here.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub start: Instant,
    pub speed: f64,
    pub limits: ClockLimits,
    pub include_dwarf_planets: bool,
    pub selected: Option<Body>,
    pub orbits_visible: bool,
    pub labels_visible: bool,
    pub orbit_samples: usize,
    pub orbit_refresh_ticks: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        let conservative = QualitySettings::conservative();
        Self {
            start: Instant::J2000,
            speed: 1.0,
            limits: ClockLimits::default(),
            include_dwarf_planets: false,
            selected: None,
            orbits_visible: true,
            labels_visible: true,
            orbit_samples: conservative.orbit_samples as usize,
            orbit_refresh_ticks: conservative.orbit_refresh_ticks,
        }
    }
}

pub struct OrbitStore {
    clock: SimulationClock,
    resolver: EphemerisResolver,
    paths: OrbitPathSampler,
    /// Resolved every tick, catalog order.
    bodies: Vec<Body>,
    /// Bodies with an orbit line (everything but the Sun).
    orbiting: Vec<Body>,
    /// Keyboard navigation order.
    navigation: Vec<Body>,
    tracks: HashMap<String, Arc<CinematicTrack>>,
    selected: Option<Body>,
    orbits_visible: bool,
    labels_visible: bool,
    revision: u64,
    snapshot: Arc<OrbitSnapshot>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl OrbitStore {
    pub fn new(oracle: Box<dyn EphemerisOracle>, options: StoreOptions) -> Self {
        let bodies = visible_bodies(options.include_dwarf_planets);
        let navigation = navigation_order(options.include_dwarf_planets);
        let orbiting = bodies.iter().copied().filter(|b| b.parent().is_some()).collect();
        let selected = options.selected.filter(|b| bodies.contains(b));
        let clock = SimulationClock::new(options.start, options.speed, options.limits);
        let empty = Arc::new(OrbitSnapshot {
            revision: 0,
            instant: clock.instant(),
            date: clock.instant().to_string(),
            speed: clock.speed(),
            playback: clock.playback(),
            selected,
            planets: Vec::new(),
            orbits_visible: options.orbits_visible,
            labels_visible: options.labels_visible,
            viewpoint: None,
            orbit_paths: Arc::new(Vec::new()),
        });

        let mut store = Self {
            clock,
            resolver: EphemerisResolver::new(oracle),
            paths: OrbitPathSampler::new(options.orbit_samples, options.orbit_refresh_ticks),
            bodies,
            orbiting,
            navigation,
            tracks: HashMap::new(),
            selected,
            orbits_visible: options.orbits_visible,
            labels_visible: options.labels_visible,
            revision: 0,
            snapshot: empty,
            subscribers: Vec::new(),
            next_subscription: 1,
        };
        store.refresh_paths();
        store.publish();
        store
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> Arc<OrbitSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn resolver(&self) -> &EphemerisResolver {
        &self.resolver
    }

    pub fn navigation(&self) -> &[Body] {
        &self.navigation
    }

    /// Register a track, replacing any with the same name.
    pub fn add_track(&mut self, track: CinematicTrack) {
        log::debug!("Track '{}' registered ({} keyframes)", track.name(), track.keyframes().len());
        self.tracks.insert(track.name().to_string(), Arc::new(track));
    }

    pub fn track_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tracks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // ── Mutators ──────────────────────────────────────────────────────

    /// Run one tick: clock, then orbit paths, then publish.
    pub fn advance_time(&mut self, real_dt: f64) -> TickOutcome {
        let outcome = self.clock.tick(real_dt);
        let paths_changed = self.refresh_paths();
        if outcome != TickOutcome::Held || paths_changed {
            self.publish();
        }
        outcome
    }

    pub fn set_speed(&mut self, days_per_sec: f64) {
        self.clock.set_speed(days_per_sec);
        self.publish();
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
        self.publish();
    }

    /// Jump to a date. Cancels cinematic playback.
    pub fn set_instant(&mut self, instant: Instant) {
        self.clock.set_instant(instant);
        self.publish();
    }

    /// Returns true if the selection changed. Never touches the clock.
    pub fn select_planet(&mut self, request: Selection) -> bool {
        match selection::resolve_selection(&request, self.selected, &self.navigation, &self.bodies) {
            Some(next) if next != self.selected => {
                self.selected = next;
                self.publish();
                true
            }
            Some(_) => false,
            None => {
                log::debug!("Selection {:?} ignored", request);
                false
            }
        }
    }

    /// Play a track from the library. The grand tour is built on demand
    /// from the current instant unless the library overrides it.
    pub fn start_cinematic(&mut self, name: &str) -> bool {
        let track = match self.tracks.get(name) {
            Some(track) => Arc::clone(track),
            None if name == GRAND_TOUR => Arc::new(CinematicTrack::grand_tour(
                self.clock.instant(),
                &self.navigation,
            )),
            None => {
                log::warn!("Unknown cinematic track '{}'", name);
                return false;
            }
        };
        self.clock.start_cinematic(track);
        self.publish();
        true
    }

    pub fn stop_cinematic(&mut self) -> bool {
        let stopped = self.clock.stop_cinematic();
        if stopped {
            self.publish();
        }
        stopped
    }

    pub fn toggle_cinematic(&mut self) {
        if !self.stop_cinematic() {
            self.start_cinematic(GRAND_TOUR);
        }
    }

    pub fn toggle_orbits_visible(&mut self) {
        self.orbits_visible = !self.orbits_visible;
        self.refresh_paths();
        self.publish();
    }

    pub fn toggle_labels_visible(&mut self) {
        self.labels_visible = !self.labels_visible;
        self.publish();
    }

    /// Adopt new sampling knobs from the quality settings.
    pub fn apply_quality(&mut self, settings: &QualitySettings) {
        self.paths
            .configure(settings.orbit_samples as usize, settings.orbit_refresh_ticks);
        if self.refresh_paths() {
            self.publish();
        }
    }

    // ── Subscriptions ─────────────────────────────────────────────────

    /// Call `callback` with every snapshot published from now on.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Arc<OrbitSnapshot>) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn refresh_paths(&mut self) -> bool {
        self.paths.tick(
            &mut self.resolver,
            &self.orbiting,
            self.clock.instant(),
            self.orbits_visible,
        )
    }

    fn publish(&mut self) {
        let instant = self.clock.instant();
        let planets = self
            .resolver
            .resolve_batch(&self.bodies, instant)
            .iter()
            .map(PlanetViewModel::from_sample)
            .collect();

        self.revision += 1;
        self.snapshot = Arc::new(OrbitSnapshot {
            revision: self.revision,
            instant,
            date: instant.to_string(),
            speed: self.clock.speed(),
            playback: self.clock.playback(),
            selected: self.selected,
            planets,
            orbits_visible: self.orbits_visible,
            labels_visible: self.labels_visible,
            viewpoint: self.clock.viewpoint(),
            orbit_paths: Arc::clone(self.paths.paths()),
        });
        for (_, callback) in &mut self.subscribers {
            callback(&self.snapshot);
        }
    }
}
