//! Published state. Built whole by the store, shared as `Arc`, never
//! mutated after publication.

use std::sync::Arc;

use glam::DVec3;
use serde::Serialize;

use crate::bodies::Body;
use crate::core::cinematic::Viewpoint;
use crate::core::instant::Instant;
use crate::core::time::Playback;
use crate::ephemeris::{OrbitPath, PositionSample};

/// Catalog constants joined with one live position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetViewModel {
    pub body: Body,
    pub name: &'static str,
    /// Heliocentric ecliptic position (AU).
    pub position: DVec3,
    /// Distance from the Sun at the live position (AU).
    pub distance_au: f64,
    pub orbital_velocity_km_s: f64,
    pub temperature_k: f64,
    pub mass_earths: f64,
    pub radius_earths: f64,
    pub moon_count: u32,
    pub stale: bool,
}

impl PlanetViewModel {
    pub fn from_sample(sample: &PositionSample) -> Self {
        let info = sample.body.info();
        Self {
            body: sample.body,
            name: info.name,
            position: sample.position,
            distance_au: sample.position.length(),
            orbital_velocity_km_s: info.orbital_velocity_km_s,
            temperature_k: info.temperature_k,
            mass_earths: info.mass_earths,
            radius_earths: info.radius_earths,
            moon_count: info.moon_count,
            stale: sample.stale,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrbitSnapshot {
    /// Increments on every publish.
    pub revision: u64,
    pub instant: Instant,
    /// `YYYY-MM-DD` of `instant`.
    pub date: String,
    /// Signed days per second; 0 while paused.
    pub speed: f64,
    pub playback: Playback,
    pub selected: Option<Body>,
    /// Visible bodies in catalog order, every one resolved at `instant`.
    pub planets: Vec<PlanetViewModel>,
    pub orbits_visible: bool,
    pub labels_visible: bool,
    /// Camera pose while a cinematic track plays.
    pub viewpoint: Option<Viewpoint>,
    #[serde(skip)]
    pub orbit_paths: Arc<Vec<OrbitPath>>,
}

impl OrbitSnapshot {
    pub fn get(&self, body: Body) -> Option<&PlanetViewModel> {
        self.planets.iter().find(|p| p.body == body)
    }

    pub fn selected_planet(&self) -> Option<&PlanetViewModel> {
        self.selected.and_then(|b| self.get(b))
    }

    pub fn is_paused(&self) -> bool {
        self.playback == Playback::Paused
    }

    pub fn is_cinematic(&self) -> bool {
        matches!(self.playback, Playback::Cinematic { .. })
    }

    /// True if any body is showing a substitute position.
    pub fn has_stale(&self) -> bool {
        self.planets.iter().any(|p| p.stale)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
