//! Orbit path sampling for the renderer's orbit lines.
//!
//! Paths are expensive (one oracle call per sample point) so they are only
//! refreshed every `refresh_interval` ticks and only while orbits are shown.
//! Both knobs come from the quality settings.

use std::sync::Arc;

use glam::DVec3;
use serde::Serialize;

use crate::bodies::Body;
use crate::core::instant::Instant;
use super::oracle::ReferenceFrame;
use super::resolver::EphemerisResolver;

/// One closed orbit line. Moon paths are geocentric; everything else is
/// heliocentric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitPath {
    pub body: Body,
    pub frame: ReferenceFrame,
    pub points: Vec<DVec3>,
}

pub struct OrbitPathSampler {
    samples: usize,
    refresh_interval: u32,
    ticks_since_refresh: u32,
    paths: Arc<Vec<OrbitPath>>,
}

impl OrbitPathSampler {
    pub fn new(samples: usize, refresh_interval: u32) -> Self {
        Self {
            samples,
            refresh_interval: refresh_interval.max(1),
            // first eligible tick refreshes
            ticks_since_refresh: u32::MAX,
            paths: Arc::new(Vec::new()),
        }
    }

    pub fn paths(&self) -> &Arc<Vec<OrbitPath>> {
        &self.paths
    }

    /// Apply new fidelity knobs. A change in sample count forces a refresh.
    pub fn configure(&mut self, samples: usize, refresh_interval: u32) {
        if samples != self.samples {
            self.ticks_since_refresh = u32::MAX;
        }
        self.samples = samples;
        self.refresh_interval = refresh_interval.max(1);
    }

    /// Count one tick and resample when due. Returns true when paths changed.
    pub fn tick(
        &mut self,
        resolver: &mut EphemerisResolver,
        bodies: &[Body],
        instant: Instant,
        orbits_visible: bool,
    ) -> bool {
        if !orbits_visible || self.samples < 3 {
            return false;
        }
        self.ticks_since_refresh = self.ticks_since_refresh.saturating_add(1);
        if self.ticks_since_refresh < self.refresh_interval {
            return false;
        }
        self.ticks_since_refresh = 0;

        // Keep the previous line for any body whose resample fails.
        let previous = Arc::clone(&self.paths);
        let mut paths = Vec::with_capacity(bodies.len());
        for &body in bodies {
            match sample_orbit_path(resolver, body, instant, self.samples) {
                Some(path) => paths.push(path),
                None => {
                    if let Some(old) = previous.iter().find(|p| p.body == body) {
                        paths.push(old.clone());
                    }
                }
            }
        }
        self.paths = Arc::new(paths);
        true
    }
}

/// Resolve `body` at `samples` evenly spaced instants across one period
/// centred on `around`. `None` for the Sun or if any sample fails.
pub fn sample_orbit_path(
    resolver: &mut EphemerisResolver,
    body: Body,
    around: Instant,
    samples: usize,
) -> Option<OrbitPath> {
    let period = body.info().orbital_period_days;
    if period <= 0.0 || samples == 0 {
        return None;
    }
    let frame = if body.parent() == Some(Body::Earth) {
        ReferenceFrame::Geocentric
    } else {
        ReferenceFrame::Heliocentric
    };
    let start = around.add_days(-period / 2.0);
    let step = period / samples as f64;
    let mut points = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = start.add_days(step * i as f64);
        match resolver.resolve_uncached(body, t, frame) {
            Ok(p) => points.push(p),
            Err(err) => {
                log::debug!("Orbit path for {:?} incomplete: {}", body, err);
                return None;
            }
        }
    }
    Some(OrbitPath { body, frame, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::oracle::FnOracle;
    use crate::error::OracleError;

    fn circle_resolver() -> EphemerisResolver {
        EphemerisResolver::new(Box::new(FnOracle(
            |body: Body, instant: Instant, _frame: ReferenceFrame| -> Result<DVec3, OracleError> {
                let info = body.info();
                let angle = std::f64::consts::TAU * instant.days() / info.orbital_period_days;
                let r = info.semi_major_axis_au;
                Ok(DVec3::new(r * angle.cos(), r * angle.sin(), 0.0))
            },
        )))
    }

    #[test]
    fn samples_a_full_period() {
        let mut r = circle_resolver();
        let path = sample_orbit_path(&mut r, Body::Earth, Instant::J2000, 64).unwrap();
        assert_eq!(path.points.len(), 64);
        for p in &path.points {
            assert!((p.length() - 1.0).abs() < 1e-9);
        }
        assert_eq!(path.frame, ReferenceFrame::Heliocentric);
    }

    #[test]
    fn moon_path_is_geocentric() {
        let mut r = circle_resolver();
        let path = sample_orbit_path(&mut r, Body::Moon, Instant::J2000, 16).unwrap();
        assert_eq!(path.frame, ReferenceFrame::Geocentric);
    }

    #[test]
    fn sun_has_no_path() {
        let mut r = circle_resolver();
        assert!(sample_orbit_path(&mut r, Body::Sun, Instant::J2000, 16).is_none());
    }

    #[test]
    fn refresh_follows_cadence() {
        let mut r = circle_resolver();
        let mut sampler = OrbitPathSampler::new(8, 3);
        let bodies = [Body::Earth, Body::Mars];
        let refreshed: Vec<bool> = (0..7)
            .map(|i| sampler.tick(&mut r, &bodies, Instant::from_days(i as f64), true))
            .collect();
        assert_eq!(refreshed, vec![true, false, false, true, false, false, true]);
        assert_eq!(sampler.paths().len(), 2);
    }

    #[test]
    fn hidden_orbits_cost_nothing() {
        let mut r = circle_resolver();
        let mut sampler = OrbitPathSampler::new(8, 1);
        assert!(!sampler.tick(&mut r, &[Body::Earth], Instant::J2000, false));
        assert_eq!(r.oracle_calls(), 0);
    }
}
