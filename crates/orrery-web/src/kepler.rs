//! Keplerian ephemeris oracle: JPL approximate planetary positions.
//!
//! J2000 mean elements with secular rates per century, solved per call.
//! Uses f64 throughout (centuries × deg/century gets large). Accuracy is a
//! fraction of a degree near the present, degrading slowly outside
//! 1800-2050; instants past the configured range are refused.

use glam::DVec3;
use orrery_engine::{Body, EphemerisOracle, Instant, OracleError, ReferenceFrame};

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Keplerian orbital elements at J2000 with secular rates per century.
/// Source: Standish (1992) / JPL approximate planetary positions.
#[derive(Debug, Clone, Copy)]
pub struct OrbitalElements {
    /// Semi-major axis (AU)
    pub a0: f64,
    /// Eccentricity
    pub e0: f64,
    /// Inclination to the ecliptic (degrees)
    pub i0: f64,
    /// Mean longitude (degrees) at J2000
    pub l0: f64,
    /// Mean longitude rate (degrees per Julian century)
    pub l_dot: f64,
    /// Longitude of perihelion (degrees) at J2000
    pub w0: f64,
    /// Longitude of perihelion rate (degrees per Julian century)
    pub w_dot: f64,
    /// Longitude of the ascending node (degrees)
    pub node0: f64,
}

#[rustfmt::skip]
const PLANETS: [(Body, OrbitalElements); 9] = [
    (Body::Mercury, OrbitalElements { a0: 0.38710, e0: 0.20563, i0: 7.005, l0: 252.251, l_dot: 149472.675, w0: 77.457, w_dot: 0.159, node0: 48.331 }),
    (Body::Venus, OrbitalElements { a0: 0.72333, e0: 0.00677, i0: 3.395, l0: 181.980, l_dot: 58517.816, w0: 131.564, w_dot: 0.053, node0: 76.680 }),
    (Body::Earth, OrbitalElements { a0: 1.00000, e0: 0.01671, i0: 0.0, l0: 100.464, l_dot: 35999.373, w0: 102.937, w_dot: 0.323, node0: 0.0 }),
    (Body::Mars, OrbitalElements { a0: 1.52368, e0: 0.09340, i0: 1.850, l0: 355.453, l_dot: 19140.300, w0: 336.060, w_dot: 0.443, node0: 49.560 }),
    (Body::Jupiter, OrbitalElements { a0: 5.20260, e0: 0.04849, i0: 1.304, l0: 34.351, l_dot: 3034.906, w0: 14.331, w_dot: 0.172, node0: 100.474 }),
    (Body::Saturn, OrbitalElements { a0: 9.55491, e0: 0.05551, i0: 2.486, l0: 50.077, l_dot: 1222.114, w0: 93.057, w_dot: 0.312, node0: 113.662 }),
    (Body::Uranus, OrbitalElements { a0: 19.21845, e0: 0.04630, i0: 0.773, l0: 314.055, l_dot: 428.467, w0: 173.005, w_dot: 0.030, node0: 74.017 }),
    (Body::Neptune, OrbitalElements { a0: 30.11039, e0: 0.00899, i0: 1.770, l0: 304.349, l_dot: 218.486, w0: 48.120, w_dot: 0.012, node0: 131.784 }),
    (Body::Pluto, OrbitalElements { a0: 39.482, e0: 0.2488, i0: 17.140, l0: 238.929, l_dot: 145.18, w0: 224.067, w_dot: 0.006, node0: 110.304 }),
];

/// Simplified lunar orbit: circular, inclined, with a regressing node.
const MOON_DISTANCE_AU: f64 = 0.00257;
const MOON_L0: f64 = 218.316;
const MOON_L_DOT: f64 = 481267.881;
const MOON_INCLINATION: f64 = 5.145;
const MOON_NODE0: f64 = 125.08;
const MOON_NODE_DOT: f64 = -1934.136;

/// Solve Kepler's equation: E - e·sin(E) = M
/// Using Newton-Raphson iteration.
/// `mean_anomaly` in radians, returns eccentric anomaly in radians.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut ea = mean_anomaly;
    for _ in 0..15 {
        let delta = ea - eccentricity * ea.sin() - mean_anomaly;
        let derivative = 1.0 - eccentricity * ea.cos();
        ea -= delta / derivative;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ea
}

/// Rotate an in-plane angle `u` (from the node) at radius `r` into the
/// ecliptic frame.
fn to_ecliptic(r: f64, u: f64, inclination: f64, node: f64) -> DVec3 {
    let (su, cu) = u.sin_cos();
    let (sn, cn) = node.sin_cos();
    let (si, ci) = inclination.sin_cos();
    DVec3::new(
        r * (cn * cu - sn * su * ci),
        r * (sn * cu + cn * su * ci),
        r * su * si,
    )
}

/// Heliocentric ecliptic position (AU) at `t` Julian centuries from J2000.
pub fn heliocentric_position(elements: &OrbitalElements, t: f64) -> DVec3 {
    let a = elements.a0;
    let e = elements.e0;

    let l = (elements.l0 + elements.l_dot * t) * DEG_TO_RAD;
    let w = (elements.w0 + elements.w_dot * t) * DEG_TO_RAD;
    let node = elements.node0 * DEG_TO_RAD;

    // Mean anomaly = mean longitude - longitude of perihelion
    let m = (l - w).rem_euclid(std::f64::consts::TAU);
    let ea = solve_kepler(m, e);

    let true_anomaly = 2.0
        * ((1.0 + e).sqrt() * (ea / 2.0).sin())
            .atan2((1.0 - e).sqrt() * (ea / 2.0).cos());
    let r = a * (1.0 - e * ea.cos());

    // argument of latitude = true anomaly + argument of perihelion
    let u = true_anomaly + w - node;
    to_ecliptic(r, u, elements.i0 * DEG_TO_RAD, node)
}

/// Geocentric ecliptic position of the Moon (AU).
pub fn moon_geocentric(t: f64) -> DVec3 {
    let l = (MOON_L0 + MOON_L_DOT * t) * DEG_TO_RAD;
    let node = (MOON_NODE0 + MOON_NODE_DOT * t) * DEG_TO_RAD;
    to_ecliptic(MOON_DISTANCE_AU, l - node, MOON_INCLINATION * DEG_TO_RAD, node)
}

pub struct KeplerOracle {
    /// Accepted range in Julian centuries from J2000.
    min_centuries: f64,
    max_centuries: f64,
}

impl KeplerOracle {
    /// Covers 3000 BC to AD 3000, wide enough to sample Neptune's and
    /// Pluto's full orbit around any present-day date.
    pub fn new() -> Self {
        Self::with_range(-50.0, 10.0)
    }

    pub fn with_range(min_centuries: f64, max_centuries: f64) -> Self {
        Self {
            min_centuries,
            max_centuries,
        }
    }

    fn elements(body: Body) -> Option<&'static OrbitalElements> {
        PLANETS.iter().find(|(b, _)| *b == body).map(|(_, e)| e)
    }

    fn heliocentric(&self, body: Body, t: f64) -> Result<DVec3, OracleError> {
        match body {
            Body::Sun => Ok(DVec3::ZERO),
            Body::Moon => {
                let earth = self.heliocentric(Body::Earth, t)?;
                Ok(earth + moon_geocentric(t))
            }
            _ => Self::elements(body)
                .map(|e| heliocentric_position(e, t))
                .ok_or(OracleError::UnsupportedBody(body)),
        }
    }
}

impl Default for KeplerOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemerisOracle for KeplerOracle {
    fn resolve_position(
        &self,
        body: Body,
        instant: Instant,
        frame: ReferenceFrame,
    ) -> Result<DVec3, OracleError> {
        let t = instant.centuries();
        if !(self.min_centuries..=self.max_centuries).contains(&t) {
            return Err(OracleError::OutOfRange { body, instant });
        }
        match frame {
            ReferenceFrame::Heliocentric => self.heliocentric(body, t),
            ReferenceFrame::Geocentric => {
                if body == Body::Moon {
                    return Ok(moon_geocentric(t));
                }
                let earth = self.heliocentric(Body::Earth, t)?;
                Ok(self.heliocentric(body, t)? - earth)
            }
        }
    }
}
