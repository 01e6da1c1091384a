//! Body identities and the static catalog joined with live positions.
//!
//! Physical values are catalog constants (NASA planetary fact sheets), never
//! recomputed per frame. Display radii are exaggerated for readability.

use serde::{Deserialize, Serialize};

/// Number of bodies in the catalog.
pub const BODY_COUNT: usize = 11;

/// Every body the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Moon,
    Pluto,
}

impl Body {
    /// Catalog order. Also the insertion order of snapshot planets.
    pub const ALL: [Body; BODY_COUNT] = [
        Body::Sun,
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Moon,
        Body::Pluto,
    ];

    /// The eight planets, sorted by distance from the Sun.
    pub const PLANETS: [Body; 8] = [
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
    ];

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Body> {
        let name = name.trim();
        Body::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Stable numeric id used on the wire (index into `ALL`).
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Body> {
        Body::ALL.get(id as usize).copied()
    }

    pub fn is_planet(self) -> bool {
        Body::PLANETS.contains(&self)
    }

    pub fn is_dwarf(self) -> bool {
        matches!(self, Body::Pluto)
    }

    /// Body this one orbits, if not the Sun.
    pub fn parent(self) -> Option<Body> {
        match self {
            Body::Sun => None,
            Body::Moon => Some(Body::Earth),
            _ => Some(Body::Sun),
        }
    }

    pub fn info(self) -> &'static BodyInfo {
        &CATALOG[self as usize]
    }
}

/// Static attributes for one body.
#[derive(Debug, Clone, Copy)]
pub struct BodyInfo {
    pub name: &'static str,
    /// Mean distance from the parent (AU).
    pub semi_major_axis_au: f64,
    /// Sidereal orbital period (days). Zero for the Sun.
    pub orbital_period_days: f64,
    /// Mean orbital velocity (km/s).
    pub orbital_velocity_km_s: f64,
    /// Mean surface/effective temperature (K).
    pub temperature_k: f64,
    /// Mass in Earth masses.
    pub mass_earths: f64,
    /// Mean radius in Earth radii.
    pub radius_earths: f64,
    pub moon_count: u32,
    /// Renderer display radius (scene units).
    pub display_radius: f32,
    pub color: (f32, f32, f32),
}

const CATALOG: [BodyInfo; BODY_COUNT] = [
    BodyInfo {
        name: "Sun",
        semi_major_axis_au: 0.0,
        orbital_period_days: 0.0,
        orbital_velocity_km_s: 0.0,
        temperature_k: 5772.0,
        mass_earths: 332_946.0,
        radius_earths: 109.2,
        moon_count: 0,
        display_radius: 16.0,
        color: (1.0, 0.9, 0.5),
    },
    BodyInfo {
        name: "Mercury",
        semi_major_axis_au: 0.387,
        orbital_period_days: 87.97,
        orbital_velocity_km_s: 47.36,
        temperature_k: 440.0,
        mass_earths: 0.0553,
        radius_earths: 0.383,
        moon_count: 0,
        display_radius: 3.0,
        color: (0.60, 0.55, 0.50),
    },
    BodyInfo {
        name: "Venus",
        semi_major_axis_au: 0.723,
        orbital_period_days: 224.70,
        orbital_velocity_km_s: 35.02,
        temperature_k: 737.0,
        mass_earths: 0.815,
        radius_earths: 0.949,
        moon_count: 0,
        display_radius: 4.5,
        color: (0.90, 0.75, 0.40),
    },
    BodyInfo {
        name: "Earth",
        semi_major_axis_au: 1.0,
        orbital_period_days: 365.26,
        orbital_velocity_km_s: 29.78,
        temperature_k: 288.0,
        mass_earths: 1.0,
        radius_earths: 1.0,
        moon_count: 1,
        display_radius: 5.0,
        color: (0.20, 0.40, 0.80),
    },
    BodyInfo {
        name: "Mars",
        semi_major_axis_au: 1.524,
        orbital_period_days: 686.98,
        orbital_velocity_km_s: 24.07,
        temperature_k: 210.0,
        mass_earths: 0.107,
        radius_earths: 0.532,
        moon_count: 2,
        display_radius: 4.0,
        color: (0.80, 0.30, 0.15),
    },
    BodyInfo {
        name: "Jupiter",
        semi_major_axis_au: 5.203,
        orbital_period_days: 4332.59,
        orbital_velocity_km_s: 13.07,
        temperature_k: 165.0,
        mass_earths: 317.8,
        radius_earths: 11.21,
        moon_count: 95,
        display_radius: 14.0,
        color: (0.80, 0.70, 0.50),
    },
    BodyInfo {
        name: "Saturn",
        semi_major_axis_au: 9.537,
        orbital_period_days: 10759.22,
        orbital_velocity_km_s: 9.68,
        temperature_k: 134.0,
        mass_earths: 95.2,
        radius_earths: 9.45,
        moon_count: 146,
        display_radius: 12.0,
        color: (0.85, 0.75, 0.50),
    },
    BodyInfo {
        name: "Uranus",
        semi_major_axis_au: 19.19,
        orbital_period_days: 30688.5,
        orbital_velocity_km_s: 6.80,
        temperature_k: 76.0,
        mass_earths: 14.5,
        radius_earths: 4.01,
        moon_count: 28,
        display_radius: 7.0,
        color: (0.50, 0.75, 0.85),
    },
    BodyInfo {
        name: "Neptune",
        semi_major_axis_au: 30.07,
        orbital_period_days: 60182.0,
        orbital_velocity_km_s: 5.43,
        temperature_k: 72.0,
        mass_earths: 17.1,
        radius_earths: 3.88,
        moon_count: 16,
        display_radius: 6.5,
        color: (0.25, 0.35, 0.80),
    },
    BodyInfo {
        name: "Moon",
        semi_major_axis_au: 0.00257,
        orbital_period_days: 27.32,
        orbital_velocity_km_s: 1.022,
        temperature_k: 250.0,
        mass_earths: 0.0123,
        radius_earths: 0.273,
        moon_count: 0,
        display_radius: 2.0,
        color: (0.70, 0.70, 0.70),
    },
    BodyInfo {
        name: "Pluto",
        semi_major_axis_au: 39.48,
        orbital_period_days: 90560.0,
        orbital_velocity_km_s: 4.74,
        temperature_k: 44.0,
        mass_earths: 0.0022,
        radius_earths: 0.187,
        moon_count: 5,
        display_radius: 2.0,
        color: (0.70, 0.60, 0.50),
    },
];

/// Bodies resolved every tick, in catalog order.
pub fn visible_bodies(include_dwarfs: bool) -> Vec<Body> {
    Body::ALL
        .into_iter()
        .filter(|b| include_dwarfs || !b.is_dwarf())
        .collect()
}

/// Keyboard navigation order: planets by distance, dwarfs appended when shown.
pub fn navigation_order(include_dwarfs: bool) -> Vec<Body> {
    let mut order: Vec<Body> = Body::ALL
        .into_iter()
        .filter(|b| b.is_planet() || (include_dwarfs && b.is_dwarf()))
        .collect();
    order.sort_by(|a, b| {
        a.info()
            .semi_major_axis_au
            .total_cmp(&b.info().semi_major_axis_au)
    });
    order
}
