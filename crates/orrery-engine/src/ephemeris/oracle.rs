//! Boundary to the external ephemeris oracle.
//!
//! The engine trusts the oracle's numbers but not its availability: any call
//! may fail (out-of-range dates, missing models) and the resolver recovers.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::bodies::Body;
use crate::core::instant::Instant;
use crate::error::OracleError;

/// Frame the returned vector is expressed in. Both are ecliptic, in AU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// Origin at the Sun.
    #[default]
    Heliocentric,
    /// Origin at the Earth.
    Geocentric,
}

/// Computes a body's position at an instant.
pub trait EphemerisOracle {
    fn resolve_position(
        &self,
        body: Body,
        instant: Instant,
        frame: ReferenceFrame,
    ) -> Result<DVec3, OracleError>;
}

/// Adapts a closure into an oracle. Handy for hosts and tests.
pub struct FnOracle<F>(pub F);

impl<F> EphemerisOracle for FnOracle<F>
where
    F: Fn(Body, Instant, ReferenceFrame) -> Result<DVec3, OracleError>,
{
    fn resolve_position(
        &self,
        body: Body,
        instant: Instant,
        frame: ReferenceFrame,
    ) -> Result<DVec3, OracleError> {
        (self.0)(body, instant, frame)
    }
}

impl<T: EphemerisOracle + ?Sized> EphemerisOracle for Box<T> {
    fn resolve_position(
        &self,
        body: Body,
        instant: Instant,
        frame: ReferenceFrame,
    ) -> Result<DVec3, OracleError> {
        (**self).resolve_position(body, instant, frame)
    }
}
