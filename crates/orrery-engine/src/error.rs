//! Error types for the orbital engine.
//!
//! None of these are fatal: oracle and probe failures are recovered locally,
//! config and track errors are returned to whoever supplied the input.

use crate::bodies::Body;
use crate::core::instant::Instant;

/// Failure reported by an ephemeris oracle for one body at one instant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// The instant lies outside the range the oracle's model covers.
    #[error("{body:?} at {instant} is outside the oracle's valid range")]
    OutOfRange { body: Body, instant: Instant },

    /// The oracle has no model for this body.
    #[error("oracle cannot resolve {0:?}")]
    UnsupportedBody(Body),

    /// The oracle produced a non-finite vector.
    #[error("oracle returned a non-finite position for {0:?}")]
    NonFinite(Body),

    /// Any other oracle-specific failure.
    #[error("oracle failure: {0}")]
    Other(String),
}

/// Failure of a single device-capability probe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The host does not expose this API.
    #[error("probe `{0}` is unavailable on this host")]
    Unavailable(&'static str),

    /// The probe was skipped because the detection budget ran out.
    #[error("probe `{0}` exceeded the detection budget")]
    TimedOut(&'static str),

    /// The host API answered with something unusable.
    #[error("probe `{probe}` returned an invalid value: {detail}")]
    Invalid { probe: &'static str, detail: String },
}

/// Rejected cinematic track definition.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("track `{0}` has no keyframes")]
    Empty(String),

    #[error("track `{track}` keyframe {index} has an invalid hold duration")]
    InvalidHold { track: String, index: usize },

    #[error("track `{track}` keyframe {index} has a non-finite instant")]
    InvalidInstant { track: String, index: usize },

    #[error("failed to parse track: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Failure to load engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Track(#[from] TrackError),
}
