pub mod api;
pub mod bodies;
pub mod bridge;
pub mod config;
pub mod core;
pub mod device;
pub mod ephemeris;
pub mod error;
pub mod extensions;
pub mod input;
pub mod store;

// Re-export key types at crate root for convenience
pub use api::engine::OrbitEngine;
pub use bodies::{Body, BodyInfo};
pub use bridge::protocol::{BodyInstance, PathVertex, PositionBuffer, ProtocolLayout};
pub use config::{DeepLink, EngineConfig, TrackConfig};
pub use core::cinematic::{CinematicTrack, Keyframe, TrackCursor, Viewpoint, GRAND_TOUR};
pub use core::instant::Instant;
pub use core::time::{ClockLimits, Playback, SimulationClock, TickOutcome};
pub use device::{
    derive_settings, derive_settings_capped, CapabilityClassifier, CapabilityProfile,
    ConnectionInfo, DeviceConfig, DeviceContext, GpuTier, NetworkClass, PerfConfig, PerfSignal,
    PerformanceMonitor, ProbeSource, QualitySettings, QualityTier, WebGlInfo, WebGlTier,
};
pub use ephemeris::{
    EphemerisOracle, EphemerisResolver, FnOracle, OrbitPath, PositionSample, ReferenceFrame,
};
pub use error::{ConfigError, OracleError, ProbeError, TrackError};
pub use input::{Command, InputEvent, InputQueue};
pub use store::{OrbitSnapshot, OrbitStore, PlanetViewModel, Selection, StoreOptions, SubscriptionId};

// Extensions
pub use extensions::{ease, lerp, Easing};
