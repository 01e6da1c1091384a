pub mod capability;
pub mod context;
pub mod performance;
pub mod quality;

pub use capability::{
    Breakpoint, CapabilityClassifier, CapabilityProfile, ConnectionInfo, GpuTier, NetworkClass,
    ProbeSource, ResizeDebouncer, WebGlInfo, WebGlTier,
};
pub use context::{DeviceConfig, DeviceContext};
pub use performance::{PerfConfig, PerfSignal, PerfVerdict, PerformanceMonitor};
pub use quality::{derive_settings, derive_settings_capped, QualitySettings, QualityTier, ShaderQuality};
