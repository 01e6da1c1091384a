use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::capability::{CapabilityClassifier, CapabilityProfile, ProbeSource, ResizeDebouncer};
use super::performance::{PerfConfig, PerfSignal, PerformanceMonitor};
use super::quality::{derive_settings_capped, QualitySettings, QualityTier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Wall-clock budget for one detection pass.
    pub probe_budget_ms: f64,
    /// Quiet period after the last resize before re-detecting.
    pub resize_debounce_ms: f64,
    pub performance: PerfConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            probe_budget_ms: 50.0,
            resize_debounce_ms: 250.0,
            performance: PerfConfig::default(),
        }
    }
}

/// Owns the capability profile, derived settings and the downgrade ceiling.
///
/// Starts on conservative settings; `detect` swaps in the real profile.
/// The ceiling only ever moves down, so a re-detection after a resize can
/// never undo a performance downgrade.
pub struct DeviceContext {
    classifier: CapabilityClassifier,
    profile: Arc<CapabilityProfile>,
    settings: Arc<QualitySettings>,
    ceiling: QualityTier,
    monitor: PerformanceMonitor,
    debouncer: ResizeDebouncer,
    detected: bool,
}

impl DeviceContext {
    pub fn new(config: &DeviceConfig) -> Self {
        let profile = CapabilityProfile::conservative();
        let settings = derive_settings_capped(&profile, QualityTier::High);
        Self {
            classifier: CapabilityClassifier::new(config.probe_budget_ms),
            profile: Arc::new(profile),
            settings: Arc::new(settings),
            ceiling: QualityTier::High,
            monitor: PerformanceMonitor::new(config.performance.clone()),
            debouncer: ResizeDebouncer::new(config.resize_debounce_ms),
            detected: false,
        }
    }

    pub fn profile(&self) -> Arc<CapabilityProfile> {
        Arc::clone(&self.profile)
    }

    pub fn settings(&self) -> Arc<QualitySettings> {
        Arc::clone(&self.settings)
    }

    pub fn ceiling(&self) -> QualityTier {
        self.ceiling
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// Probe the host and adopt the result. Returns true if settings changed.
    pub fn detect(&mut self, source: &dyn ProbeSource) -> bool {
        let profile = self.classifier.detect(source);
        self.detected = true;
        self.apply_profile(profile)
    }

    /// Replace the profile wholesale. Returns true if settings changed.
    pub fn apply_profile(&mut self, profile: CapabilityProfile) -> bool {
        if *self.profile == profile {
            return false;
        }
        self.profile = Arc::new(profile);
        self.rederive()
    }

    /// Lower the ceiling one tier. False when already at the minimum.
    pub fn apply_degrade(&mut self) -> bool {
        let current = self.settings.tier.min(self.ceiling);
        let Some(lower) = current.step_down() else {
            log::debug!("Already at {:?}, ignoring downgrade", current);
            return false;
        };
        log::info!("Quality ceiling lowered {:?} -> {:?}", self.ceiling, lower);
        self.ceiling = lower;
        self.rederive();
        true
    }

    /// Feed frame timing. Returns true when a downgrade was applied.
    pub fn record_frame(&mut self, frame_ms: f64) -> bool {
        match self.monitor.record_frame(frame_ms) {
            Some(PerfSignal::Degrade) => self.apply_degrade(),
            None => false,
        }
    }

    pub fn record_memory(&mut self, used_bytes: f64, limit_bytes: f64) {
        self.monitor.record_memory(used_bytes, limit_bytes);
    }

    pub fn on_resize(&mut self, width: u32, height: u32, now_ms: f64) {
        self.debouncer.record(width, height, now_ms);
    }

    /// Network class or save-data flipped. Re-detects right away; these
    /// events arrive rarely and never in bursts.
    pub fn on_connection_change(&mut self, source: &dyn ProbeSource) -> bool {
        log::debug!("Connection changed, re-detecting");
        self.detect(source)
    }

    /// Re-detect once resize events have settled. True if settings changed.
    pub fn poll_resize(&mut self, source: &dyn ProbeSource, now_ms: f64) -> bool {
        match self.debouncer.poll(now_ms) {
            Some((w, h)) => {
                log::debug!("Viewport settled at {}x{}, re-detecting", w, h);
                self.detect(source)
            }
            None => false,
        }
    }

    fn rederive(&mut self) -> bool {
        let settings = derive_settings_capped(&self.profile, self.ceiling);
        if settings == *self.settings {
            return false;
        }
        log::info!("Quality settings now {:?}", settings.tier);
        self.settings = Arc::new(settings);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::capability::tests::FakeProbes;
    use crate::device::capability::{Breakpoint, ConnectionInfo, NetworkClass};

    #[test]
    fn starts_conservative_then_upgrades_on_detect() {
        let mut ctx = DeviceContext::new(&DeviceConfig::default());
        assert_eq!(ctx.settings().tier, QualityTier::Low);
        assert!(!ctx.is_detected());
        assert!(ctx.detect(&FakeProbes::desktop()));
        assert_eq!(ctx.settings().tier, QualityTier::High);
    }

    #[test]
    fn degrade_steps_down_to_floor() {
        let mut ctx = DeviceContext::new(&DeviceConfig::default());
        ctx.detect(&FakeProbes::desktop());
        assert!(ctx.apply_degrade());
        assert_eq!(ctx.settings().tier, QualityTier::Medium);
        assert!(ctx.apply_degrade());
        assert_eq!(ctx.settings().tier, QualityTier::Low);
        assert!(!ctx.apply_degrade());
        assert_eq!(ctx.settings().tier, QualityTier::Low);
    }

    #[test]
    fn redetect_keeps_ceiling() {
        let mut ctx = DeviceContext::new(&DeviceConfig::default());
        let mut probes = FakeProbes::desktop();
        ctx.detect(&probes);
        ctx.apply_degrade();

        probes.viewport = Ok((500, 900));
        ctx.on_resize(500, 900, 0.0);
        assert!(!ctx.poll_resize(&probes, 100.0));
        ctx.poll_resize(&probes, 300.0);
        assert_eq!(ctx.profile().breakpoint, Breakpoint::Compact);
        assert_eq!(ctx.settings().tier, QualityTier::Medium);
    }

    #[test]
    fn connection_downgrade_caps_meshes() {
        let mut ctx = DeviceContext::new(&DeviceConfig::default());
        let mut probes = FakeProbes::desktop();
        ctx.detect(&probes);
        assert_eq!(ctx.settings().sphere_segments, 64);

        probes.connection = Ok(ConnectionInfo {
            class: NetworkClass::ThreeG,
            save_data: false,
        });
        assert!(ctx.on_connection_change(&probes));
        assert_eq!(ctx.profile().network, NetworkClass::ThreeG);
        assert_eq!(ctx.settings().sphere_segments, 24);
        assert_eq!(ctx.settings().tier, QualityTier::High);
    }

    #[test]
    fn slow_frames_degrade_through_monitor() {
        let mut ctx = DeviceContext::new(&DeviceConfig {
            performance: PerfConfig {
                sustained_frames: 5,
                ..PerfConfig::default()
            },
            ..DeviceConfig::default()
        });
        ctx.detect(&FakeProbes::desktop());
        let degraded = (0..5).filter(|_| ctx.record_frame(80.0)).count();
        assert_eq!(degraded, 1);
        assert_eq!(ctx.settings().tier, QualityTier::Medium);
    }

    #[test]
    fn unchanged_profile_is_not_a_change() {
        let mut ctx = DeviceContext::new(&DeviceConfig::default());
        assert!(ctx.detect(&FakeProbes::desktop()));
        assert!(!ctx.detect(&FakeProbes::desktop()));
    }
}
