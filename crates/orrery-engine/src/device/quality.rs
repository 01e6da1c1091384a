//! Quality settings derived from a capability profile.
//!
//! Derivation is a pure function. Runtime performance feedback never edits
//! settings in place; it lowers the tier ceiling and re-derives.

use serde::{Deserialize, Serialize};

use super::capability::{CapabilityProfile, GpuTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    /// One tier lower, or `None` at the bottom.
    pub fn step_down(self) -> Option<QualityTier> {
        match self {
            QualityTier::High => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::Low => None,
        }
    }

    fn from_gpu(gpu: GpuTier) -> Self {
        match gpu {
            GpuTier::Low => QualityTier::Low,
            GpuTier::Medium => QualityTier::Medium,
            GpuTier::High => QualityTier::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderQuality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySettings {
    pub tier: QualityTier,
    pub star_count: u32,
    pub particle_count: u32,
    pub sphere_segments: u32,
    /// Points per orbit line.
    pub orbit_samples: u32,
    /// Ticks between orbit line resamples.
    pub orbit_refresh_ticks: u32,
    pub enable_bloom: bool,
    pub enable_shadows: bool,
    pub antialias: bool,
    pub min_pixel_ratio: f64,
    pub max_pixel_ratio: f64,
    pub max_texture_size: u32,
    pub shader_quality: ShaderQuality,
    pub touch_sensitivity: f64,
    pub enable_haptics: bool,
}

impl QualitySettings {
    /// Baseline for a tier before profile adjustments.
    pub fn for_tier(tier: QualityTier) -> Self {
        let base = Self {
            tier,
            star_count: 2_000,
            particle_count: 200,
            sphere_segments: 16,
            orbit_samples: 64,
            orbit_refresh_ticks: 30,
            enable_bloom: false,
            enable_shadows: false,
            antialias: false,
            min_pixel_ratio: 1.0,
            max_pixel_ratio: 1.0,
            max_texture_size: 2048,
            shader_quality: ShaderQuality::Low,
            touch_sensitivity: 1.0,
            enable_haptics: false,
        };
        match tier {
            QualityTier::Low => base,
            QualityTier::Medium => Self {
                star_count: 6_000,
                particle_count: 800,
                sphere_segments: 32,
                orbit_samples: 128,
                orbit_refresh_ticks: 10,
                enable_bloom: true,
                antialias: true,
                max_pixel_ratio: 1.5,
                max_texture_size: 4096,
                shader_quality: ShaderQuality::Medium,
                ..base
            },
            QualityTier::High => Self {
                star_count: 15_000,
                particle_count: 2_000,
                sphere_segments: 64,
                orbit_samples: 256,
                orbit_refresh_ticks: 4,
                enable_bloom: true,
                enable_shadows: true,
                antialias: true,
                max_pixel_ratio: 2.0,
                max_texture_size: 8192,
                shader_quality: ShaderQuality::High,
                ..base
            },
        }
    }

    /// Settings served until the first detection completes.
    pub fn conservative() -> Self {
        derive_settings(&CapabilityProfile::conservative())
    }
}

/// Caps applied on save-data or metered links.
const CONSTRAINED_SPHERE_SEGMENTS: u32 = 24;
const CONSTRAINED_TEXTURE_SIZE: u32 = 2048;

pub fn derive_settings(profile: &CapabilityProfile) -> QualitySettings {
    derive_settings_capped(profile, QualityTier::High)
}

/// Derive settings with the tier clamped to `ceiling`.
pub fn derive_settings_capped(profile: &CapabilityProfile, ceiling: QualityTier) -> QualitySettings {
    let mut tier = QualityTier::from_gpu(profile.gpu_tier);
    if profile.is_low_end {
        tier = QualityTier::Low;
    }
    let tier = tier.min(ceiling);
    let mut s = QualitySettings::for_tier(tier);

    if profile.prefers_reduced_motion {
        s.star_count /= 2;
        s.particle_count /= 2;
        s.enable_bloom = false;
    }

    if profile.save_data || profile.network.is_metered() {
        s.sphere_segments = s.sphere_segments.min(CONSTRAINED_SPHERE_SEGMENTS);
        s.max_texture_size = s.max_texture_size.min(CONSTRAINED_TEXTURE_SIZE);
    }
    // an unknown or tiny limit (no WebGL) reads as the conservative size
    s.max_texture_size = s
        .max_texture_size
        .min(profile.max_texture_size.max(CONSTRAINED_TEXTURE_SIZE));

    s.max_pixel_ratio = s.max_pixel_ratio.min(profile.pixel_ratio).max(s.min_pixel_ratio);

    if profile.is_touch {
        s.touch_sensitivity = 1.5;
        s.enable_haptics = profile.is_mobile;
    }
    s
}
