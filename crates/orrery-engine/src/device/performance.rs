use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Thresholds for the frame-time watchdog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    /// Frames kept in the rolling window. Also sets the EMA smoothing.
    pub window_frames: usize,
    /// Smoothed frame time above this counts as over budget (~30 fps).
    pub frame_budget_ms: f64,
    /// Consecutive over-budget frames before a downgrade is requested.
    pub sustained_frames: u32,
    /// Used/limit heap ratio treated as memory pressure.
    pub memory_pressure_ratio: f64,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            window_frames: 60,
            frame_budget_ms: 33.3,
            sustained_frames: 90,
            memory_pressure_ratio: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerfVerdict {
    Stable,
    Degraded,
}

/// Request sent back to the device context. There is no upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfSignal {
    Degrade,
}

pub struct PerformanceMonitor {
    config: PerfConfig,
    frames: VecDeque<f64>,
    smoothed_ms: Option<f64>,
    memory_ratio: Option<f64>,
    over_budget: u32,
}

impl PerformanceMonitor {
    pub fn new(config: PerfConfig) -> Self {
        let capacity = config.window_frames.max(1);
        Self {
            config,
            frames: VecDeque::with_capacity(capacity),
            smoothed_ms: None,
            memory_ratio: None,
            over_budget: 0,
        }
    }

    pub fn config(&self) -> &PerfConfig {
        &self.config
    }

    pub fn smoothed_frame_ms(&self) -> Option<f64> {
        self.smoothed_ms
    }

    /// Plain mean over the rolling window.
    pub fn average_frame_ms(&self) -> Option<f64> {
        if self.frames.is_empty() {
            return None;
        }
        Some(self.frames.iter().sum::<f64>() / self.frames.len() as f64)
    }

    pub fn verdict(&self) -> PerfVerdict {
        let slow = self
            .smoothed_ms
            .is_some_and(|ms| ms > self.config.frame_budget_ms);
        let pressured = self
            .memory_ratio
            .is_some_and(|r| r > self.config.memory_pressure_ratio);
        if slow || pressured {
            PerfVerdict::Degraded
        } else {
            PerfVerdict::Stable
        }
    }

    /// Latest JS heap reading. Ignored when the limit is unknown.
    pub fn record_memory(&mut self, used_bytes: f64, limit_bytes: f64) {
        if used_bytes.is_finite() && limit_bytes.is_finite() && limit_bytes > 0.0 {
            self.memory_ratio = Some((used_bytes / limit_bytes).max(0.0));
        }
    }

    /// Feed one frame duration. Emits `Degrade` once per sustained streak,
    /// then starts over with an empty window.
    pub fn record_frame(&mut self, frame_ms: f64) -> Option<PerfSignal> {
        if !frame_ms.is_finite() || frame_ms <= 0.0 {
            return None;
        }
        let window = self.config.window_frames.max(1);
        if self.frames.len() == window {
            self.frames.pop_front();
        }
        self.frames.push_back(frame_ms);

        let alpha = 2.0 / (window as f64 + 1.0);
        self.smoothed_ms = Some(match self.smoothed_ms {
            Some(prev) => prev + alpha * (frame_ms - prev),
            None => frame_ms,
        });

        match self.verdict() {
            PerfVerdict::Degraded => self.over_budget += 1,
            PerfVerdict::Stable => self.over_budget = 0,
        }
        if self.over_budget < self.config.sustained_frames.max(1) {
            return None;
        }

        log::warn!(
            "Sustained slow frames ({:.1} ms smoothed, memory {:?}), requesting downgrade",
            self.smoothed_ms.unwrap_or(frame_ms),
            self.memory_ratio
        );
        self.reset();
        Some(PerfSignal::Degrade)
    }

    pub fn reset(&mut self) {
        self.frames.clear();
        self.smoothed_ms = None;
        self.memory_ratio = None;
        self.over_budget = 0;
    }
}
