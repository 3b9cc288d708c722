//! # Configuration Module
//!
//! Central place for the tuner's tunable constants. The defaults reproduce the
//! behaviour of a Web-Audio style analyser running at 60 frames per second.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::tuning::{Tuning, TUNING_TOLERANCE_HZ};

/// Number of raw estimates averaged into the smoothed frequency.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Runtime configuration for the analysis pipeline and the frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Capacity of the frequency history (moving-average window).
    pub history_capacity: usize,
    /// Half-width of the "in tune" band, in Hz.
    pub tolerance_hz: f32,
    /// Samples per FFT frame. The spectrum carries `fft_size / 2` bins.
    pub fft_size: usize,
    /// Preferred capture sample rate in Hz.
    pub sample_rate: u32,
    /// Inter-frame smoothing of spectrum magnitudes (0.0 disables it).
    pub smoothing: f32,
    /// Magnitude (dB) mapped to byte value 0.
    pub min_decibels: f32,
    /// Magnitude (dB) mapped to byte value 255.
    pub max_decibels: f32,
    /// Minimum time between two tuning cycles, in milliseconds.
    pub frame_interval_ms: u64,
    /// Table that is active when a session starts.
    pub tuning: Tuning,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            tolerance_hz: TUNING_TOLERANCE_HZ,
            fft_size: 2048,
            sample_rate: 44_100,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            frame_interval_ms: 16,
            tuning: Tuning::Standard,
        }
    }
}

impl TunerConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Number of magnitude bins produced per frame.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}
