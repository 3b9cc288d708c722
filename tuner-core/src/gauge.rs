//! # Gauge Module
//!
//! Geometry for the deviation gauge: a needle on a half dial, swinging up to
//! `0.4π` either side of upright (an `0.8π` sweep in total), proportional to
//! the relative deviation from the target.
//!
//! The needle colour follows the same tolerance rule as the tuning status, so
//! the gauge and the status line always agree.

use std::f32::consts::PI;

use crate::tuning::{classify, TuningStatus};

/// Total angle covered by the needle, from fully flat to fully sharp.
pub const GAUGE_SWEEP: f32 = 0.8 * PI;

/// Needle deflection from upright at a relative deviation of ±100%.
pub const GAUGE_MAX_DEFLECTION: f32 = GAUGE_SWEEP / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeColor {
    Green,
    /// Sharp.
    Orange,
    /// Flat.
    Red,
}

impl GaugeColor {
    pub fn rgb8(self) -> (u8, u8, u8) {
        match self {
            GaugeColor::Green => (0x34, 0xDB, 0x98),
            GaugeColor::Orange => (0xFF, 0xA5, 0x00),
            GaugeColor::Red => (0xFF, 0x33, 0x33),
        }
    }
}

impl From<TuningStatus> for GaugeColor {
    fn from(status: TuningStatus) -> Self {
        match status {
            TuningStatus::InTune => GaugeColor::Green,
            TuningStatus::Sharp => GaugeColor::Orange,
            TuningStatus::Flat => GaugeColor::Red,
        }
    }
}

/// Needle position for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeReading {
    /// `(detected - target) / target`, unclamped.
    pub ratio: f32,
    /// Radians from upright, positive towards sharp, within `±GAUGE_MAX_DEFLECTION`.
    pub angle: f32,
    pub color: GaugeColor,
}

impl GaugeReading {
    /// Computes the needle position and colour for a detected frequency.
    ///
    /// The relative deviation is clamped to [-1, 1] before being scaled onto
    /// the sweep, so the needle never leaves the upper half of the dial.
    ///
    /// # Arguments
    /// * `detected` - Smoothed detected frequency in Hz
    /// * `target` - Target frequency of the matched note in Hz
    /// * `tolerance` - Half-width of the "in tune" band in Hz
    ///
    /// # Returns
    /// * `Some(reading)` - Needle angle, ratio and colour
    /// * `None` - The target is not a positive frequency or `detected` is not finite
    pub fn new(detected: f32, target: f32, tolerance: f32) -> Option<Self> {
        if !(target > 0.0) || !detected.is_finite() {
            return None;
        }
        let deviation = detected - target;
        let ratio = deviation / target;
        let angle = GAUGE_MAX_DEFLECTION * ratio.clamp(-1.0, 1.0);
        let color = GaugeColor::from(classify(deviation, tolerance));
        Some(Self { ratio, angle, color })
    }

    /// End point of a needle of `length` pivoting at `center` (y grows downwards).
    pub fn needle_tip(&self, center: (f32, f32), length: f32) -> (f32, f32) {
        (
            center.0 + self.angle.sin() * length,
            center.1 - self.angle.cos() * length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::TUNING_TOLERANCE_HZ;

    fn reading(detected: f32, target: f32) -> GaugeReading {
        GaugeReading::new(detected, target, TUNING_TOLERANCE_HZ).unwrap()
    }

    #[test]
    fn on_target_points_upright() {
        let on_target = reading(440.0, 440.0);
        assert_eq!(on_target.angle, 0.0);
        assert_eq!(on_target.color, GaugeColor::Green);
        assert_eq!(on_target.needle_tip((100.0, 150.0), 80.0), (100.0, 70.0));
    }

    #[test]
    fn colour_follows_tolerance_boundary() {
        assert_eq!(reading(440.5, 440.0).color, GaugeColor::Green);
        assert_eq!(reading(439.5, 440.0).color, GaugeColor::Green);
        assert_eq!(reading(441.0, 440.0).color, GaugeColor::Orange);
        assert_eq!(reading(439.0, 440.0).color, GaugeColor::Red);
        // 2 Hz sharp is under 1% of A4 but still out of tune.
        assert_eq!(reading(442.0, 440.0).color, GaugeColor::Orange);
    }

    #[test]
    fn colour_matches_status_mapping() {
        for deviation in [-3.0, -1.0, -0.5, 0.0, 0.999, 1.0, 25.0] {
            let status = classify(deviation, TUNING_TOLERANCE_HZ);
            assert_eq!(reading(440.0 + deviation, 440.0).color, GaugeColor::from(status));
        }
    }

    #[test]
    fn angle_stays_inside_sweep() {
        let pivot = (150.0, 130.0);

        let far_sharp = reading(2153.32, 440.0);
        assert!(far_sharp.ratio > 3.0);
        assert_eq!(far_sharp.angle, GAUGE_MAX_DEFLECTION);

        let silent = reading(0.0, 261.63);
        assert_eq!(silent.angle, -GAUGE_MAX_DEFLECTION);
        assert_eq!(far_sharp.angle - silent.angle, GAUGE_SWEEP);

        for extreme in [far_sharp, silent] {
            let (_, tip_y) = extreme.needle_tip(pivot, 80.0);
            assert!(tip_y <= pivot.1, "needle dropped below the pivot: {}", tip_y);
            assert!(tip_y >= pivot.1 - 80.0);
        }
        assert!(silent.needle_tip(pivot, 80.0).0 < pivot.0);
        assert!(far_sharp.needle_tip(pivot, 80.0).0 > pivot.0);
    }

    #[test]
    fn degenerate_target_has_no_reading() {
        assert_eq!(GaugeReading::new(440.0, 0.0, TUNING_TOLERANCE_HZ), None);
        assert_eq!(GaugeReading::new(f32::NAN, 440.0, TUNING_TOLERANCE_HZ), None);
    }
}
