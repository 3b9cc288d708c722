//! # Tuning Session Module
//!
//! A [`TunerSession`] owns everything that persists between frames: the
//! frequency history, the active tuning table and the tolerance. Each call to
//! [`TunerSession::process`] runs one estimation + match cycle.

use crate::config::TunerConfig;
use crate::error::Result;
use crate::gauge::GaugeReading;
use crate::pitch::{estimate_frequency, FrequencyHistory, Spectrum};
use crate::tuning::{find_closest_note, ClosestNote, Tuning, TuningStatus};

/// Everything the UI needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Peak-bin frequency of this frame alone.
    pub raw_frequency: f32,
    /// Moving average the note was matched against.
    pub smoothed_frequency: f32,
    /// Table that was active for this frame.
    pub tuning: Tuning,
    pub closest: Option<ClosestNote>,
    pub status: Option<TuningStatus>,
    pub gauge: Option<GaugeReading>,
}

impl FrameReport {
    /// Name of the matched note, if any.
    pub fn note_name(&self) -> Option<&'static str> {
        self.closest.map(|c| c.note_name)
    }

    /// User-facing status line; `None` when no note matched.
    pub fn status_message(&self) -> Option<String> {
        let closest = self.closest?;
        let message = match self.status? {
            TuningStatus::InTune => format!(
                "In tune! {} ({:.1} Hz)",
                closest.note_name, self.smoothed_frequency
            ),
            TuningStatus::Sharp => "Out of tune: too high".to_string(),
            TuningStatus::Flat => "Out of tune: too low".to_string(),
        };
        Some(message)
    }
}

#[derive(Debug, Clone)]
pub struct TunerSession {
    history: FrequencyHistory,
    tuning: Tuning,
    tolerance: f32,
}

impl Default for TunerSession {
    fn default() -> Self {
        Self::new(&TunerConfig::default())
    }
}

impl TunerSession {
    pub fn new(config: &TunerConfig) -> Self {
        Self {
            history: FrequencyHistory::with_capacity(config.history_capacity),
            tuning: config.tuning,
            tolerance: config.tolerance_hz,
        }
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn history(&self) -> &FrequencyHistory {
        &self.history
    }

    /// Switches the active table. The frequency history is kept as is.
    pub fn select_tuning(&mut self, tuning: Tuning) {
        if tuning != self.tuning {
            log::info!("Tuning changed to {}", tuning);
        }
        self.tuning = tuning;
    }

    /// Runs one estimation + match cycle on a spectral snapshot.
    ///
    /// The raw peak frequency is pushed into the history, the history mean is
    /// matched against the active table and the deviation is classified with
    /// the session tolerance. The gauge reading uses the same tolerance.
    ///
    /// # Arguments
    /// * `spectrum` - Magnitude snapshot for this frame
    ///
    /// # Returns
    /// * `Ok(report)` - Frequencies, matched note, status and gauge reading
    /// * `Err(e)` - The snapshot was malformed; the history is unchanged
    pub fn process(&mut self, spectrum: &Spectrum) -> Result<FrameReport> {
        let estimate = estimate_frequency(&mut self.history, spectrum)?;
        let closest = find_closest_note(estimate.smoothed, self.tuning.table().notes);
        let status = closest.map(|c| c.status_with(self.tolerance));
        let gauge = closest.and_then(|c| {
            GaugeReading::new(estimate.smoothed, c.target_frequency, self.tolerance)
        });

        if closest.is_none() {
            log::warn!(
                "No reference pitch matched {:.2} Hz in {}",
                estimate.smoothed,
                self.tuning.id()
            );
        }

        Ok(FrameReport {
            raw_frequency: estimate.raw,
            smoothed_frequency: estimate.smoothed,
            tuning: self.tuning,
            closest,
            status,
            gauge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::GaugeColor;

    fn spectrum_with_peak(bin: usize) -> Spectrum {
        let mut magnitudes = vec![0.0; 2048];
        magnitudes[bin] = 255.0;
        Spectrum::new(magnitudes, 44_100)
    }

    #[test]
    fn messages_follow_status() {
        let mut report = FrameReport {
            raw_frequency: 261.63,
            smoothed_frequency: 261.63,
            tuning: Tuning::Standard,
            closest: find_closest_note(261.63, Tuning::Standard.table().notes),
            status: Some(TuningStatus::InTune),
            gauge: None,
        };
        assert_eq!(report.status_message().unwrap(), "In tune! C4 (261.6 Hz)");
        assert_eq!(report.note_name(), Some("C4"));

        report.status = Some(TuningStatus::Sharp);
        assert_eq!(report.status_message().unwrap(), "Out of tune: too high");
        report.status = Some(TuningStatus::Flat);
        assert_eq!(report.status_message().unwrap(), "Out of tune: too low");

        report.closest = None;
        assert_eq!(report.status_message(), None);
    }

    #[test]
    fn session_uses_configured_tolerance() {
        let config = TunerConfig { tolerance_hz: 2000.0, ..TunerConfig::default() };
        let mut session = TunerSession::new(&config);
        let report = session.process(&spectrum_with_peak(100)).unwrap();
        assert_eq!(report.status, Some(TuningStatus::InTune));
        assert_eq!(report.gauge.unwrap().color, GaugeColor::Green);
    }

    #[test]
    fn gauge_colour_agrees_with_status() {
        // 441 Hz peak (bin 10 of 1000 at 44.1 kHz): 1 Hz over A4 is sharp,
        // even though it is well under 1% of the target.
        let mut magnitudes = vec![0.0; 1000];
        magnitudes[10] = 255.0;
        let mut session = TunerSession::default();
        let report = session.process(&Spectrum::new(magnitudes, 44_100)).unwrap();

        let status = report.status.unwrap();
        assert_eq!(status, TuningStatus::Sharp);
        assert_eq!(report.gauge.unwrap().color, GaugeColor::from(status));
    }

    #[test]
    fn failed_frame_reports_error() {
        let mut session = TunerSession::default();
        assert!(session.process(&Spectrum::new(Vec::new(), 44_100)).is_err());
        assert!(session.history().is_empty());
    }
}
