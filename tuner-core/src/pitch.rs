//! # Pitch Detection Module
//!
//! This module turns a spectral snapshot into a smoothed fundamental-frequency
//! estimate. Detection is a plain peak pick: the loudest bin wins, its centre
//! frequency is pushed into a short FIFO history and the history mean is
//! reported.
//!
//! ## Features
//! - Deterministic peak search (first maximum wins on ties)
//! - Bin index to frequency conversion
//! - Fixed-capacity moving average over the most recent estimates
//!
//! Silence is not special-cased: an all-zero spectrum peaks at bin 0 and
//! contributes a 0 Hz estimate like any other frame.

use std::collections::VecDeque;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::error::{Result, TunerError};

/// One spectral magnitude snapshot, as produced by the analyser.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    magnitudes: Vec<f32>,
    sample_rate: u32,
    bin_count: usize,
}

impl Spectrum {
    /// Creates a snapshot whose bin count is the number of magnitudes.
    pub fn new(magnitudes: Vec<f32>, sample_rate: u32) -> Self {
        let bin_count = magnitudes.len();
        Self { magnitudes, sample_rate, bin_count }
    }

    /// Creates a snapshot from byte magnitudes (0-255), as delivered by a
    /// Web-Audio style analyser.
    pub fn from_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        Self::new(bytes.iter().map(|&b| f32::from(b)).collect(), sample_rate)
    }

    /// Overrides the bin count used for the bin-to-frequency conversion.
    pub fn with_bin_count(mut self, bin_count: usize) -> Self {
        self.bin_count = bin_count;
        self
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }
}

/// Returns the index of the largest magnitude.
///
/// The comparison is strictly greater-than, so the first of several equal
/// maxima wins and an all-zero spectrum yields bin 0.
///
/// # Arguments
/// * `magnitudes` - Non-negative magnitude per frequency bin
///
/// # Returns
/// * `Some(index)` - Index of the first maximum
/// * `None` - The spectrum has no bins
pub fn peak_bin(magnitudes: &[f32]) -> Option<usize> {
    let mut max_value = *magnitudes.first()?;
    let mut max_index = 0;
    for (i, &value) in magnitudes.iter().enumerate().skip(1) {
        if value > max_value {
            max_value = value;
            max_index = i;
        }
    }
    Some(max_index)
}

/// Converts a bin index to its frequency: `bin * sample_rate / bin_count`.
///
/// # Arguments
/// * `bin` - Bin index
/// * `sample_rate` - Sample rate in Hz of the analysed audio
/// * `bin_count` - Number of bins in the snapshot (must be non-zero)
pub fn bin_to_frequency(bin: usize, sample_rate: u32, bin_count: usize) -> f32 {
    bin as f32 * sample_rate as f32 / bin_count as f32
}

/// The most recent raw estimates, oldest first.
#[derive(Debug, Clone)]
pub struct FrequencyHistory {
    values: VecDeque<f32>,
    capacity: usize,
}

impl Default for FrequencyHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl FrequencyHistory {
    /// Creates an empty history. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { values: VecDeque::with_capacity(capacity + 1), capacity }
    }

    /// Appends an estimate, evicting the oldest one once over capacity.
    pub fn push(&mut self, frequency: f32) {
        self.values.push_back(frequency);
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Arithmetic mean of the current contents; `None` while empty.
    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f32>() / self.values.len() as f32)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }
}

/// Raw and smoothed frequency for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyEstimate {
    /// Centre frequency of this frame's peak bin.
    pub raw: f32,
    /// Mean of the history after `raw` was pushed.
    pub smoothed: f32,
}

/// Estimates the fundamental frequency of one spectral snapshot.
///
/// This function:
/// 1. Locates the peak bin of the snapshot
/// 2. Converts it to a raw frequency
/// 3. Pushes the raw frequency into `history`, evicting the oldest entry if full
/// 4. Returns the mean of the history as the smoothed frequency
///
/// Malformed snapshots are rejected before the history is touched.
///
/// # Arguments
/// * `history` - Moving-average window shared across frames
/// * `spectrum` - Magnitude snapshot for this frame
///
/// # Returns
/// * `Ok(estimate)` - Raw and smoothed frequency in Hz
/// * `Err(e)` - No bins, a bin count of zero or a sample rate of zero
pub fn estimate_frequency(
    history: &mut FrequencyHistory,
    spectrum: &Spectrum,
) -> Result<FrequencyEstimate> {
    if spectrum.bin_count == 0 {
        return Err(TunerError::ZeroBinCount);
    }
    if spectrum.sample_rate == 0 {
        return Err(TunerError::InvalidSampleRate(spectrum.sample_rate));
    }
    let bin = peak_bin(&spectrum.magnitudes).ok_or(TunerError::EmptySpectrum)?;

    let raw = bin_to_frequency(bin, spectrum.sample_rate, spectrum.bin_count);
    history.push(raw);
    let smoothed = history.mean().unwrap_or(raw);

    log::trace!("peak bin {} -> {:.2} Hz (smoothed {:.2} Hz)", bin, raw, smoothed);
    Ok(FrequencyEstimate { raw, smoothed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_maximum_wins() {
        assert_eq!(peak_bin(&[1.0, 5.0, 3.0, 5.0]), Some(1));
        assert_eq!(peak_bin(&[0.0; 8]), Some(0));
        assert_eq!(peak_bin(&[]), None);
    }

    #[test]
    fn bin_frequency_formula() {
        assert_eq!(bin_to_frequency(100, 44_100, 2048), 2153.3203);
        assert_eq!(bin_to_frequency(0, 44_100, 2048), 0.0);
    }

    #[test]
    fn history_evicts_oldest() {
        let mut history = FrequencyHistory::default();
        assert_eq!(history.mean(), None);
        for f in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
            history.push(f);
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(history.mean(), Some(40.0));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = FrequencyHistory::with_capacity(0);
        history.push(1.0);
        history.push(2.0);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.mean(), Some(2.0));
    }

    #[test]
    fn silence_is_a_zero_hz_sample() {
        // Known limitation: silence drags the average towards 0 Hz.
        let mut history = FrequencyHistory::default();
        let mut loud = vec![0.0; 2048];
        loud[100] = 200.0;
        estimate_frequency(&mut history, &Spectrum::new(loud, 44_100)).unwrap();

        let silent = Spectrum::new(vec![0.0; 2048], 44_100);
        let estimate = estimate_frequency(&mut history, &silent).unwrap();
        assert_eq!(estimate.raw, 0.0);
        assert_eq!(history.len(), 2);
        assert!((estimate.smoothed - 2153.3203 / 2.0).abs() < 1e-3);
    }

    #[test]
    fn malformed_snapshots_leave_history_alone() {
        let mut history = FrequencyHistory::default();
        let empty = Spectrum::new(Vec::new(), 44_100);
        assert!(matches!(
            estimate_frequency(&mut history, &empty),
            Err(TunerError::ZeroBinCount)
        ));
        let no_rate = Spectrum::new(vec![1.0, 2.0], 0);
        assert!(matches!(
            estimate_frequency(&mut history, &no_rate),
            Err(TunerError::InvalidSampleRate(0))
        ));
        let no_bins = Spectrum::new(Vec::new(), 44_100).with_bin_count(1024);
        assert!(matches!(
            estimate_frequency(&mut history, &no_bins),
            Err(TunerError::EmptySpectrum)
        ));
        assert!(history.is_empty());
    }

    #[test]
    fn byte_spectrum_uses_declared_bin_count() {
        let mut bytes = vec![0u8; 1024];
        bytes[10] = 255;
        let spectrum = Spectrum::from_bytes(&bytes, 48_000);
        assert_eq!(spectrum.bin_count(), 1024);

        let mut history = FrequencyHistory::default();
        let estimate = estimate_frequency(&mut history, &spectrum).unwrap();
        assert_eq!(estimate.raw, 10.0 * 48_000.0 / 1024.0);
    }
}
