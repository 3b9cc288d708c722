//! # Fast Fourier Transform (FFT) Module
//!
//! This module turns raw microphone frames into the byte-magnitude spectra the
//! frequency estimator consumes. It mirrors what a browser `AnalyserNode`
//! does for `getByteFrequencyData`.
//!
//! ## Features
//! - High-performance FFT using RustFFT, planned once per analyser
//! - DC offset removal and Blackman windowing
//! - Exponential smoothing of magnitudes between frames
//! - Decibel to byte (0-255) mapping

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::pitch::Spectrum;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Blackman window (alpha = 0.16) to the buffer in place.
fn apply_blackman_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 { return; }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let phase = 2.0 * std::f32::consts::PI * i as f32 / n_minus_1;
        let multiplier = 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos();
        *sample *= multiplier;
    }
}

/// Performs a forward FFT on a frame with a one-off plan.
///
/// The frame is DC-corrected and windowed first. Use [`SpectrumAnalyser`]
/// for repeated analysis at a fixed size.
pub fn perform_fft(signal: &[f32]) -> Vec<Complex<f32>> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(signal.len());
    transform(fft.as_ref(), signal)
}

fn transform(fft: &dyn Fft<f32>, signal: &[f32]) -> Vec<Complex<f32>> {
    let mut processed_signal = signal.to_vec();
    remove_dc_offset(&mut processed_signal);
    apply_blackman_window(&mut processed_signal);

    let mut buffer: Vec<Complex<f32>> = processed_signal
        .into_iter()
        .map(|sample| Complex { re: sample, im: 0.0 })
        .collect();

    fft.process(&mut buffer);
    buffer
}

/// Returns the normalised magnitudes of the first half of a complex spectrum.
///
/// Only bins below Nyquist are kept, each divided by the transform length.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f32>]) -> Vec<f32> {
    let n = spectrum.len().max(1) as f32;
    spectrum
        .iter()
        .take(spectrum.len() / 2)
        .map(|c| c.norm() / n) // .norm() is sqrt(re^2 + im^2)
        .collect()
}

/// Maps linear magnitudes onto bytes through a decibel window.
///
/// `min_db` maps to 0 and `max_db` to 255; values outside are clamped and
/// silent bins (magnitude 0) map to 0.
///
/// # Arguments
/// * `magnitudes` - Linear magnitude spectrum
/// * `min_db` - Level mapped to byte 0
/// * `max_db` - Level mapped to byte 255
///
/// # Returns
/// * `Vec<u8>` - One byte per bin, preserving the ordering of the magnitudes
pub fn magnitudes_to_bytes(magnitudes: &[f32], min_db: f32, max_db: f32) -> Vec<u8> {
    let range = max_db - min_db;
    magnitudes
        .iter()
        .map(|&magnitude| {
            let db = 20.0 * magnitude.log10();
            if !db.is_finite() || range <= 0.0 {
                return 0;
            }
            let scaled = 255.0 * (db - min_db) / range;
            scaled.clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Reusable analyser producing one [`Spectrum`] per audio frame.
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new(config: &TunerConfig) -> Self {
        let fft_size = config.fft_size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        Self {
            fft,
            fft_size,
            smoothing: config.smoothing.clamp(0.0, 1.0),
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Analyses one frame of exactly `fft_size` samples.
    ///
    /// The frame goes through DC removal, windowing and the FFT. Its
    /// magnitudes are blended into the running smoothed spectrum, and that
    /// spectrum is mapped onto bytes.
    ///
    /// # Arguments
    /// * `frame` - Raw audio samples
    /// * `sample_rate` - Sample rate in Hz the frame was captured at
    ///
    /// # Returns
    /// * `Ok(spectrum)` - `fft_size / 2` byte-valued bins
    /// * `Err(e)` - The frame length does not match `fft_size`
    pub fn analyse(&mut self, frame: &[f32], sample_rate: u32) -> Result<Spectrum> {
        if frame.len() != self.fft_size {
            return Err(TunerError::FrameSizeMismatch {
                expected: self.fft_size,
                actual: frame.len(),
            });
        }

        let complex_spectrum = transform(self.fft.as_ref(), frame);
        let magnitudes = spectrum_to_magnitudes(&complex_spectrum);

        let tau = self.smoothing;
        for (previous, current) in self.smoothed.iter_mut().zip(magnitudes) {
            let next = tau * *previous + (1.0 - tau) * current;
            *previous = if next.is_finite() { next } else { 0.0 };
        }

        let bytes = magnitudes_to_bytes(&self.smoothed, self.min_decibels, self.max_decibels);
        Ok(Spectrum::from_bytes(&bytes, sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::peak_bin;

    fn sine(bin: usize, fft_size: usize, amplitude: f32) -> Vec<f32> {
        (0..fft_size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * bin as f32 * i as f32 / fft_size as f32;
                amplitude * phase.sin()
            })
            .collect()
    }

    #[test]
    fn fft_peak_lands_on_tone_bin() {
        let spectrum = perform_fft(&sine(64, 1024, 0.5));
        let magnitudes = spectrum_to_magnitudes(&spectrum);
        assert_eq!(magnitudes.len(), 512);
        assert_eq!(peak_bin(&magnitudes), Some(64));
    }

    #[test]
    fn byte_mapping_clamps_to_window() {
        let bytes = magnitudes_to_bytes(&[0.0, 1e-6, 1e-3, 1.0], -100.0, -30.0);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 0); // -120 dB
        assert_eq!(bytes[2], 145); // -60 dB
        assert_eq!(bytes[3], 255); // 0 dB
    }

    #[test]
    fn analyser_rejects_wrong_frame_size() {
        let mut analyser = SpectrumAnalyser::new(&TunerConfig::default());
        assert!(matches!(
            analyser.analyse(&[0.0; 100], 44_100),
            Err(TunerError::FrameSizeMismatch { expected: 2048, actual: 100 })
        ));
    }

    #[test]
    fn analyser_spectrum_peaks_at_tone() {
        let config = TunerConfig { smoothing: 0.0, ..TunerConfig::default() };
        let mut analyser = SpectrumAnalyser::new(&config);
        // Quiet enough that neighbouring bins stay below the clamp at 255.
        let spectrum = analyser.analyse(&sine(20, 2048, 0.01), 44_100).unwrap();
        assert_eq!(spectrum.bin_count(), 1024);
        assert_eq!(peak_bin(spectrum.magnitudes()), Some(20));
    }

    #[test]
    fn silence_maps_to_all_zero_bytes() {
        let mut analyser = SpectrumAnalyser::new(&TunerConfig::default());
        let spectrum = analyser.analyse(&[0.0; 2048], 44_100).unwrap();
        assert!(spectrum.magnitudes().iter().all(|&m| m == 0.0));
    }
}
