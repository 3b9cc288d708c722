//! # Error Module
//!
//! Error types shared by the analysis pipeline and the capture layer.

use thiserror::Error;

/// Convenience alias used throughout `tuner-core`.
pub type Result<T> = std::result::Result<T, TunerError>;

#[derive(Error, Debug)]
pub enum TunerError {
    // --- Spectrum snapshot errors ---
    #[error("Spectrum snapshot contains no bins")]
    EmptySpectrum,
    #[error("Spectrum snapshot declares a bin count of zero")]
    ZeroBinCount,
    #[error("Invalid sample rate for frequency estimation: {0}")]
    InvalidSampleRate(u32),
    #[error("Audio frame has {actual} samples, expected {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    // --- Tuning selection errors ---
    #[error("Unknown tuning table: {0}")]
    UnknownTuning(String),

    // --- Capture acquisition errors ---
    #[error("No audio input device available")]
    NoInputDevice,
    #[error("No mono f32 input format is supported by the input device")]
    UnsupportedInputFormat,
    #[error("Failed to read input device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),
    #[error("Failed to query input device configurations: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),
    #[error("Failed to open audio input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("Failed to start audio input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}
