// tuner-core/src/lib.rs

//! The core logic for the instrument tuner.
//! This crate turns microphone spectra into a smoothed pitch estimate, matches
//! it against the active tuning table and classifies the deviation. It is
//! completely headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod fft;
pub mod gauge;
pub mod pitch;
pub mod session;
pub mod tuning;

pub use config::TunerConfig;
pub use error::{Result, TunerError};
pub use pitch::Spectrum;
pub use session::{FrameReport, TunerSession};
pub use tuning::{Tuning, TuningStatus};
