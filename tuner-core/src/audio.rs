//! # Audio Capture Module
//!
//! This module acquires the microphone using CPAL (Cross-Platform Audio Library)
//! and streams fixed-size frames to the tuning loop.
//!
//! Acquisition happens once. Any failure here is terminal for the session: the
//! caller reports it and the tuning loop is never started.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};

/// Starts audio capture from the default input device.
///
/// Callback data is accumulated and cut into frames of `config.fft_size`
/// samples, which are sent over `sender`. Frames are dropped if the channel is
/// full. The returned stream must be kept alive for capture to continue.
///
/// # Arguments
/// * `sender` - Channel sender for streaming frames to the tuning loop
/// * `config` - Supplies the frame size and the preferred sample rate
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and the actual sample rate
/// * `Err(e)` - Acquisition failed (no device, no usable format, stream error)
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    config: &TunerConfig,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(TunerError::NoInputDevice)?;

    log::info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, config.sample_rate)
        .ok_or(TunerError::UnsupportedInputFormat)?;

    let sample_rate = clamp_sample_rate(&supported_config, config.sample_rate);
    let stream_config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();

    log::info!("Selected sample rate: {} Hz", sample_rate);

    let frame_size = config.fft_size;
    let mut audio_buffer = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            audio_buffer.extend_from_slice(data);

            while audio_buffer.len() >= frame_size {
                let frame: Vec<f32> = audio_buffer.drain(..frame_size).collect();
                let _ = sender.try_send(frame);
            }
        },
        |err| log::error!("An error occurred on the audio stream: {}", err),
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the mono f32 configuration whose rate range lies closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate) {
                0
            } else {
                min_diff.min(max_diff)
            }
        })
}

/// The target rate if the range supports it, otherwise the nearest bound.
fn clamp_sample_rate(range: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(range.min_sample_rate().0, range.max_sample_rate().0)
}
