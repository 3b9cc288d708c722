//! # Frame Driver Module
//!
//! The tuning loop, made explicit. A [`TunerDriver`] pulls one spectrum from a
//! [`SpectrumSource`], runs it through its [`TunerSession`], hands the report
//! to a [`FrameSink`] and then waits on its [`Clock`] before the next cycle.
//! Cycles never overlap.
//!
//! Sources, clocks and sinks are traits so tests can drive the loop with
//! synthetic frames and no real time passing.

use crossbeam_channel::{Receiver, RecvError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::TunerConfig;
use crate::error::Result;
use crate::fft::SpectrumAnalyser;
use crate::pitch::Spectrum;
use crate::session::{FrameReport, TunerSession};
use crate::tuning::Tuning;

/// Paces the loop between cycles.
pub trait Clock {
    /// Blocks until the next cycle may start.
    fn wait_for_next_frame(&mut self);
}

/// Yields spectral snapshots, one per cycle.
pub trait SpectrumSource {
    /// `None` means the source is exhausted and the loop should stop.
    fn next_spectrum(&mut self) -> Option<Spectrum>;
}

/// Receives the result of every successful cycle.
pub trait FrameSink {
    fn on_frame(&mut self, report: &FrameReport);
}

impl<F: FnMut(&FrameReport)> FrameSink for F {
    fn on_frame(&mut self, report: &FrameReport) {
        self(report)
    }
}

/// Fixed-rate clock, roughly an animation-frame callback.
///
/// Sleeps only for what is left of the interval since the previous tick.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl IntervalClock {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_tick: None }
    }
}

impl Clock for IntervalClock {
    fn wait_for_next_frame(&mut self) {
        if let Some(last) = self.last_tick {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last_tick = Some(Instant::now());
    }
}

/// Replays a fixed sequence of spectra.
pub struct ReplaySource<I> {
    frames: I,
}

impl<I: Iterator<Item = Spectrum>> ReplaySource<I> {
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self { frames: frames.into_iter() }
    }
}

impl<I: Iterator<Item = Spectrum>> SpectrumSource for ReplaySource<I> {
    fn next_spectrum(&mut self) -> Option<Spectrum> {
        self.frames.next()
    }
}

/// Turns raw audio frames from a capture channel into spectra.
///
/// Frames that fail analysis are logged and skipped. The source is exhausted
/// once every sender has been dropped.
pub struct AudioFrameSource {
    receiver: Receiver<Vec<f32>>,
    analyser: SpectrumAnalyser,
    sample_rate: u32,
}

impl AudioFrameSource {
    pub fn new(receiver: Receiver<Vec<f32>>, sample_rate: u32, config: &TunerConfig) -> Self {
        Self { receiver, analyser: SpectrumAnalyser::new(config), sample_rate }
    }
}

impl SpectrumSource for AudioFrameSource {
    fn next_spectrum(&mut self) -> Option<Spectrum> {
        loop {
            let mut frame = match self.receiver.recv() {
                Ok(frame) => frame,
                Err(RecvError) => {
                    log::info!("Audio frame channel closed");
                    return None;
                }
            };
            // Only the newest frame matters if the loop fell behind.
            while let Ok(newer) = self.receiver.try_recv() {
                frame = newer;
            }
            match self.analyser.analyse(&frame, self.sample_rate) {
                Ok(spectrum) => return Some(spectrum),
                Err(e) => log::warn!("Skipping audio frame: {}", e),
            }
        }
    }
}

/// Requests accepted by a running driver between cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverCommand {
    SelectTuning(Tuning),
    Shutdown,
}

pub struct TunerDriver<S, C> {
    session: TunerSession,
    source: S,
    clock: C,
    commands: Option<Receiver<DriverCommand>>,
}

impl<S: SpectrumSource, C: Clock> TunerDriver<S, C> {
    pub fn new(session: TunerSession, source: S, clock: C) -> Self {
        Self { session, source, clock, commands: None }
    }

    /// Attaches a command channel, polled before every cycle.
    pub fn with_commands(mut self, commands: Receiver<DriverCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn session(&self) -> &TunerSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TunerSession {
        &mut self.session
    }

    /// Runs a single cycle without consulting the clock or the command channel.
    ///
    /// # Returns
    /// * `None` - The source is exhausted
    /// * `Some(Ok(report))` - The frame was estimated and matched
    /// * `Some(Err(e))` - The frame was malformed and skipped by the session
    pub fn step(&mut self) -> Option<Result<FrameReport>> {
        let spectrum = self.source.next_spectrum()?;
        Some(self.session.process(&spectrum))
    }

    /// Applies pending commands. Returns `false` once shutdown was requested.
    fn apply_commands(&mut self) -> bool {
        let Some(commands) = &self.commands else {
            return true;
        };
        loop {
            match commands.try_recv() {
                Ok(DriverCommand::SelectTuning(tuning)) => self.session.select_tuning(tuning),
                Ok(DriverCommand::Shutdown) => return false,
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("Command channel closed, continuing without commands");
                    self.commands = None;
                    return true;
                }
            }
        }
    }

    /// Runs cycles until the source is exhausted or shutdown is requested.
    ///
    /// Pending commands are applied before each cycle and the clock is waited
    /// on after it, so a tuning change takes effect on the next frame. Failed
    /// frames are logged and skipped.
    ///
    /// # Arguments
    /// * `sink` - Receives every successful report, in frame order
    ///
    /// # Returns
    /// * Number of frames delivered to the sink
    pub fn run<K: FrameSink>(&mut self, sink: &mut K) -> usize {
        log::info!("Tuning loop started ({})", self.session.tuning());
        let mut delivered = 0;
        while self.apply_commands() {
            match self.step() {
                None => break,
                Some(Ok(report)) => {
                    log::debug!(
                        "{:.2} Hz -> {:?} ({:?})",
                        report.smoothed_frequency,
                        report.note_name(),
                        report.status
                    );
                    sink.on_frame(&report);
                    delivered += 1;
                }
                Some(Err(e)) => log::warn!("Frame skipped: {}", e),
            }
            self.clock.wait_for_next_frame();
        }
        log::info!("Tuning loop stopped after {} frames", delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[derive(Default)]
    struct CountingClock {
        ticks: usize,
    }

    impl Clock for CountingClock {
        fn wait_for_next_frame(&mut self) {
            self.ticks += 1;
        }
    }

    fn peak(bin: usize) -> Spectrum {
        let mut magnitudes = vec![0.0; 1024];
        magnitudes[bin] = 200.0;
        Spectrum::new(magnitudes, 44_100)
    }

    #[test]
    fn malformed_frames_are_skipped_not_fatal() {
        let frames = vec![peak(10), Spectrum::new(Vec::new(), 44_100), peak(10)];
        let mut driver = TunerDriver::new(
            TunerSession::default(),
            ReplaySource::new(frames),
            CountingClock::default(),
        );
        let mut seen = 0;
        let delivered = driver.run(&mut |_: &FrameReport| seen += 1);
        assert_eq!(delivered, 2);
        assert_eq!(seen, 2);
        assert_eq!(driver.clock.ticks, 3);
        assert_eq!(driver.session().history().len(), 2);
    }

    #[test]
    fn shutdown_command_stops_before_next_cycle() {
        let (tx, rx) = unbounded();
        tx.send(DriverCommand::Shutdown).unwrap();
        let mut driver = TunerDriver::new(
            TunerSession::default(),
            ReplaySource::new(vec![peak(10)]),
            CountingClock::default(),
        )
        .with_commands(rx);
        assert_eq!(driver.run(&mut |_: &FrameReport| {}), 0);
    }

    #[test]
    fn select_tuning_command_applies_from_next_frame() {
        let (tx, rx) = unbounded();
        let frames = vec![peak(10), peak(10), peak(10), peak(10)];
        let mut driver = TunerDriver::new(
            TunerSession::default(),
            ReplaySource::new(frames),
            CountingClock::default(),
        )
        .with_commands(rx);

        let mut seen = Vec::new();
        let delivered = driver.run(&mut |report: &FrameReport| {
            if seen.len() == 1 {
                tx.send(DriverCommand::SelectTuning(Tuning::DTuning)).unwrap();
            }
            seen.push(report.tuning);
        });

        assert_eq!(delivered, 4);
        assert_eq!(
            seen,
            vec![Tuning::Standard, Tuning::Standard, Tuning::DTuning, Tuning::DTuning]
        );
        assert_eq!(driver.session().tuning(), Tuning::DTuning);
        assert_eq!(driver.session().history().len(), 4);
    }

    #[test]
    fn audio_source_ends_when_capture_hangs_up() {
        let (tx, rx) = unbounded();
        tx.send(vec![0.0; 2048]).unwrap();
        tx.send(vec![0.0; 7]).unwrap();
        drop(tx);
        let mut source = AudioFrameSource::new(rx, 44_100, &TunerConfig::default());
        // Both frames were queued; only the newest is analysed, and it is malformed.
        assert_eq!(source.next_spectrum(), None);
    }

    #[test]
    fn interval_clock_waits_for_remaining_time() {
        let mut clock = IntervalClock::new(Duration::from_millis(20));
        let start = Instant::now();
        clock.wait_for_next_frame();
        clock.wait_for_next_frame();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
