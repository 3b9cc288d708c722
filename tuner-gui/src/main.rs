//! # Tuner - Instrument Tuner GUI
//!
//! This module contains the desktop shell of the tuner. It owns the microphone,
//! the tuning-table selector and the display; all analysis lives in `tuner-core`.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Tuning Thread**: Acquires the microphone once, then runs the core frame loop
//! - **Communication**: Crossbeam channels (reports out, commands in)
//! - **Updates**: 60 FPS polling via subscription

mod ui;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use iced::{Element, Subscription, Theme};
use std::thread;
use tuner_core::{
    audio,
    driver::{AudioFrameSource, DriverCommand, IntervalClock, TunerDriver},
    FrameReport, TunerConfig, TunerSession, Tuning,
};
use ui::main_display::create_main_view;

pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting tuner...");
    let result = iced::application("Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    log::info!("Application finished with result: {:?}", result);
    result
}

#[derive(Debug, Clone)]
pub enum Message {
    TuningSelected(Tuning), // User picked a table in the dropdown
    Tick,                   // Timer tick for real-time updates
}

/// Events sent from the tuning thread to the GUI.
#[derive(Debug)]
enum WorkerEvent {
    Ready,
    Frame(FrameReport),
    CaptureFailed(String),
    Stopped,
}

/// Microphone lifecycle as seen by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Starting,
    Listening,
    /// Terminal: the tuning loop never started.
    Failed(String),
    Stopped,
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub capture_state: CaptureState,
    pub tuning: Tuning,
    pub last_report: Option<FrameReport>,
    pub status_text: String,
}

struct TunerApp {
    events: Receiver<WorkerEvent>,
    commands: Sender<DriverCommand>,
    display_data: AppDisplayData,
}

impl Default for TunerApp {
    fn default() -> Self {
        let config = TunerConfig::default();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (command_tx, command_rx) = crossbeam_channel::unbounded();

        spawn_tuning_thread(config.clone(), event_tx, command_rx);

        Self {
            events: event_rx,
            commands: command_tx,
            display_data: AppDisplayData {
                capture_state: CaptureState::Starting,
                tuning: config.tuning,
                last_report: None,
                status_text: "Waiting for microphone...".to_string(),
            },
        }
    }
}

impl Drop for TunerApp {
    fn drop(&mut self) {
        let _ = self.commands.send(DriverCommand::Shutdown);
    }
}

impl TunerApp {
    fn update(&mut self, message: Message) {
        match message {
            Message::TuningSelected(tuning) => {
                self.display_data.tuning = tuning;
                self.display_data.status_text = format!("Tuning changed to {}", tuning);
                if self.commands.send(DriverCommand::SelectTuning(tuning)).is_err() {
                    log::warn!("Tuning thread is gone; selection not applied");
                }
            }
            Message::Tick => {
                while let Ok(event) = self.events.try_recv() {
                    self.process_event(event);
                }
            }
        }
    }

    fn process_event(&mut self, event: WorkerEvent) {
        let data = &mut self.display_data;
        match event {
            WorkerEvent::Ready => {
                data.capture_state = CaptureState::Listening;
                data.status_text = "Microphone ready - play a string".to_string();
            }
            WorkerEvent::Frame(report) => {
                if let Some(message) = report.status_message() {
                    data.status_text = message;
                }
                data.last_report = Some(report);
            }
            WorkerEvent::CaptureFailed(reason) => {
                data.status_text = format!("Microphone error: {}", reason);
                data.capture_state = CaptureState::Failed(reason);
            }
            WorkerEvent::Stopped => {
                data.capture_state = CaptureState::Stopped;
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Returns a timer subscription that fires every 16ms (60 FPS).
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Starts the thread that owns the microphone and the frame loop.
///
/// The stream lives on this thread for as long as the loop runs.
fn spawn_tuning_thread(
    config: TunerConfig,
    events: Sender<WorkerEvent>,
    commands: Receiver<DriverCommand>,
) {
    thread::spawn(move || {
        log::info!("[TUNING-THREAD] Starting...");
        if let Err(e) = run_tuning_loop(&config, &events, commands) {
            log::error!("[TUNING-THREAD] {:#}", e);
            let _ = events.send(WorkerEvent::CaptureFailed(format!("{:#}", e)));
            return;
        }
        let _ = events.send(WorkerEvent::Stopped);
        log::info!("[TUNING-THREAD] Finished");
    });
}

fn run_tuning_loop(
    config: &TunerConfig,
    events: &Sender<WorkerEvent>,
    commands: Receiver<DriverCommand>,
) -> anyhow::Result<()> {
    let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);
    let (stream, sample_rate) = audio::start_audio_capture(raw_audio_tx, config)
        .context("could not access the microphone")?;
    let _ = events.send(WorkerEvent::Ready);

    let source = AudioFrameSource::new(raw_audio_rx, sample_rate, config);
    let clock = IntervalClock::new(config.frame_interval());
    let mut driver =
        TunerDriver::new(TunerSession::new(config), source, clock).with_commands(commands);

    driver.run(&mut |report: &FrameReport| {
        let _ = events.send(WorkerEvent::Frame(report.clone()));
    });

    drop(stream);
    Ok(())
}
