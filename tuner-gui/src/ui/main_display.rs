//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the tuner: table selector, note readout, status line and gauge.

use iced::widget::{column, container, pick_list, row, text, Space};
use iced::{Alignment, Color, Element, Length};
use tuner_core::gauge::GaugeColor;
use tuner_core::Tuning;

use super::gauge::{self, gauge_color};

/// Creates the complete main application view
pub fn create_main_view(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    let title = text("Tuner").size(28);

    let selector = row![
        text("Tuning").size(16),
        Space::with_width(10),
        pick_list(Tuning::ALL, Some(data.tuning), crate::Message::TuningSelected),
    ]
    .align_y(Alignment::Center);

    let content = match &data.capture_state {
        crate::CaptureState::Failed(_) => column![create_status_line(data)],
        _ => column![
            create_note_panel(data),
            Space::with_height(10),
            gauge::Gauge::new(data.last_report.as_ref().and_then(|r| r.gauge)).view(),
            Space::with_height(10),
            create_status_line(data),
        ],
    }
    .align_x(Alignment::Center);

    let main_content = column![
        title,
        Space::with_height(20),
        selector,
        Space::with_height(20),
        content,
    ]
        .align_x(Alignment::Center)
        .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

/// Matched note plus smoothed and target frequencies.
fn create_note_panel(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    let (note_name, freq_text) = match &data.last_report {
        Some(report) => {
            let target = report
                .closest
                .map(|c| format!(" / {:.2} Hz", c.target_frequency))
                .unwrap_or_default();
            (
                report.note_name().unwrap_or("--"),
                format!("{:.2} Hz{}", report.smoothed_frequency, target),
            )
        }
        None => ("--", "0.00 Hz".to_string()),
    };

    column![text(note_name).size(64), text(freq_text).size(18)]
        .align_x(Alignment::Center)
        .into()
}

fn create_status_line(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    text(data.status_text.clone()).size(20).color(status_color(data)).into()
}

/// Text colour for the status line, shared with the gauge needle.
fn status_color(data: &crate::AppDisplayData) -> Color {
    if let crate::CaptureState::Failed(_) = data.capture_state {
        return gauge_color(GaugeColor::Red);
    }
    match data.last_report.as_ref().and_then(|r| r.status) {
        Some(status) => gauge_color(GaugeColor::from(status)),
        None => Color::WHITE,
    }
}
