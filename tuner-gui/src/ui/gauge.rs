//! # Gauge Widget
//!
//! Half-dial deviation gauge. The needle geometry comes from
//! `tuner_core::gauge`; this widget only draws it.

use iced::widget::canvas::{self, path::Arc, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Radians, Rectangle, Renderer, Theme};
use std::f32::consts::PI;
use tuner_core::gauge::{GaugeColor, GaugeReading};

const DIAL_RADIUS: f32 = 100.0;
const NEEDLE_LENGTH: f32 = 80.0;

/// Screen colour for a needle colour class.
pub fn gauge_color(color: GaugeColor) -> Color {
    let (r, g, b) = color.rgb8();
    Color::from_rgb8(r, g, b)
}

pub struct Gauge {
    /// Current reading (None if no note matched)
    reading: Option<GaugeReading>,
}

impl Gauge {
    pub fn new(reading: Option<GaugeReading>) -> Self {
        Self { reading }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fixed(300.0))
                .height(iced::Length::Fixed(160.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for Gauge {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let center = Point::new(bounds.width / 2.0, bounds.height - 30.0);

        // Dial background
        let dial = Path::new(|builder| {
            builder.arc(Arc {
                center,
                radius: DIAL_RADIUS,
                start_angle: Radians(PI),
                end_angle: Radians(2.0 * PI),
            });
        });
        frame.stroke(
            &dial,
            Stroke::default()
                .with_width(15.0)
                .with_color(Color::from_rgb8(0xDD, 0xDD, 0xDD)),
        );

        if let Some(reading) = self.reading {
            let (x, y) = reading.needle_tip((center.x, center.y), NEEDLE_LENGTH);
            let needle = Path::line(center, Point::new(x, y));
            frame.stroke(
                &needle,
                Stroke::default()
                    .with_width(5.0)
                    .with_color(gauge_color(reading.color)),
            );
        }

        vec![frame.into_geometry()]
    }
}
