//! # Musical Tuning Module
//!
//! This module holds the built-in tuning tables and the note matcher that maps a
//! detected frequency onto the closest reference pitch of the active table.
//!
//! ## Features
//! - Three fixed four-string tables (standard, C tuning, D tuning)
//! - Nearest-note search with a deterministic first-wins tie policy
//! - Signed deviation in Hz and in/sharp/flat classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TunerError;

/// Half-width of the "in tune" band in Hz. The comparison is strict.
pub const TUNING_TOLERANCE_HZ: f32 = 1.0;

/// A single reference pitch of a tuning table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Note name (e.g., "A4", "F#4")
    pub name: &'static str,
    /// Frequency in Hz
    pub frequency: f32,
}

const fn note(name: &'static str, frequency: f32) -> Note {
    Note { name, frequency }
}

/// A named, immutable set of reference pitches.
///
/// The order of `notes` is significant: it decides which entry wins when two
/// targets are equally close to the detected frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningTable {
    pub id: &'static str,
    pub label: &'static str,
    pub notes: &'static [Note],
}

static STANDARD: TuningTable = TuningTable {
    id: "standard",
    label: "Standard (G C E A)",
    notes: &[
        note("G4", 392.00),
        note("C4", 261.63),
        note("E4", 329.63),
        note("A4", 440.00),
    ],
};

static C_TUNING: TuningTable = TuningTable {
    id: "c-tuning",
    label: "Low G (G3 C E A)",
    notes: &[
        note("G3", 196.00),
        note("C4", 261.63),
        note("E4", 329.63),
        note("A4", 440.00),
    ],
};

static D_TUNING: TuningTable = TuningTable {
    id: "d-tuning",
    label: "D tuning (A D F# B)",
    notes: &[
        note("A4", 440.00),
        note("D4", 293.66),
        note("F#4", 369.99),
        note("B4", 493.88),
    ],
};

/// Selects one of the built-in tuning tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tuning {
    #[default]
    Standard,
    /// Alternate low-string tuning.
    CTuning,
    /// Alternate drop tuning.
    DTuning,
}

impl Tuning {
    /// All built-in tunings in menu order.
    pub const ALL: [Tuning; 3] = [Tuning::Standard, Tuning::CTuning, Tuning::DTuning];

    pub fn table(self) -> &'static TuningTable {
        match self {
            Tuning::Standard => &STANDARD,
            Tuning::CTuning => &C_TUNING,
            Tuning::DTuning => &D_TUNING,
        }
    }

    pub fn id(self) -> &'static str {
        self.table().id
    }
}

impl fmt::Display for Tuning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().label)
    }
}

impl FromStr for Tuning {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tuning::ALL
            .into_iter()
            .find(|tuning| tuning.id() == s)
            .ok_or_else(|| TunerError::UnknownTuning(s.to_string()))
    }
}

/// Outcome of comparing a deviation against the tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningStatus {
    InTune,
    /// Too high.
    Sharp,
    /// Too low.
    Flat,
}

/// Classifies a signed deviation (Hz).
///
/// `|deviation| < tolerance` is in tune; a deviation of exactly the tolerance is not.
///
/// # Arguments
/// * `deviation` - Detected minus target frequency in Hz
/// * `tolerance` - Half-width of the "in tune" band in Hz
///
/// # Returns
/// * `InTune`, `Sharp` (positive deviation) or `Flat` (negative deviation)
pub fn classify(deviation: f32, tolerance: f32) -> TuningStatus {
    if deviation.abs() < tolerance {
        TuningStatus::InTune
    } else if deviation > 0.0 {
        TuningStatus::Sharp
    } else {
        TuningStatus::Flat
    }
}

/// The table entry nearest to a detected frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestNote {
    pub note_name: &'static str,
    pub target_frequency: f32,
    /// `frequency - target_frequency`, unrounded.
    pub deviation: f32,
}

impl ClosestNote {
    pub fn status(&self) -> TuningStatus {
        self.status_with(TUNING_TOLERANCE_HZ)
    }

    pub fn status_with(&self, tolerance: f32) -> TuningStatus {
        classify(self.deviation, tolerance)
    }
}

/// Finds the table entry closest to `frequency`.
///
/// Linear scan with a strict less-than comparison, so the first of several
/// equally close entries wins. Returns `None` for an empty table, and for a
/// non-finite frequency (no distance is ever smaller than infinity).
///
/// # Arguments
/// * `frequency` - Smoothed detected frequency in Hz
/// * `notes` - Entries of the active tuning table, in table order
///
/// # Returns
/// * `Some(closest)` - Matched note, its target and the signed deviation
/// * `None` - No entry matched
pub fn find_closest_note(frequency: f32, notes: &[Note]) -> Option<ClosestNote> {
    let mut closest: Option<&Note> = None;
    let mut min_difference = f32::INFINITY;

    for candidate in notes {
        let difference = (frequency - candidate.frequency).abs();
        if difference < min_difference {
            min_difference = difference;
            closest = Some(candidate);
        }
    }

    closest.map(|note| ClosestNote {
        note_name: note.name,
        target_frequency: note.frequency,
        deviation: frequency - note.frequency,
    })
}
