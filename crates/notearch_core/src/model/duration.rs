//! Note durations and the twelve placement angles.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Note value; scales both the note box length and its travel spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteDuration {
    #[serde(alias = "FN")]
    Full,
    #[default]
    #[serde(alias = "HN")]
    Half,
    #[serde(alias = "QN")]
    Quarter,
    #[serde(alias = "EN")]
    Eighth,
    #[serde(alias = "SN")]
    Sixteenth,
}

impl NoteDuration {
    /// All durations in prototype generation order.
    pub const ALL: [NoteDuration; 5] = [
        Self::Full,
        Self::Half,
        Self::Quarter,
        Self::Eighth,
        Self::Sixteenth,
    ];

    /// Scale factor against the group's whole-note length.
    pub fn factor(self) -> f64 {
        match self {
            Self::Full => 1.0,
            Self::Half => 0.5,
            Self::Quarter => 0.25,
            Self::Eighth => 0.125,
            Self::Sixteenth => 0.0625,
        }
    }

    /// Stable two-letter code used in prototype names.
    pub fn code(self) -> &'static str {
        match self {
            Self::Full => "FN",
            Self::Half => "HN",
            Self::Quarter => "QN",
            Self::Eighth => "EN",
            Self::Sixteenth => "SN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|duration| duration.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Maps panel keys `1..=5` to durations.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '1' => Some(Self::Full),
            '2' => Some(Self::Half),
            '3' => Some(Self::Quarter),
            '4' => Some(Self::Eighth),
            '5' => Some(Self::Sixteenth),
            _ => None,
        }
    }
}

impl Display for NoteDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Keyboard row mapped onto the twelve chromatic angles, 15° apart.
const ANGLE_KEYS: [char; 12] = ['z', 's', 'x', 'd', 'c', 'v', 'g', 'b', 'h', 'n', 'j', 'm'];
const ANGLE_STEP_DEGREES: f64 = 15.0;

/// One of twelve note angles: 0°, 15°, ..., 165°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteAngle(u8);

impl NoteAngle {
    pub const COUNT: u8 = 12;

    pub fn from_index(index: u8) -> Result<Self, NoteAngleError> {
        if index < Self::COUNT {
            Ok(Self(index))
        } else {
            Err(NoteAngleError::IndexOutOfRange(index))
        }
    }

    pub fn from_key(key: char) -> Result<Self, NoteAngleError> {
        let lowered = key.to_ascii_lowercase();
        ANGLE_KEYS
            .iter()
            .position(|candidate| *candidate == lowered)
            .map(|index| Self(index as u8))
            .ok_or(NoteAngleError::UnknownKey(key))
    }

    pub fn key(self) -> char {
        ANGLE_KEYS[usize::from(self.0)]
    }

    pub fn degrees(self) -> f64 {
        f64::from(self.0) * ANGLE_STEP_DEGREES
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteAngleError {
    UnknownKey(char),
    IndexOutOfRange(u8),
}

impl Display for NoteAngleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey(key) => write!(f, "unknown note key `{key}`"),
            Self::IndexOutOfRange(index) => {
                write!(f, "note angle index {index} out of range 0..12")
            }
        }
    }
}

impl Error for NoteAngleError {}
