//! Length units spoken at host boundaries.
//!
//! Engine state is always millimeters; geometry and selection hosts may speak
//! another unit (the CAD host's native unit is inches).

use crate::model::geometry::Point3;
use serde::{Deserialize, Serialize};

pub const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[serde(alias = "mm")]
    Millimeter,
    #[default]
    #[serde(alias = "in")]
    Inch,
}

impl LengthUnit {
    /// Short tag written into persisted records.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Inch => "in",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" => Some(Self::Millimeter),
            "in" | "inch" => Some(Self::Inch),
            _ => None,
        }
    }

    /// Converts a millimeter length into this unit.
    pub fn from_mm(self, mm: f64) -> f64 {
        match self {
            Self::Millimeter => mm,
            Self::Inch => mm / MM_PER_INCH,
        }
    }

    /// Converts a length in this unit into millimeters.
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Self::Millimeter => value,
            Self::Inch => value * MM_PER_INCH,
        }
    }

    pub fn point_from_mm(self, point: Point3) -> Point3 {
        point.map(|value| self.from_mm(value))
    }

    pub fn point_to_mm(self, point: Point3) -> Point3 {
        point.map(|value| self.to_mm(value))
    }
}
