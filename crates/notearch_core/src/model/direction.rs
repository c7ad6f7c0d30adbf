//! Travel directions, rotation axes and the turn/reverse tables.
//!
//! # Invariants
//! - `Direction` is the canonical six-value form. The reduced `{X, Y, Z}` +
//!   sign-of-spacing form only exists at the record decoding boundary.
//! - Relative turns are defined only inside the XY plane; Z travel is terminal.

use super::geometry::Vector3;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Model axis. Used both as rotation axis and as the axis of a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }

    pub fn unit_vector(self) -> Vector3 {
        match self {
            Self::X => Vector3::new(1.0, 0.0, 0.0),
            Self::Y => Vector3::new(0.0, 1.0, 0.0),
            Self::Z => Vector3::new(0.0, 0.0, 1.0),
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = DirectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            other => Err(DirectionParseError::UnknownAxis(other.to_string())),
        }
    }
}

/// Signed travel direction of the reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "X+")]
    XPos,
    #[serde(rename = "X-")]
    XNeg,
    #[serde(rename = "Y+")]
    YPos,
    #[serde(rename = "Y-")]
    YNeg,
    #[serde(rename = "Z")]
    Z,
    #[serde(rename = "Z-")]
    ZNeg,
}

/// Relative turn inside the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Left,
    Right,
}

/// How `reverse` treats travel along Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZReversePolicy {
    /// `Z` and `Z-` are fixed points; only the spacing sign flips.
    Fixed,
    /// `Z` and `Z-` swap like the planar directions.
    #[default]
    Swap,
}

/// Which travel directions need a pre-rotation of a freshly placed note.
///
/// Note prototypes are authored lying along one fixed axis; the pre-rotation
/// lays them across the travel path before the angle rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreRotationTable {
    /// X travel: 90° about Z. Z travel: 90° about Y. Y travel: none.
    #[default]
    XAndZ,
    /// X travel: 90° about Z. Nothing else.
    XOnly,
}

impl PreRotationTable {
    /// Returns the axis to pre-rotate about by 90°, if any.
    pub fn axis_for(self, direction: Direction) -> Option<Axis> {
        match (self, direction.axis()) {
            (_, Axis::X) => Some(Axis::Z),
            (Self::XAndZ, Axis::Z) => Some(Axis::Y),
            _ => None,
        }
    }
}

pub const PRE_ROTATION_DEGREES: f64 = 90.0;

impl Direction {
    pub const ALL: [Direction; 6] = [
        Self::XPos,
        Self::XNeg,
        Self::YPos,
        Self::YNeg,
        Self::Z,
        Self::ZNeg,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::XPos => "X+",
            Self::XNeg => "X-",
            Self::YPos => "Y+",
            Self::YNeg => "Y-",
            Self::Z => "Z",
            Self::ZNeg => "Z-",
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::XPos | Self::XNeg => Axis::X,
            Self::YPos | Self::YNeg => Axis::Y,
            Self::Z | Self::ZNeg => Axis::Z,
        }
    }

    pub fn is_vertical(self) -> bool {
        self.axis() == Axis::Z
    }

    /// Unit displacement for one step of travel.
    pub fn unit_vector(self) -> Vector3 {
        match self {
            Self::XPos => Vector3::new(1.0, 0.0, 0.0),
            Self::XNeg => Vector3::new(-1.0, 0.0, 0.0),
            Self::YPos => Vector3::new(0.0, 1.0, 0.0),
            Self::YNeg => Vector3::new(0.0, -1.0, 0.0),
            Self::Z => Vector3::new(0.0, 0.0, 1.0),
            Self::ZNeg => Vector3::new(0.0, 0.0, -1.0),
        }
    }

    /// Builds a canonical direction from the reduced axis + spacing-sign form.
    ///
    /// A non-negative spacing maps to the positive direction.
    pub fn from_reduced(axis: Axis, base_spacing: f64) -> Self {
        let negative = base_spacing < 0.0;
        match (axis, negative) {
            (Axis::X, false) => Self::XPos,
            (Axis::X, true) => Self::XNeg,
            (Axis::Y, false) => Self::YPos,
            (Axis::Y, true) => Self::YNeg,
            (Axis::Z, false) => Self::Z,
            (Axis::Z, true) => Self::ZNeg,
        }
    }

    /// Opposite direction under the given Z policy.
    pub fn reversed(self, policy: ZReversePolicy) -> Self {
        match (self, policy) {
            (Self::XPos, _) => Self::XNeg,
            (Self::XNeg, _) => Self::XPos,
            (Self::YPos, _) => Self::YNeg,
            (Self::YNeg, _) => Self::YPos,
            (Self::Z, ZReversePolicy::Swap) => Self::ZNeg,
            (Self::ZNeg, ZReversePolicy::Swap) => Self::Z,
            (vertical, ZReversePolicy::Fixed) => vertical,
        }
    }

    /// Relative left/right turn in the XY plane; `None` while traveling on Z.
    pub fn turned(self, turn: Turn) -> Option<Self> {
        let (left, right) = match self {
            Self::XPos => (Self::YPos, Self::YNeg),
            Self::YPos => (Self::XNeg, Self::XPos),
            Self::XNeg => (Self::YNeg, Self::YPos),
            Self::YNeg => (Self::XPos, Self::XNeg),
            Self::Z | Self::ZNeg => return None,
        };
        Some(match turn {
            Turn::Left => left,
            Turn::Right => right,
        })
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "X+" => Ok(Self::XPos),
            "X-" => Ok(Self::XNeg),
            "Y+" => Ok(Self::YPos),
            "Y-" => Ok(Self::YNeg),
            "Z" | "Z+" => Ok(Self::Z),
            "Z-" => Ok(Self::ZNeg),
            other => Err(DirectionParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// Parse errors for direction and axis labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectionParseError {
    UnknownDirection(String),
    UnknownAxis(String),
}

impl Display for DirectionParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDirection(value) => write!(
                f,
                "unknown direction `{value}`; expected X+|X-|Y+|Y-|Z|Z-"
            ),
            Self::UnknownAxis(value) => write!(f, "unknown axis `{value}`; expected X|Y|Z"),
        }
    }
}

impl Error for DirectionParseError {}

#[cfg(test)]
mod tests {
    use super::{Axis, Direction, PreRotationTable, Turn, ZReversePolicy};

    #[test]
    fn turn_table_matches_planar_compass() {
        use Direction::*;
        let cases = [
            (XPos, YPos, YNeg),
            (YPos, XNeg, XPos),
            (XNeg, YNeg, YPos),
            (YNeg, XPos, XNeg),
        ];
        for (from, left, right) in cases {
            assert_eq!(from.turned(Turn::Left), Some(left), "left from {from}");
            assert_eq!(from.turned(Turn::Right), Some(right), "right from {from}");
        }
    }

    #[test]
    fn vertical_travel_cannot_turn() {
        assert_eq!(Direction::Z.turned(Turn::Left), None);
        assert_eq!(Direction::ZNeg.turned(Turn::Right), None);
    }

    #[test]
    fn reverse_policy_controls_vertical_axis() {
        assert_eq!(Direction::Z.reversed(ZReversePolicy::Swap), Direction::ZNeg);
        assert_eq!(Direction::ZNeg.reversed(ZReversePolicy::Swap), Direction::Z);
        assert_eq!(Direction::Z.reversed(ZReversePolicy::Fixed), Direction::Z);
        assert_eq!(Direction::ZNeg.reversed(ZReversePolicy::Fixed), Direction::ZNeg);
        assert_eq!(Direction::YPos.reversed(ZReversePolicy::Fixed), Direction::YNeg);
    }

    #[test]
    fn reduced_form_uses_spacing_sign() {
        assert_eq!(Direction::from_reduced(Axis::X, 3000.0), Direction::XPos);
        assert_eq!(Direction::from_reduced(Axis::Y, -1.0), Direction::YNeg);
        assert_eq!(Direction::from_reduced(Axis::Z, 0.0), Direction::Z);
    }

    #[test]
    fn pre_rotation_tables() {
        let full = PreRotationTable::XAndZ;
        assert_eq!(full.axis_for(Direction::XNeg), Some(Axis::Z));
        assert_eq!(full.axis_for(Direction::ZNeg), Some(Axis::Y));
        assert_eq!(full.axis_for(Direction::YPos), None);

        let legacy = PreRotationTable::XOnly;
        assert_eq!(legacy.axis_for(Direction::XPos), Some(Axis::Z));
        assert_eq!(legacy.axis_for(Direction::Z), None);
    }

    #[test]
    fn direction_labels_round_trip_through_serde() {
        for direction in Direction::ALL {
            let json = serde_json::to_string(&direction).unwrap();
            assert_eq!(json, format!("\"{}\"", direction.as_str()));
            assert_eq!(direction.as_str().parse::<Direction>().unwrap(), direction);
        }
    }
}
