//! Group domain model.
//!
//! # Responsibility
//! - Hold one parametric phrase: box dimensions, spacing, travel direction,
//!   rotation axis and the group's own reference point.
//! - Own the spacing algebra shared by advance, placement, undo and preview.
//!
//! # Invariants
//! - `id` is unique within a session and never reused.
//! - `length`, `width` and `height` are strictly positive and finite.
//! - `standard_*` fields are the step used by relative adjustment; they are
//!   only rebased by explicit edits, halving, or spacing sync/reverse.

use super::direction::{Axis, Direction};
use super::duration::NoteDuration;
use super::geometry::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type GroupId = u32;

pub const DEFAULT_LENGTH_MM: f64 = 3000.0;
pub const DEFAULT_WIDTH_MM: f64 = 100.0;
pub const DEFAULT_HEIGHT_MM: f64 = 3000.0;
pub const DEFAULT_SPACING_MM: f64 = 3000.0;
pub const DEFAULT_DIRECTION: Direction = Direction::XPos;
pub const DEFAULT_ROTATION_AXIS: Axis = Axis::Z;

const RECORD_KEY_PREFIX: &str = "GroupData_";

/// Requested group parameters from the panel.
///
/// Every field is optional; absent, non-finite or non-positive numbers fall
/// back to defaults on create and to the current value on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupParams {
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub spacing: Option<f64>,
    #[serde(default)]
    pub advance_dir: Option<Direction>,
    #[serde(default)]
    pub rotation_axis: Option<Axis>,
}

/// Adjustable group quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Length,
    Width,
    Height,
    Spacing,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Width => "width",
            Self::Height => "height",
            Self::Spacing => "spacing",
        }
    }

    /// Whether a change requires regenerating note prototypes.
    pub fn affects_geometry(self) -> bool {
        !matches!(self, Self::Spacing)
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "length" => Ok(Self::Length),
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            "spacing" | "base_spacing" => Ok(Self::Spacing),
            other => Err(format!(
                "unknown dimension `{other}`; expected length|width|height|spacing"
            )),
        }
    }
}

/// One parametric phrase of notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    /// Whole-note box length, millimeters.
    pub length: f64,
    pub width: f64,
    /// Perpendicular to the travel plane.
    pub height: f64,
    /// Signed; travel direction lives in `advance_dir`.
    pub base_spacing: f64,
    pub advance_dir: Direction,
    pub rotation_axis: Axis,
    pub reference_point: Point3,
    pub standard_length: f64,
    pub standard_width: f64,
    pub standard_height: f64,
    pub standard_spacing: f64,
}

impl Group {
    /// Builds a group from panel parameters, absorbing invalid input.
    pub fn from_params(id: GroupId, params: &GroupParams, reference_point: Point3) -> Self {
        let length = positive_or(params.length, DEFAULT_LENGTH_MM);
        let width = positive_or(params.width, DEFAULT_WIDTH_MM);
        let height = positive_or(params.height, DEFAULT_HEIGHT_MM);
        let spacing = positive_or(params.spacing, DEFAULT_SPACING_MM);

        Self {
            id,
            length,
            width,
            height,
            base_spacing: spacing,
            advance_dir: params.advance_dir.unwrap_or(DEFAULT_DIRECTION),
            rotation_axis: params.rotation_axis.unwrap_or(DEFAULT_ROTATION_AXIS),
            reference_point,
            standard_length: length,
            standard_width: width,
            standard_height: height,
            standard_spacing: spacing,
        }
    }

    /// Applies panel parameters in place.
    ///
    /// A provided value replaces both the current value and its adjustment
    /// step; a missing one leaves both untouched.
    pub fn apply_params(&mut self, params: &GroupParams) {
        if let Some(length) = positive(params.length) {
            self.length = length;
            self.standard_length = length;
        }
        if let Some(width) = positive(params.width) {
            self.width = width;
            self.standard_width = width;
        }
        if let Some(height) = positive(params.height) {
            self.height = height;
            self.standard_height = height;
        }
        if let Some(spacing) = positive(params.spacing) {
            self.base_spacing = spacing;
            self.standard_spacing = spacing;
        }
        if let Some(direction) = params.advance_dir {
            self.advance_dir = direction;
        }
        if let Some(axis) = params.rotation_axis {
            self.rotation_axis = axis;
        }
    }

    /// Travel distance for one note of `duration`.
    pub fn spacing_for(&self, duration: NoteDuration) -> f64 {
        self.base_spacing.abs() * duration.factor()
    }

    /// Displacement of the reference point for one note of `duration`.
    pub fn step(&self, duration: NoteDuration) -> Vector3 {
        self.advance_dir.unit_vector() * self.spacing_for(duration)
    }

    /// Box length of the prototype for `duration`.
    pub fn note_length(&self, duration: NoteDuration) -> f64 {
        self.length * duration.factor()
    }

    pub fn dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Length => self.length,
            Dimension::Width => self.width,
            Dimension::Height => self.height,
            Dimension::Spacing => self.base_spacing,
        }
    }

    pub fn standard(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Length => self.standard_length,
            Dimension::Width => self.standard_width,
            Dimension::Height => self.standard_height,
            Dimension::Spacing => self.standard_spacing,
        }
    }

    pub fn set_dimension(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::Length => self.length = value,
            Dimension::Width => self.width = value,
            Dimension::Height => self.height = value,
            Dimension::Spacing => self.base_spacing = value,
        }
    }

    pub fn set_standard(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::Length => self.standard_length = value,
            Dimension::Width => self.standard_width = value,
            Dimension::Height => self.standard_height = value,
            Dimension::Spacing => self.standard_spacing = value,
        }
    }

    /// Host prototype name for `duration`, e.g. `HN_3`.
    pub fn prototype_name(&self, duration: NoteDuration) -> String {
        prototype_name(self.id, duration)
    }

    /// Checks the dimension invariants.
    pub fn validate(&self) -> Result<(), GroupValidationError> {
        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GroupValidationError::NonPositiveDimension { name, value });
            }
        }
        if !self.base_spacing.is_finite() {
            return Err(GroupValidationError::NonFinite("base_spacing"));
        }
        if !self.reference_point.is_finite() {
            return Err(GroupValidationError::NonFinite("reference_point"));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            id: self.id,
            length: self.length,
            width: self.width,
            height: self.height,
            advance_dir: self.advance_dir,
            rotation_axis: self.rotation_axis,
            spacing: self.base_spacing,
            reference_point: self.reference_point,
        }
    }
}

/// Prototype name convention shared with the geometry host.
pub fn prototype_name(group_id: GroupId, duration: NoteDuration) -> String {
    format!("{}_{group_id}", duration.code())
}

/// Persistence key convention shared with the record store.
pub fn record_key(group_id: GroupId) -> String {
    format!("{RECORD_KEY_PREFIX}{group_id}")
}

/// Field-level view pushed to the presentation host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub id: GroupId,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub advance_dir: Direction,
    pub rotation_axis: Axis,
    pub spacing: f64,
    pub reference_point: Point3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupValidationError {
    NonPositiveDimension { name: &'static str, value: f64 },
    NonFinite(&'static str),
}

impl Display for GroupValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveDimension { name, value } => {
                write!(f, "{name} must be positive and finite, got {value}")
            }
            Self::NonFinite(name) => write!(f, "{name} must be finite"),
        }
    }
}

impl Error for GroupValidationError {}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value > 0.0)
}

fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    positive(value).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::{record_key, Dimension, Group, GroupParams, GroupValidationError};
    use crate::model::direction::{Axis, Direction};
    use crate::model::duration::NoteDuration;
    use crate::model::geometry::{Point3, Vector3};

    #[test]
    fn from_params_falls_back_to_defaults_for_invalid_input() {
        let params = GroupParams {
            length: Some(-5.0),
            width: None,
            height: Some(f64::NAN),
            spacing: Some(0.0),
            ..GroupParams::default()
        };
        let group = Group::from_params(1, &params, Point3::ORIGIN);

        assert_eq!(group.length, 3000.0);
        assert_eq!(group.width, 100.0);
        assert_eq!(group.height, 3000.0);
        assert_eq!(group.base_spacing, 3000.0);
        assert_eq!(group.advance_dir, Direction::XPos);
        assert_eq!(group.rotation_axis, Axis::Z);
        assert_eq!(group.standard_spacing, 3000.0);
    }

    #[test]
    fn spacing_ignores_sign_and_scales_by_duration() {
        let mut group = Group::from_params(1, &GroupParams::default(), Point3::ORIGIN);
        group.base_spacing = -2000.0;
        group.advance_dir = Direction::YNeg;

        assert_eq!(group.spacing_for(NoteDuration::Quarter), 500.0);
        assert_eq!(
            group.step(NoteDuration::Full),
            Vector3::new(0.0, -2000.0, 0.0)
        );
    }

    #[test]
    fn apply_params_keeps_missing_fields() {
        let mut group = Group::from_params(4, &GroupParams::default(), Point3::ORIGIN);
        group.standard_length = 750.0;
        group.apply_params(&GroupParams {
            width: Some(250.0),
            advance_dir: Some(Direction::Z),
            ..GroupParams::default()
        });

        assert_eq!(group.width, 250.0);
        assert_eq!(group.standard_width, 250.0);
        assert_eq!(group.length, 3000.0);
        assert_eq!(group.standard_length, 750.0);
        assert_eq!(group.advance_dir, Direction::Z);
    }

    #[test]
    fn validate_rejects_collapsed_box() {
        let mut group = Group::from_params(2, &GroupParams::default(), Point3::ORIGIN);
        group.set_dimension(Dimension::Width, 0.0);

        assert_eq!(
            group.validate().unwrap_err(),
            GroupValidationError::NonPositiveDimension {
                name: "width",
                value: 0.0
            }
        );
    }

    #[test]
    fn naming_conventions() {
        let group = Group::from_params(7, &GroupParams::default(), Point3::ORIGIN);
        assert_eq!(group.prototype_name(NoteDuration::Sixteenth), "SN_7");
        assert_eq!(record_key(7), "GroupData_7");
    }
}
