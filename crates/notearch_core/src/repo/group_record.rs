//! Persisted group record codec.
//!
//! # Responsibility
//! - Encode a `Group` into its canonical JSON record.
//! - Decode canonical and legacy records into a validated `Group`.
//!
//! # Legacy records
//! Early plugin releases stored the travel direction as a bare axis
//! (`X`, `Y`, `Z`) with the sign carried by `base_spacing`, and stored lengths
//! in inches without a unit tag. The direction format is decided as follows:
//! 1. An explicit `format` tag (`full` or `reduced`) wins.
//! 2. A bare `X` or `Y` direction is reduced.
//! 3. A bare `Z` is reduced when the record has no `standard_spacing` field,
//!    which only appeared together with the signed six-value directions.
//! 4. Everything else is full.

use super::group_store::{RepoError, RepoResult};
use crate::model::direction::{Axis, Direction};
use crate::model::geometry::Point3;
use crate::model::group::{Group, GroupId, DEFAULT_DIRECTION, DEFAULT_ROTATION_AXIS};
use crate::units::LengthUnit;
use serde::{Deserialize, Serialize};

pub const FORMAT_FULL: &str = "full";
pub const FORMAT_REDUCED: &str = "reduced";

/// Direction encoding of a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionFormat {
    Full,
    Reduced,
}

#[derive(Debug, Serialize)]
struct WireGroupRecord<'a> {
    format: &'static str,
    unit: &'static str,
    id: GroupId,
    length: f64,
    width: f64,
    height: f64,
    base_spacing: f64,
    advance_dir: &'a str,
    rotation_axis: &'a str,
    reference_point: Point3,
    standard_length: f64,
    standard_width: f64,
    standard_height: f64,
    standard_spacing: f64,
}

#[derive(Debug, Deserialize)]
struct RawGroupRecord {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    id: GroupId,
    length: f64,
    width: f64,
    height: f64,
    #[serde(default, alias = "spacing")]
    base_spacing: Option<f64>,
    #[serde(default)]
    advance_dir: Option<String>,
    #[serde(default)]
    rotation_axis: Option<String>,
    #[serde(default)]
    reference_point: Option<Point3>,
    #[serde(default)]
    standard_length: Option<f64>,
    #[serde(default)]
    standard_width: Option<f64>,
    #[serde(default)]
    standard_height: Option<f64>,
    #[serde(default)]
    standard_spacing: Option<f64>,
}

/// Serializes a group into its canonical record.
pub fn encode_group_record(group: &Group) -> RepoResult<String> {
    group.validate()?;
    let wire = WireGroupRecord {
        format: FORMAT_FULL,
        unit: LengthUnit::Millimeter.tag(),
        id: group.id,
        length: group.length,
        width: group.width,
        height: group.height,
        base_spacing: group.base_spacing,
        advance_dir: group.advance_dir.as_str(),
        rotation_axis: group.rotation_axis.as_str(),
        reference_point: group.reference_point,
        standard_length: group.standard_length,
        standard_width: group.standard_width,
        standard_height: group.standard_height,
        standard_spacing: group.standard_spacing,
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Decodes a canonical or legacy record.
///
/// `legacy_unit` applies when the record carries no `unit` tag.
pub fn decode_group_record(raw: &str, legacy_unit: LengthUnit) -> RepoResult<Group> {
    let record: RawGroupRecord = serde_json::from_str(raw)?;

    let unit = match record.unit.as_deref() {
        Some(tag) => LengthUnit::from_tag(tag).ok_or_else(|| {
            RepoError::InvalidData(format!("group {}: unknown unit `{tag}`", record.id))
        })?,
        None => legacy_unit,
    };
    let mm = |value: f64| unit.to_mm(value);

    let base_spacing = mm(record.base_spacing.unwrap_or(record.length));
    let advance_dir = decode_direction(&record, base_spacing)?;
    let rotation_axis = match record.rotation_axis.as_deref() {
        Some(label) => label.parse::<Axis>().map_err(|err| {
            RepoError::InvalidData(format!("group {}: {err}", record.id))
        })?,
        None => DEFAULT_ROTATION_AXIS,
    };

    let length = mm(record.length);
    let width = mm(record.width);
    let height = mm(record.height);
    let group = Group {
        id: record.id,
        length,
        width,
        height,
        base_spacing,
        advance_dir,
        rotation_axis,
        reference_point: unit.point_to_mm(record.reference_point.unwrap_or(Point3::ORIGIN)),
        standard_length: record.standard_length.map_or(length, mm),
        standard_width: record.standard_width.map_or(width, mm),
        standard_height: record.standard_height.map_or(height, mm),
        standard_spacing: record
            .standard_spacing
            .map_or(base_spacing.abs(), mm),
    };
    group.validate()?;
    Ok(group)
}

fn decode_direction(record: &RawGroupRecord, base_spacing: f64) -> RepoResult<Direction> {
    let Some(label) = record.advance_dir.as_deref() else {
        return Ok(DEFAULT_DIRECTION);
    };
    let invalid = |err: String| RepoError::InvalidData(format!("group {}: {err}", record.id));

    match infer_direction_format(record, label)? {
        DirectionFormat::Full => label.parse::<Direction>().map_err(|err| invalid(err.to_string())),
        DirectionFormat::Reduced => {
            let axis = label.parse::<Axis>().map_err(|err| invalid(err.to_string()))?;
            Ok(Direction::from_reduced(axis, base_spacing))
        }
    }
}

fn infer_direction_format(record: &RawGroupRecord, label: &str) -> RepoResult<DirectionFormat> {
    if let Some(tag) = record.format.as_deref() {
        return match tag {
            FORMAT_FULL => Ok(DirectionFormat::Full),
            FORMAT_REDUCED => Ok(DirectionFormat::Reduced),
            other => Err(RepoError::InvalidData(format!(
                "group {}: unknown record format `{other}`",
                record.id
            ))),
        };
    }

    let format = match label.trim().to_ascii_uppercase().as_str() {
        "X" | "Y" => DirectionFormat::Reduced,
        "Z" if record.standard_spacing.is_none() => DirectionFormat::Reduced,
        _ => DirectionFormat::Full,
    };
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::{decode_group_record, encode_group_record};
    use crate::model::direction::{Axis, Direction};
    use crate::model::geometry::Point3;
    use crate::model::group::{Group, GroupParams};
    use crate::repo::group_store::RepoError;
    use crate::units::LengthUnit;
    use serde_json::json;

    #[test]
    fn canonical_record_carries_format_and_unit_tags() {
        let group = Group::from_params(3, &GroupParams::default(), Point3::new(1.0, 2.0, 3.0));
        let raw = encode_group_record(&group).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["format"], "full");
        assert_eq!(value["unit"], "mm");
        assert_eq!(value["advance_dir"], "X+");
        assert_eq!(value["reference_point"], json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn untagged_signed_record_is_read_as_inches() {
        let raw = json!({
            "id": 2,
            "length": 10.0,
            "width": 1.0,
            "height": 10.0,
            "base_spacing": -10.0,
            "advance_dir": "Y-",
            "rotation_axis": "X",
            "reference_point": [1.0, 0.0, 0.0],
            "standard_length": 5.0,
            "standard_width": 1.0,
            "standard_height": 10.0,
            "standard_spacing": 10.0
        })
        .to_string();

        let group = decode_group_record(&raw, LengthUnit::Inch).unwrap();
        assert_eq!(group.advance_dir, Direction::YNeg);
        assert_eq!(group.rotation_axis, Axis::X);
        assert_eq!(group.length, 254.0);
        assert_eq!(group.standard_length, 127.0);
        assert_eq!(group.base_spacing, -254.0);
        assert_eq!(group.reference_point, Point3::new(25.4, 0.0, 0.0));
    }

    #[test]
    fn reduced_axis_takes_sign_from_spacing() {
        let raw = json!({
            "id": 1,
            "length": 3000.0,
            "width": 100.0,
            "height": 3000.0,
            "base_spacing": -3000.0,
            "advance_dir": "X",
            "rotation_axis": "Z"
        })
        .to_string();

        let group = decode_group_record(&raw, LengthUnit::Millimeter).unwrap();
        assert_eq!(group.advance_dir, Direction::XNeg);
        assert_eq!(group.standard_spacing, 3000.0);
        assert_eq!(group.reference_point, Point3::ORIGIN);
    }

    #[test]
    fn bare_z_without_standard_spacing_is_reduced() {
        let raw = json!({
            "id": 1, "length": 1.0, "width": 1.0, "height": 1.0,
            "base_spacing": -1.0, "advance_dir": "Z"
        })
        .to_string();
        let group = decode_group_record(&raw, LengthUnit::Millimeter).unwrap();
        assert_eq!(group.advance_dir, Direction::ZNeg);

        let raw = json!({
            "id": 1, "length": 1.0, "width": 1.0, "height": 1.0,
            "base_spacing": -1.0, "advance_dir": "Z", "standard_spacing": 1.0
        })
        .to_string();
        let group = decode_group_record(&raw, LengthUnit::Millimeter).unwrap();
        assert_eq!(group.advance_dir, Direction::Z);
    }

    #[test]
    fn explicit_format_tag_wins_over_inference() {
        let raw = json!({
            "format": "full", "unit": "mm", "id": 1,
            "length": 1.0, "width": 1.0, "height": 1.0,
            "base_spacing": -1.0, "advance_dir": "Z"
        })
        .to_string();
        let group = decode_group_record(&raw, LengthUnit::Inch).unwrap();
        assert_eq!(group.advance_dir, Direction::Z);
        assert_eq!(group.length, 1.0);
    }

    #[test]
    fn invalid_records_are_rejected() {
        let bad_dir = json!({
            "id": 1, "length": 1.0, "width": 1.0, "height": 1.0, "advance_dir": "W+"
        })
        .to_string();
        assert!(matches!(
            decode_group_record(&bad_dir, LengthUnit::Millimeter),
            Err(RepoError::InvalidData(_))
        ));

        let collapsed = json!({
            "id": 1, "length": 0.0, "width": 1.0, "height": 1.0, "advance_dir": "X+"
        })
        .to_string();
        assert!(matches!(
            decode_group_record(&collapsed, LengthUnit::Millimeter),
            Err(RepoError::Validation(_))
        ));

        assert!(matches!(
            decode_group_record("not json", LengthUnit::Millimeter),
            Err(RepoError::Serialization(_))
        ));
    }
}
