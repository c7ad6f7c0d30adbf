//! Engine configuration.
//!
//! # Responsibility
//! - Carry the behavior switches that differ between plugin releases.
//! - Load from JSON with per-field defaults so partial files stay valid.

use crate::model::direction::{PreRotationTable, ZReversePolicy};
use crate::units::LengthUnit;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub z_reverse_policy: ZReversePolicy,
    pub pre_rotation: PreRotationTable,
    /// `None` keeps every placement record.
    pub history_capacity: Option<usize>,
    /// Unit used by the geometry and selection hosts.
    pub host_unit: LengthUnit,
    /// Unit assumed for persisted records without a `unit` tag.
    pub legacy_record_unit: LengthUnit,
    pub guide_line_preview: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            z_reverse_policy: ZReversePolicy::Swap,
            pre_rotation: PreRotationTable::XAndZ,
            history_capacity: Some(DEFAULT_HISTORY_CAPACITY),
            host_unit: LengthUnit::Inch,
            legacy_record_unit: LengthUnit::Inch,
            guide_line_preview: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|err| format!("invalid engine config: {err}"))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read config `{}`: {err}", path.display()))?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use crate::model::direction::{PreRotationTable, ZReversePolicy};
    use crate::units::LengthUnit;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"z_reverse_policy": "fixed", "host_unit": "mm"}"#)
                .unwrap();

        assert_eq!(config.z_reverse_policy, ZReversePolicy::Fixed);
        assert_eq!(config.host_unit, LengthUnit::Millimeter);
        assert_eq!(config.pre_rotation, PreRotationTable::XAndZ);
        assert_eq!(config.history_capacity, Some(100));
        assert!(config.guide_line_preview);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{"pre_rotation": "sideways"}"#).unwrap_err();
        assert!(err.contains("invalid engine config"));
    }
}
