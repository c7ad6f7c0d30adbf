//! Typed command surface.
//!
//! One variant per public engine operation. Hosts send a JSON object tagged
//! by `command`, e.g. `{"command": "place_note", "key": "d"}`.

use super::placement_engine::{
    DirectionTarget, EngineError, EngineResult, PlacementEngine, PlacementRecord, SwitchDirection,
};
use crate::host::EngineHost;
use crate::model::duration::{NoteAngle, NoteDuration};
use crate::model::geometry::Point3;
use crate::model::group::{Dimension, GroupId, GroupParams, GroupSnapshot};
use serde::Deserialize;

/// Note angle selector: a keyboard key (`z s x d c v g b h n j m`) or an
/// index `0..12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NoteKey {
    Index(u8),
    Key(char),
}

impl NoteKey {
    pub fn resolve(self) -> EngineResult<NoteAngle> {
        match self {
            Self::Index(index) => NoteAngle::from_index(index),
            Self::Key(key) => NoteAngle::from_key(key),
        }
        .map_err(|err| EngineError::InvalidInput(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    CreateGroup(GroupParams),
    UpdateGroup(GroupParams),
    SwitchGroup { direction: SwitchDirection },
    SetReferencePoint { x: f64, y: f64, z: f64 },
    ResetReferencePoint,
    SetReferencePointFromSelection,
    SetNoteDuration { duration: NoteDuration },
    /// Panel keys `1..=5`.
    SetNoteDurationKey { key: char },
    AdvanceReferencePoint,
    PlaceNote { key: NoteKey },
    UndoLastPlacement,
    SyncSpacingToLength,
    SyncWidthToLength,
    ReverseSpacing,
    AdjustDimension { dimension: Dimension, delta: i32 },
    ReduceHalfDimension { dimension: Dimension },
    UpdateDirection { target: DirectionTarget },
    DeleteCurrentGroup,
    /// Reloads every group from the record store.
    LoadGroups,
    GuideLine,
    Snapshot,
}

impl EngineCommand {
    /// Stable command name, matching the wire tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateGroup(_) => "create_group",
            Self::UpdateGroup(_) => "update_group",
            Self::SwitchGroup { .. } => "switch_group",
            Self::SetReferencePoint { .. } => "set_reference_point",
            Self::ResetReferencePoint => "reset_reference_point",
            Self::SetReferencePointFromSelection => "set_reference_point_from_selection",
            Self::SetNoteDuration { .. } => "set_note_duration",
            Self::SetNoteDurationKey { .. } => "set_note_duration_key",
            Self::AdvanceReferencePoint => "advance_reference_point",
            Self::PlaceNote { .. } => "place_note",
            Self::UndoLastPlacement => "undo_last_placement",
            Self::SyncSpacingToLength => "sync_spacing_to_length",
            Self::SyncWidthToLength => "sync_width_to_length",
            Self::ReverseSpacing => "reverse_spacing",
            Self::AdjustDimension { .. } => "adjust_dimension",
            Self::ReduceHalfDimension { .. } => "reduce_half_dimension",
            Self::UpdateDirection { .. } => "update_direction",
            Self::DeleteCurrentGroup => "delete_current_group",
            Self::LoadGroups => "load_groups",
            Self::GuideLine => "guide_line",
            Self::Snapshot => "snapshot",
        }
    }
}

/// What a command produced, beyond the state change itself.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    GroupCreated(GroupId),
    /// `None` when no group was selected.
    Placed(Option<PlacementRecord>),
    /// `None` when the history was empty.
    Undone(Option<PlacementRecord>),
    Loaded(usize),
    GuideLine(Option<(Point3, Point3)>),
    Snapshot(Option<GroupSnapshot>),
}

impl<H: EngineHost> PlacementEngine<H> {
    /// Runs one command.
    pub fn execute(&mut self, command: EngineCommand) -> EngineResult<CommandOutcome> {
        let outcome = match command {
            EngineCommand::CreateGroup(params) => {
                CommandOutcome::GroupCreated(self.create_group(&params)?)
            }
            EngineCommand::UpdateGroup(params) => {
                self.update_group(&params)?;
                CommandOutcome::Done
            }
            EngineCommand::SwitchGroup { direction } => {
                self.switch_group(direction)?;
                CommandOutcome::Done
            }
            EngineCommand::SetReferencePoint { x, y, z } => {
                self.set_reference_point(x, y, z)?;
                CommandOutcome::Done
            }
            EngineCommand::ResetReferencePoint => {
                self.reset_reference_point()?;
                CommandOutcome::Done
            }
            EngineCommand::SetReferencePointFromSelection => {
                self.set_reference_point_from_selection()?;
                CommandOutcome::Done
            }
            EngineCommand::SetNoteDuration { duration } => {
                self.set_note_duration(duration)?;
                CommandOutcome::Done
            }
            EngineCommand::SetNoteDurationKey { key } => {
                let duration = NoteDuration::from_key(key).ok_or_else(|| {
                    EngineError::InvalidInput(format!("unknown duration key `{key}`"))
                })?;
                self.set_note_duration(duration)?;
                CommandOutcome::Done
            }
            EngineCommand::AdvanceReferencePoint => {
                self.advance_reference_point()?;
                CommandOutcome::Done
            }
            EngineCommand::PlaceNote { key } => CommandOutcome::Placed(self.place_note(key.resolve()?)?),
            EngineCommand::UndoLastPlacement => CommandOutcome::Undone(self.undo_last_placement()?),
            EngineCommand::SyncSpacingToLength => {
                self.sync_spacing_to_length()?;
                CommandOutcome::Done
            }
            EngineCommand::SyncWidthToLength => {
                self.sync_width_to_length()?;
                CommandOutcome::Done
            }
            EngineCommand::ReverseSpacing => {
                self.reverse_spacing()?;
                CommandOutcome::Done
            }
            EngineCommand::AdjustDimension { dimension, delta } => {
                self.adjust_dimension(dimension, delta)?;
                CommandOutcome::Done
            }
            EngineCommand::ReduceHalfDimension { dimension } => {
                self.reduce_half_dimension(dimension)?;
                CommandOutcome::Done
            }
            EngineCommand::UpdateDirection { target } => {
                self.update_direction(target)?;
                CommandOutcome::Done
            }
            EngineCommand::DeleteCurrentGroup => {
                self.delete_current_group()?;
                CommandOutcome::Done
            }
            EngineCommand::LoadGroups => CommandOutcome::Loaded(self.load_groups_from_store()?),
            EngineCommand::GuideLine => CommandOutcome::GuideLine(self.guide_line()),
            EngineCommand::Snapshot => CommandOutcome::Snapshot(self.snapshot()),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineCommand, NoteKey};
    use crate::model::direction::{Direction, Turn};
    use crate::model::group::{Dimension, GroupParams};
    use crate::service::placement_engine::{DirectionTarget, SwitchDirection};
    use serde_json::json;

    fn parse(value: serde_json::Value) -> EngineCommand {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_group_takes_inline_params() {
        let command = parse(json!({
            "command": "create_group",
            "length": 1200.0,
            "advance_dir": "Y-",
            "rotation_axis": "X"
        }));
        match command {
            EngineCommand::CreateGroup(GroupParams {
                length,
                width,
                advance_dir,
                ..
            }) => {
                assert_eq!(length, Some(1200.0));
                assert_eq!(width, None);
                assert_eq!(advance_dir, Some(Direction::YNeg));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn place_note_accepts_key_or_index() {
        assert_eq!(
            parse(json!({"command": "place_note", "key": "d"})),
            EngineCommand::PlaceNote {
                key: NoteKey::Key('d')
            }
        );
        assert_eq!(
            parse(json!({"command": "place_note", "key": 11})),
            EngineCommand::PlaceNote {
                key: NoteKey::Index(11)
            }
        );
        assert!(NoteKey::Key('q').resolve().is_err());
    }

    #[test]
    fn direction_targets_parse_turns_and_explicit_directions() {
        assert_eq!(
            parse(json!({"command": "update_direction", "target": "left"})),
            EngineCommand::UpdateDirection {
                target: DirectionTarget::Turn(Turn::Left)
            }
        );
        assert_eq!(
            parse(json!({"command": "update_direction", "target": "Z-"})),
            EngineCommand::UpdateDirection {
                target: DirectionTarget::Explicit(Direction::ZNeg)
            }
        );
        assert!(serde_json::from_value::<EngineCommand>(
            json!({"command": "update_direction", "target": "up"})
        )
        .is_err());
    }

    #[test]
    fn unit_variants_and_names_line_up() {
        let command = parse(json!({"command": "switch_group", "direction": "prev"}));
        assert_eq!(
            command,
            EngineCommand::SwitchGroup {
                direction: SwitchDirection::Prev
            }
        );
        assert_eq!(command.name(), "switch_group");

        let command = parse(json!({"command": "adjust_dimension", "dimension": "length", "delta": -1}));
        assert_eq!(
            command,
            EngineCommand::AdjustDimension {
                dimension: Dimension::Length,
                delta: -1
            }
        );
        assert_eq!(parse(json!({"command": "undo_last_placement"})).name(), "undo_last_placement");
    }
}
