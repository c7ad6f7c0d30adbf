//! Placement engine.
//!
//! # Responsibility
//! - Manage groups, the current group pointer, the current reference point,
//!   the current note duration and the placement history.
//! - Compute where the next note goes and drive the host collaborators.
//!
//! # Invariants
//! - `reference_point` mirrors the current group's stored reference point
//!   after every operation that touches it.
//! - Placement advances the reference point before the note is emitted; undo
//!   reverses it with the popped record's duration, not the current one.
//! - Group ids are allocated monotonically and never reused in a session.
//! - Consecutive direction changes edit one group; any other direction change
//!   forks the current group under a fresh id.

use crate::config::EngineConfig;
use crate::host::{
    BoxDimensions, EngineHost, HostError, InstanceHandle, SelectionError,
};
use crate::model::direction::{Direction, Turn, PRE_ROTATION_DEGREES};
use crate::model::duration::{NoteAngle, NoteDuration};
use crate::model::geometry::{Point3, Vector3};
use crate::model::group::{Dimension, Group, GroupId, GroupParams, GroupSnapshot};
use crate::repo::group_record::{decode_group_record, encode_group_record};
use crate::repo::group_store::RepoError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine operation error.
///
/// Guarded no-ops are not errors; only a failed selection lookup, bad
/// command input, and host or store faults surface here.
#[derive(Debug)]
pub enum EngineError {
    Selection(SelectionError),
    InvalidInput(String),
    Host(HostError),
    Repo(RepoError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selection(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Host(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Selection(err) => Some(err),
            Self::InvalidInput(_) => None,
            Self::Host(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SelectionError> for EngineError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

impl From<HostError> for EngineError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Kind of the most recent state-changing action, used for chaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastAction {
    #[default]
    None,
    Placement,
    DirectionChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchDirection {
    Prev,
    Next,
}

/// Target of a direction change: a relative turn or an absolute direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DirectionTarget {
    Turn(Turn),
    Explicit(Direction),
}

impl FromStr for DirectionTarget {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Turn(Turn::Left)),
            "right" => Ok(Self::Turn(Turn::Right)),
            _ => value
                .parse::<Direction>()
                .map(Self::Explicit)
                .map_err(|err| err.to_string()),
        }
    }
}

impl TryFrom<String> for DirectionTarget {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DirectionTarget> for String {
    fn from(value: DirectionTarget) -> Self {
        match value {
            DirectionTarget::Turn(Turn::Left) => "left".to_string(),
            DirectionTarget::Turn(Turn::Right) => "right".to_string(),
            DirectionTarget::Explicit(direction) => direction.as_str().to_string(),
        }
    }
}

/// Undo token for one placed note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRecord {
    pub handle: InstanceHandle,
    pub duration: NoteDuration,
    /// Group current at placement time.
    pub group_id: GroupId,
}

/// Session state owned by one engine.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    groups: Vec<Group>,
    current_index: Option<usize>,
    current_duration: NoteDuration,
    reference_point: Point3,
    history: VecDeque<PlacementRecord>,
    last_action: LastAction,
    next_group_id: GroupId,
    saved_direction: Option<Direction>,
}

/// `abs(base_spacing) * factor(duration)`.
pub fn compute_spacing(group: &Group, duration: NoteDuration) -> f64 {
    group.spacing_for(duration)
}

/// Unit travel vector for `direction`.
pub fn direction_vector(direction: Direction) -> Vector3 {
    direction.unit_vector()
}

/// The placement state machine, bound to one set of host collaborators.
pub struct PlacementEngine<H: EngineHost> {
    host: H,
    config: EngineConfig,
    state: EngineState,
}

impl<H: EngineHost> PlacementEngine<H> {
    pub fn new(host: H, config: EngineConfig) -> Self {
        Self {
            host,
            config,
            state: EngineState::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn groups(&self) -> &[Group] {
        &self.state.groups
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index
    }

    pub fn current_group(&self) -> Option<&Group> {
        self.state
            .current_index
            .and_then(|index| self.state.groups.get(index))
    }

    pub fn current_duration(&self) -> NoteDuration {
        self.state.current_duration
    }

    pub fn reference_point(&self) -> Point3 {
        self.state.reference_point
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PlacementRecord> {
        self.state.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.state.history.len()
    }

    pub fn last_action(&self) -> LastAction {
        self.state.last_action
    }

    pub fn saved_direction(&self) -> Option<Direction> {
        self.state.saved_direction
    }

    pub fn snapshot(&self) -> Option<GroupSnapshot> {
        self.current_group().map(Group::snapshot)
    }

    /// Travel distance of the next note in the current group.
    pub fn current_spacing(&self) -> Option<f64> {
        self.current_group()
            .map(|group| compute_spacing(group, self.state.current_duration))
    }

    /// Preview segment from the reference point to where the next note goes.
    pub fn guide_line(&self) -> Option<(Point3, Point3)> {
        let group = self.current_group()?;
        let start = self.state.reference_point;
        Some((start, start + group.step(self.state.current_duration)))
    }

    /// Creates a group from panel parameters and makes it current.
    pub fn create_group(&mut self, params: &GroupParams) -> EngineResult<GroupId> {
        let id = self.allocate_group_id();
        let group = Group::from_params(id, params, self.state.reference_point);
        self.state.groups.push(group);
        let index = self.state.groups.len() - 1;
        self.state.current_index = Some(index);

        self.regenerate_prototypes(index)?;
        self.persist(index)?;
        info!(
            "event=group_create module=engine status=ok group_id={id} groups={}",
            self.state.groups.len()
        );
        self.refresh()?;
        Ok(id)
    }

    /// Applies panel parameters to the current group in place.
    pub fn update_group(&mut self, params: &GroupParams) -> EngineResult<()> {
        let Some(index) = self.guard("group_update") else {
            return Ok(());
        };
        self.state.groups[index].apply_params(params);
        self.regenerate_prototypes(index)?;
        self.persist(index)?;
        debug!(
            "event=group_update module=engine status=ok group_id={}",
            self.state.groups[index].id
        );
        self.refresh()
    }

    /// Moves the current group pointer by one, clamped to the collection.
    pub fn switch_group(&mut self, direction: SwitchDirection) -> EngineResult<()> {
        let Some(index) = self.guard("group_switch") else {
            return Ok(());
        };
        let target = match direction {
            SwitchDirection::Prev if index > 0 => index - 1,
            SwitchDirection::Next if index + 1 < self.state.groups.len() => index + 1,
            _ => {
                debug!("event=group_switch module=engine status=skip reason=boundary index={index}");
                return Ok(());
            }
        };

        self.state.current_index = Some(target);
        let group = &self.state.groups[target];
        self.state.reference_point = group.reference_point;
        if !group.advance_dir.is_vertical() {
            self.state.saved_direction = Some(group.advance_dir);
        }
        debug!("event=group_switch module=engine status=ok from={index} to={target}");
        self.refresh()
    }

    /// Overwrites the reference point, millimeters.
    pub fn set_reference_point(&mut self, x: f64, y: f64, z: f64) -> EngineResult<()> {
        let Some(index) = self.guard("reference_set") else {
            return Ok(());
        };
        self.move_reference_to(index, Point3::new(x, y, z))?;
        self.refresh()
    }

    pub fn reset_reference_point(&mut self) -> EngineResult<()> {
        let Some(index) = self.guard("reference_reset") else {
            return Ok(());
        };
        self.move_reference_to(index, Point3::ORIGIN)?;
        self.refresh()
    }

    /// Takes the reference point from the single selected host instance.
    ///
    /// # Errors
    /// - `EngineError::Selection` when the host has no single valid selection;
    ///   state is left untouched.
    pub fn set_reference_point_from_selection(&mut self) -> EngineResult<()> {
        let origin = self.host.selection().single_selected_origin().map_err(|err| {
            warn!("event=reference_from_selection module=engine status=error error={err}");
            err
        })?;
        let point = self.config.host_unit.point_to_mm(origin);

        match self.state.current_index {
            Some(index) => self.move_reference_to(index, point)?,
            None => self.state.reference_point = point,
        }
        self.refresh()
    }

    pub fn set_note_duration(&mut self, duration: NoteDuration) -> EngineResult<()> {
        self.state.current_duration = duration;
        debug!("event=duration_set module=engine status=ok duration={duration}");
        self.refresh()
    }

    /// Moves the reference point one note forward (a rest when standalone).
    pub fn advance_reference_point(&mut self) -> EngineResult<()> {
        let Some(index) = self.guard("reference_advance") else {
            return Ok(());
        };
        self.advance_from(index)?;
        self.refresh()
    }

    /// Advances, then places a note of the current duration at `angle`.
    pub fn place_note(&mut self, angle: NoteAngle) -> EngineResult<Option<PlacementRecord>> {
        let Some(index) = self.guard("note_place") else {
            return Ok(None);
        };

        let duration = self.state.current_duration;
        let group = &self.state.groups[index];
        let group_id = group.id;
        let point = self.state.reference_point + group.step(duration);
        let prototype = group.prototype_name(duration);
        let pre_rotation = self.config.pre_rotation.axis_for(group.advance_dir);
        let rotation_axis = group.rotation_axis;
        let at = self.config.host_unit.point_from_mm(point);

        // State moves only once the host holds a fully rotated instance.
        let geometry = self.host.geometry();
        let handle = geometry.create_instance(&prototype, at)?;
        let rotated = pre_rotation
            .map_or(Ok(()), |axis| {
                geometry.rotate_instance(handle, at, axis, PRE_ROTATION_DEGREES)
            })
            .and_then(|()| geometry.rotate_instance(handle, at, rotation_axis, angle.degrees()));
        if let Err(err) = rotated {
            if let Err(cleanup) = geometry.delete_instance(handle) {
                warn!("event=note_place module=engine status=error stage=cleanup error={cleanup}");
            }
            warn!("event=note_place module=engine status=error stage=rotate error={err}");
            return Err(err.into());
        }

        let record = PlacementRecord {
            handle,
            duration,
            group_id,
        };
        self.push_history(record);
        self.state.last_action = LastAction::Placement;
        self.move_reference_to(index, point)?;
        debug!(
            "event=note_place module=engine status=ok group_id={group_id} duration={duration} key={} angle={}",
            angle.key(),
            angle.degrees()
        );
        self.refresh()?;
        Ok(Some(record))
    }

    /// Removes the last placed note and un-consumes its spacing.
    ///
    /// Returns the popped record, or `None` when the history is empty. A
    /// record whose handle the host no longer knows is dropped without moving
    /// the reference point.
    pub fn undo_last_placement(&mut self) -> EngineResult<Option<PlacementRecord>> {
        let Some(record) = self.state.history.pop_back() else {
            debug!("event=note_undo module=engine status=skip reason=empty_history");
            return Ok(None);
        };

        if !self.host.geometry().delete_instance(record.handle)? {
            warn!(
                "event=note_undo module=engine status=skip reason=stale_handle handle={}",
                record.handle
            );
            return Ok(Some(record));
        }

        if let Some(index) = self.state.current_index {
            let step = self.state.groups[index].step(record.duration);
            let point = self.state.reference_point - step;
            self.move_reference_to(index, point)?;
        }
        debug!(
            "event=note_undo module=engine status=ok duration={} remaining={}",
            record.duration,
            self.state.history.len()
        );
        self.refresh()?;
        Ok(Some(record))
    }

    /// `base_spacing = length`.
    pub fn sync_spacing_to_length(&mut self) -> EngineResult<()> {
        let Some(index) = self.guard("spacing_sync") else {
            return Ok(());
        };
        let group = &mut self.state.groups[index];
        group.base_spacing = group.length;
        group.standard_spacing = group.base_spacing.abs();
        self.persist(index)?;
        self.refresh()
    }

    /// `width = length`.
    pub fn sync_width_to_length(&mut self) -> EngineResult<()> {
        let Some(index) = self.guard("width_sync") else {
            return Ok(());
        };
        let group = &mut self.state.groups[index];
        group.width = group.length;
        group.standard_width = group.width;
        self.regenerate_prototypes(index)?;
        self.persist(index)?;
        self.refresh()
    }

    /// Flips the travel direction and the spacing sign.
    pub fn reverse_spacing(&mut self) -> EngineResult<()> {
        let Some(index) = self.guard("spacing_reverse") else {
            return Ok(());
        };
        let policy = self.config.z_reverse_policy;
        let group = &mut self.state.groups[index];
        group.advance_dir = group.advance_dir.reversed(policy);
        group.base_spacing = -group.base_spacing;
        group.standard_spacing = group.base_spacing.abs();
        debug!(
            "event=spacing_reverse module=engine status=ok group_id={} direction={}",
            group.id, group.advance_dir
        );
        self.persist(index)?;
        self.refresh()
    }

    /// `value += standard * delta`.
    ///
    /// An adjustment that would collapse a box dimension to zero or below is
    /// skipped.
    pub fn adjust_dimension(&mut self, dimension: Dimension, delta: i32) -> EngineResult<()> {
        let Some(index) = self.guard("dimension_adjust") else {
            return Ok(());
        };
        let group = &mut self.state.groups[index];
        let next = group.dimension(dimension) + group.standard(dimension) * f64::from(delta);
        if dimension.affects_geometry() && next <= 0.0 {
            warn!(
                "event=dimension_adjust module=engine status=skip reason=non_positive dimension={} value={next}",
                dimension.as_str()
            );
            return Ok(());
        }
        group.set_dimension(dimension, next);
        if dimension.affects_geometry() {
            self.regenerate_prototypes(index)?;
        }
        self.persist(index)?;
        self.refresh()
    }

    /// Halves a quantity and rebases its adjustment step to the new value.
    pub fn reduce_half_dimension(&mut self, dimension: Dimension) -> EngineResult<()> {
        let Some(index) = self.guard("dimension_halve") else {
            return Ok(());
        };
        let group = &mut self.state.groups[index];
        let halved = group.dimension(dimension) / 2.0;
        group.set_dimension(dimension, halved);
        group.set_standard(dimension, halved);
        if dimension.affects_geometry() {
            self.regenerate_prototypes(index)?;
        }
        self.persist(index)?;
        self.refresh()
    }

    /// Turns or re-points the travel direction.
    ///
    /// Forks the current group under a fresh id unless the previous action was
    /// also a direction change. Relative turns are ignored while traveling
    /// along Z.
    pub fn update_direction(&mut self, target: DirectionTarget) -> EngineResult<()> {
        let Some(index) = self.guard("direction_update") else {
            return Ok(());
        };
        let old_direction = self.state.groups[index].advance_dir;
        let new_direction = match target {
            DirectionTarget::Explicit(direction) => direction,
            DirectionTarget::Turn(turn) => match old_direction.turned(turn) {
                Some(direction) => direction,
                None => {
                    debug!(
                        "event=direction_update module=engine status=skip reason=vertical_travel direction={old_direction}"
                    );
                    return Ok(());
                }
            },
        };

        let index = if self.state.last_action == LastAction::DirectionChange {
            index
        } else {
            self.fork_group(index)
        };

        let reference_point = self.state.reference_point;
        let group = &mut self.state.groups[index];
        group.advance_dir = new_direction;
        let (old_axis, new_axis) = (old_direction.axis(), new_direction.axis());
        if old_axis != new_axis && group.rotation_axis == old_axis {
            group.rotation_axis = new_axis;
        }
        group.reference_point = reference_point;
        debug!(
            "event=direction_update module=engine status=ok group_id={} from={old_direction} to={new_direction} rotation_axis={}",
            group.id, group.rotation_axis
        );

        self.regenerate_prototypes(index)?;
        self.persist(index)?;
        self.state.last_action = LastAction::DirectionChange;
        self.refresh()
    }

    /// Removes the current group, its prototypes, record and history entries.
    pub fn delete_current_group(&mut self) -> EngineResult<()> {
        let Some(index) = self.guard("group_delete") else {
            return Ok(());
        };
        let group = self.state.groups.remove(index);

        let geometry = self.host.geometry();
        for duration in NoteDuration::ALL {
            geometry.delete_prototype(&group.prototype_name(duration))?;
        }
        self.host.store().delete_group_record(group.id)?;
        self.state
            .history
            .retain(|record| record.group_id != group.id);

        if self.state.groups.is_empty() {
            self.state.current_index = None;
            self.state.saved_direction = None;
            if self.config.guide_line_preview {
                self.host.geometry().clear_guide_line()?;
            }
        } else {
            let next = index.min(self.state.groups.len() - 1);
            self.state.current_index = Some(next);
            self.state.reference_point = self.state.groups[next].reference_point;
        }
        info!(
            "event=group_delete module=engine status=ok group_id={} remaining={}",
            group.id,
            self.state.groups.len()
        );
        self.refresh()
    }

    /// Replaces all groups with decoded records.
    ///
    /// Records that fail to decode, or repeat an id already seen, are skipped
    /// with a warning. Returns the number of groups loaded.
    pub fn load_groups<S: AsRef<str>>(&mut self, records: &[S]) -> EngineResult<usize> {
        let mut groups = Vec::with_capacity(records.len());
        for raw in records {
            match decode_group_record(raw.as_ref(), self.config.legacy_record_unit) {
                Ok(group) => groups.push(group),
                Err(err) => warn!("event=group_load module=engine status=skip error={err}"),
            }
        }
        groups.sort_by_key(|group| group.id);
        groups.dedup_by_key(|group| group.id);

        self.state.next_group_id = groups.last().map_or(1, |group| group.id + 1);
        self.state.current_index = if groups.is_empty() { None } else { Some(0) };
        if let Some(first) = groups.first() {
            self.state.reference_point = first.reference_point;
        }
        self.state
            .history
            .retain(|record| groups.iter().any(|group| group.id == record.group_id));
        self.state.groups = groups;
        self.state.saved_direction = None;
        self.state.last_action = LastAction::None;

        let loaded = self.state.groups.len();
        info!("event=group_load module=engine status=ok groups={loaded}");
        if loaded == 0 && self.config.guide_line_preview {
            self.host.geometry().clear_guide_line()?;
        }
        self.refresh()?;
        Ok(loaded)
    }

    /// Loads every record the store holds.
    pub fn load_groups_from_store(&mut self) -> EngineResult<usize> {
        let records = self.host.store().load_all_group_records()?;
        self.load_groups(&records)
    }

    fn guard(&self, event: &str) -> Option<usize> {
        if self.state.current_index.is_none() {
            debug!("event={event} module=engine status=skip reason=no_group");
        }
        self.state.current_index
    }

    fn allocate_group_id(&mut self) -> GroupId {
        let after_existing = self
            .state
            .groups
            .iter()
            .map(|group| group.id + 1)
            .max()
            .unwrap_or(1);
        let id = self.state.next_group_id.max(after_existing).max(1);
        self.state.next_group_id = id + 1;
        id
    }

    fn fork_group(&mut self, index: usize) -> usize {
        let mut forked = self.state.groups[index].clone();
        forked.id = self.allocate_group_id();
        debug!(
            "event=group_fork module=engine status=ok from={} to={}",
            self.state.groups[index].id, forked.id
        );
        self.state.groups.push(forked);
        let forked_index = self.state.groups.len() - 1;
        self.state.current_index = Some(forked_index);
        forked_index
    }

    fn advance_from(&mut self, index: usize) -> EngineResult<()> {
        let step = self.state.groups[index].step(self.state.current_duration);
        let point = self.state.reference_point + step;
        self.move_reference_to(index, point)?;
        self.state.last_action = LastAction::Placement;
        Ok(())
    }

    fn move_reference_to(&mut self, index: usize, point: Point3) -> EngineResult<()> {
        self.state.reference_point = point;
        self.state.groups[index].reference_point = point;
        self.persist(index)
    }

    fn push_history(&mut self, record: PlacementRecord) {
        self.state.history.push_back(record);
        if let Some(capacity) = self.config.history_capacity {
            while self.state.history.len() > capacity {
                self.state.history.pop_front();
            }
        }
    }

    fn regenerate_prototypes(&mut self, index: usize) -> EngineResult<()> {
        let unit = self.config.host_unit;
        let group = &self.state.groups[index];
        let geometry = self.host.geometry();
        for duration in NoteDuration::ALL {
            let name = group.prototype_name(duration);
            geometry.clear_prototype(&name)?;
            geometry.create_box_prototype(
                &name,
                BoxDimensions {
                    length: unit.from_mm(group.note_length(duration)),
                    width: unit.from_mm(group.width),
                    height: unit.from_mm(group.height),
                },
            )?;
        }
        Ok(())
    }

    fn persist(&mut self, index: usize) -> EngineResult<()> {
        let group = &self.state.groups[index];
        let data = encode_group_record(group)?;
        self.host.store().save_group_record(group.id, &data)?;
        Ok(())
    }

    fn refresh(&mut self) -> EngineResult<()> {
        if self.config.guide_line_preview {
            if let Some((start, end)) = self.guide_line() {
                let unit = self.config.host_unit;
                self.host
                    .geometry()
                    .draw_guide_line(unit.point_from_mm(start), unit.point_from_mm(end))?;
            }
        }
        let snapshot = self.snapshot();
        self.host.display().show_group(snapshot.as_ref())?;
        Ok(())
    }
}
