//! In-process collaborators.
//!
//! Two flavors share this module:
//! - Recording hosts (`RecordingGeometry`, `RecordingDisplay`) keep every
//!   call for assertions in tests.
//! - Scene hosts (`SceneGeometry`, `LatestDisplay`) keep only what a live
//!   session needs: prototypes, a bounded window of placed instances, the
//!   current guide line and the last panel snapshot.

use super::{
    BoxDimensions, GeometryHost, HostResult, HostSet, InstanceHandle, PresentationHost,
    SelectionError, SelectionHost,
};
use crate::model::direction::Axis;
use crate::model::geometry::Point3;
use crate::model::group::GroupSnapshot;
use crate::repo::group_store::{GroupRecordStore, MemoryGroupStore};
use log::debug;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// All-in-memory recording bundle for tests.
pub type MemoryHost = HostSet<RecordingGeometry, MemoryGroupStore, FixedSelection, RecordingDisplay>;

/// Bounded bundle for long-running sessions over any record store.
pub type SessionHost<S> = HostSet<SceneGeometry, S, FixedSelection, LatestDisplay>;

impl MemoryHost {
    pub fn in_memory() -> Self {
        HostSet::new(
            RecordingGeometry::default(),
            MemoryGroupStore::default(),
            FixedSelection::default(),
            RecordingDisplay::default(),
        )
    }
}

impl<S: GroupRecordStore> SessionHost<S> {
    /// `instance_capacity` bounds the tracked instances; pass the placement
    /// history capacity so every undoable handle stays known.
    pub fn session(store: S, instance_capacity: Option<usize>) -> Self {
        HostSet::new(
            SceneGeometry::with_capacity(instance_capacity),
            store,
            FixedSelection::default(),
            LatestDisplay::default(),
        )
    }
}

/// One geometry host call, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryCall {
    CreatePrototype {
        name: String,
        dimensions: BoxDimensions,
    },
    ClearPrototype(String),
    CreateInstance {
        prototype: String,
        at: Point3,
    },
    RotateInstance {
        center: Point3,
        axis: Axis,
        degrees: f64,
    },
    DeleteInstance {
        live: bool,
    },
    DeletePrototype(String),
    DrawGuideLine {
        start: Point3,
        end: Point3,
    },
    ClearGuideLine,
}

/// A placed note as the host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInstance {
    pub prototype: String,
    pub origin: Point3,
    /// `(axis, degrees)` in application order.
    pub rotations: Vec<(Axis, f64)>,
}

/// Geometry host remembering every call, for assertions.
#[derive(Debug, Default)]
pub struct RecordingGeometry {
    pub calls: Vec<GeometryCall>,
    pub prototypes: BTreeMap<String, BoxDimensions>,
    pub instances: HashMap<InstanceHandle, PlacedInstance>,
    pub guide_line: Option<(Point3, Point3)>,
}

impl RecordingGeometry {
    pub fn instance(&self, handle: InstanceHandle) -> Option<&PlacedInstance> {
        self.instances.get(&handle)
    }
}

impl GeometryHost for RecordingGeometry {
    fn create_box_prototype(&mut self, name: &str, dimensions: BoxDimensions) -> HostResult<()> {
        debug!("event=host_call module=memory_host call=create_box_prototype name={name}");
        self.prototypes.insert(name.to_string(), dimensions);
        self.calls.push(GeometryCall::CreatePrototype {
            name: name.to_string(),
            dimensions,
        });
        Ok(())
    }

    fn clear_prototype(&mut self, name: &str) -> HostResult<()> {
        self.calls.push(GeometryCall::ClearPrototype(name.to_string()));
        Ok(())
    }

    fn create_instance(&mut self, prototype: &str, at: Point3) -> HostResult<InstanceHandle> {
        let handle = InstanceHandle::new();
        self.instances.insert(
            handle,
            PlacedInstance {
                prototype: prototype.to_string(),
                origin: at,
                rotations: Vec::new(),
            },
        );
        self.calls.push(GeometryCall::CreateInstance {
            prototype: prototype.to_string(),
            at,
        });
        Ok(handle)
    }

    fn rotate_instance(
        &mut self,
        handle: InstanceHandle,
        center: Point3,
        axis: Axis,
        degrees: f64,
    ) -> HostResult<()> {
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.rotations.push((axis, degrees));
        }
        self.calls.push(GeometryCall::RotateInstance {
            center,
            axis,
            degrees,
        });
        Ok(())
    }

    fn delete_instance(&mut self, handle: InstanceHandle) -> HostResult<bool> {
        let live = self.instances.remove(&handle).is_some();
        self.calls.push(GeometryCall::DeleteInstance { live });
        Ok(live)
    }

    fn delete_prototype(&mut self, name: &str) -> HostResult<()> {
        self.prototypes.remove(name);
        self.calls.push(GeometryCall::DeletePrototype(name.to_string()));
        Ok(())
    }

    fn draw_guide_line(&mut self, start: Point3, end: Point3) -> HostResult<()> {
        self.guide_line = Some((start, end));
        self.calls.push(GeometryCall::DrawGuideLine { start, end });
        Ok(())
    }

    fn clear_guide_line(&mut self) -> HostResult<()> {
        self.guide_line = None;
        self.calls.push(GeometryCall::ClearGuideLine);
        Ok(())
    }
}

/// Selection host returning whatever the caller last set.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSelection {
    pub result: Result<Point3, SelectionError>,
}

impl Default for FixedSelection {
    fn default() -> Self {
        Self {
            result: Err(SelectionError::NothingSelected),
        }
    }
}

impl FixedSelection {
    pub fn select(&mut self, origin: Point3) {
        self.result = Ok(origin);
    }

    pub fn fail_with(&mut self, error: SelectionError) {
        self.result = Err(error);
    }
}

impl SelectionHost for FixedSelection {
    fn single_selected_origin(&mut self) -> Result<Point3, SelectionError> {
        self.result.clone()
    }
}

/// Presentation host keeping every pushed snapshot.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub updates: Vec<Option<GroupSnapshot>>,
}

impl RecordingDisplay {
    pub fn last(&self) -> Option<&Option<GroupSnapshot>> {
        self.updates.last()
    }
}

impl PresentationHost for RecordingDisplay {
    fn show_group(&mut self, snapshot: Option<&GroupSnapshot>) -> HostResult<()> {
        self.updates.push(snapshot.cloned());
        Ok(())
    }
}

/// Geometry host tracking live scene state only.
///
/// Instances older than `capacity` are forgotten; deleting a forgotten handle
/// reports it as stale.
#[derive(Debug, Default)]
pub struct SceneGeometry {
    prototypes: BTreeMap<String, BoxDimensions>,
    instances: VecDeque<(InstanceHandle, PlacedInstance)>,
    capacity: Option<usize>,
    guide_line: Option<(Point3, Point3)>,
}

impl SceneGeometry {
    /// `None` keeps every instance.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn prototype(&self, name: &str) -> Option<&BoxDimensions> {
        self.prototypes.get(name)
    }

    pub fn prototype_count(&self) -> usize {
        self.prototypes.len()
    }

    pub fn instance(&self, handle: InstanceHandle) -> Option<&PlacedInstance> {
        self.instances
            .iter()
            .find(|(candidate, _)| *candidate == handle)
            .map(|(_, instance)| instance)
    }

    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn guide_line(&self) -> Option<(Point3, Point3)> {
        self.guide_line
    }
}

impl GeometryHost for SceneGeometry {
    fn create_box_prototype(&mut self, name: &str, dimensions: BoxDimensions) -> HostResult<()> {
        self.prototypes.insert(name.to_string(), dimensions);
        Ok(())
    }

    fn clear_prototype(&mut self, name: &str) -> HostResult<()> {
        self.prototypes.remove(name);
        Ok(())
    }

    fn create_instance(&mut self, prototype: &str, at: Point3) -> HostResult<InstanceHandle> {
        let handle = InstanceHandle::new();
        self.instances.push_back((
            handle,
            PlacedInstance {
                prototype: prototype.to_string(),
                origin: at,
                rotations: Vec::new(),
            },
        ));
        if let Some(capacity) = self.capacity {
            while self.instances.len() > capacity {
                if let Some((forgotten, _)) = self.instances.pop_front() {
                    debug!("event=host_call module=scene_host call=forget_instance handle={forgotten}");
                }
            }
        }
        Ok(handle)
    }

    fn rotate_instance(
        &mut self,
        handle: InstanceHandle,
        _center: Point3,
        axis: Axis,
        degrees: f64,
    ) -> HostResult<()> {
        if let Some((_, instance)) = self
            .instances
            .iter_mut()
            .find(|(candidate, _)| *candidate == handle)
        {
            instance.rotations.push((axis, degrees));
        }
        Ok(())
    }

    fn delete_instance(&mut self, handle: InstanceHandle) -> HostResult<bool> {
        let position = self
            .instances
            .iter()
            .position(|(candidate, _)| *candidate == handle);
        Ok(position
            .and_then(|index| self.instances.remove(index))
            .is_some())
    }

    fn delete_prototype(&mut self, name: &str) -> HostResult<()> {
        self.prototypes.remove(name);
        Ok(())
    }

    fn draw_guide_line(&mut self, start: Point3, end: Point3) -> HostResult<()> {
        self.guide_line = Some((start, end));
        Ok(())
    }

    fn clear_guide_line(&mut self) -> HostResult<()> {
        self.guide_line = None;
        Ok(())
    }
}

/// Presentation host keeping only the latest snapshot.
#[derive(Debug, Default)]
pub struct LatestDisplay {
    current: Option<GroupSnapshot>,
}

impl LatestDisplay {
    pub fn current(&self) -> Option<&GroupSnapshot> {
        self.current.as_ref()
    }
}

impl PresentationHost for LatestDisplay {
    fn show_group(&mut self, snapshot: Option<&GroupSnapshot>) -> HostResult<()> {
        self.current = snapshot.cloned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SceneGeometry;
    use crate::host::{BoxDimensions, GeometryHost};
    use crate::model::direction::Axis;
    use crate::model::geometry::Point3;

    #[test]
    fn scene_forgets_oldest_instances_beyond_capacity() {
        let mut scene = SceneGeometry::with_capacity(Some(2));
        let first = scene.create_instance("HN_1", Point3::ORIGIN).unwrap();
        let second = scene.create_instance("HN_1", Point3::new(0.0, 10.0, 0.0)).unwrap();
        let third = scene.create_instance("HN_1", Point3::new(0.0, 20.0, 0.0)).unwrap();

        assert_eq!(scene.live_instances(), 2);
        assert!(scene.instance(first).is_none());
        assert!(!scene.delete_instance(first).unwrap());
        assert!(scene.delete_instance(third).unwrap());
        assert_eq!(scene.instance(second).unwrap().origin, Point3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn scene_tracks_prototypes_rotations_and_guide_line() {
        let mut scene = SceneGeometry::with_capacity(None);
        let dimensions = BoxDimensions {
            length: 10.0,
            width: 5.0,
            height: 2.0,
        };
        scene.create_box_prototype("FN_1", dimensions).unwrap();
        scene.create_box_prototype("FN_1", dimensions).unwrap();
        assert_eq!(scene.prototype_count(), 1);

        let handle = scene.create_instance("FN_1", Point3::ORIGIN).unwrap();
        scene.rotate_instance(handle, Point3::ORIGIN, Axis::Z, 90.0).unwrap();
        assert_eq!(scene.instance(handle).unwrap().rotations, vec![(Axis::Z, 90.0)]);

        scene.draw_guide_line(Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)).unwrap();
        assert!(scene.guide_line().is_some());
        scene.clear_guide_line().unwrap();
        assert!(scene.guide_line().is_none());

        scene.delete_prototype("FN_1").unwrap();
        assert!(scene.prototype("FN_1").is_none());
    }
}
