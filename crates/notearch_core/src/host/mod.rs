//! External collaborator contracts.
//!
//! # Responsibility
//! - Isolate the CAD host behind narrow geometry, selection and presentation
//!   interfaces; persistence lives in `repo::group_store`.
//! - Bundle the four collaborators for the placement engine.
//!
//! # Invariants
//! - Geometry and selection hosts speak the configured host unit; the engine
//!   converts at this boundary.
//! - A placed instance handle is owned by the geometry host until deleted.

pub mod memory;

use crate::model::direction::Axis;
use crate::model::geometry::Point3;
use crate::model::group::GroupSnapshot;
use crate::repo::group_store::GroupRecordStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type HostResult<T> = Result<T, HostError>;

/// Opaque handle to a placed note instance, minted by the geometry host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(Uuid);

impl InstanceHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InstanceHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Box size of a note prototype, in host units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Host fault raised by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Geometry(String),
    Presentation(String),
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometry(message) => write!(f, "geometry host failed: {message}"),
            Self::Presentation(message) => write!(f, "presentation host failed: {message}"),
        }
    }
}

impl Error for HostError {}

/// Why the host selection cannot supply a reference point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    NothingSelected,
    MultipleSelected(usize),
    NotAnInstance,
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingSelected => f.write_str("select one component instance"),
            Self::MultipleSelected(count) => {
                write!(f, "select exactly one component instance, got {count}")
            }
            Self::NotAnInstance => f.write_str("selected object is not a component instance"),
        }
    }
}

impl Error for SelectionError {}

/// Scene graph operations needed by placement.
pub trait GeometryHost {
    /// Creates (or refills) a box prototype centered on its local origin.
    fn create_box_prototype(&mut self, name: &str, dimensions: BoxDimensions) -> HostResult<()>;
    /// Empties a prototype's geometry without removing the prototype.
    fn clear_prototype(&mut self, name: &str) -> HostResult<()>;
    fn create_instance(&mut self, prototype: &str, at: Point3) -> HostResult<InstanceHandle>;
    fn rotate_instance(
        &mut self,
        handle: InstanceHandle,
        center: Point3,
        axis: Axis,
        degrees: f64,
    ) -> HostResult<()>;
    /// Returns `false` when the handle no longer refers to a live instance.
    fn delete_instance(&mut self, handle: InstanceHandle) -> HostResult<bool>;
    /// Removing a missing prototype is not an error.
    fn delete_prototype(&mut self, name: &str) -> HostResult<()>;
    /// Replaces the guide-line preview.
    fn draw_guide_line(&mut self, start: Point3, end: Point3) -> HostResult<()>;
    fn clear_guide_line(&mut self) -> HostResult<()>;
}

/// Host selection lookup.
pub trait SelectionHost {
    /// Origin of the single selected instance, in host units.
    fn single_selected_origin(&mut self) -> Result<Point3, SelectionError>;
}

/// Panel display sink.
pub trait PresentationHost {
    /// `None` resets the panel to its defaults (no group selected).
    fn show_group(&mut self, snapshot: Option<&GroupSnapshot>) -> HostResult<()>;
}

/// The collaborator set a placement engine runs against.
pub trait EngineHost {
    fn geometry(&mut self) -> &mut dyn GeometryHost;
    fn store(&mut self) -> &mut dyn GroupRecordStore;
    fn selection(&mut self) -> &mut dyn SelectionHost;
    fn display(&mut self) -> &mut dyn PresentationHost;
}

/// Plain bundle of four collaborators.
#[derive(Debug, Default)]
pub struct HostSet<G, S, Q, P> {
    pub geometry: G,
    pub store: S,
    pub selection: Q,
    pub display: P,
}

impl<G, S, Q, P> HostSet<G, S, Q, P> {
    pub fn new(geometry: G, store: S, selection: Q, display: P) -> Self {
        Self {
            geometry,
            store,
            selection,
            display,
        }
    }
}

impl<G, S, Q, P> EngineHost for HostSet<G, S, Q, P>
where
    G: GeometryHost,
    S: GroupRecordStore,
    Q: SelectionHost,
    P: PresentationHost,
{
    fn geometry(&mut self) -> &mut dyn GeometryHost {
        &mut self.geometry
    }

    fn store(&mut self) -> &mut dyn GroupRecordStore {
        &mut self.store
    }

    fn selection(&mut self) -> &mut dyn SelectionHost {
        &mut self.selection
    }

    fn display(&mut self) -> &mut dyn PresentationHost {
        &mut self.display
    }
}
