//! Core placement logic for parametric note boxes.
//! This crate owns the placement state machine and its spacing/direction
//! algebra; the CAD host is reached only through the collaborator traits.

pub mod config;
pub mod db;
pub mod host;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod units;

pub use config::EngineConfig;
pub use host::memory::{LatestDisplay, MemoryHost, SceneGeometry, SessionHost};
pub use host::{
    BoxDimensions, EngineHost, GeometryHost, HostError, HostResult, HostSet, InstanceHandle,
    PresentationHost, SelectionError, SelectionHost,
};
pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig,
};
pub use model::direction::{Axis, Direction, PreRotationTable, Turn, ZReversePolicy};
pub use model::duration::{NoteAngle, NoteDuration};
pub use model::geometry::{Point3, Vector3};
pub use model::group::{Dimension, Group, GroupId, GroupParams, GroupSnapshot};
pub use repo::group_store::{
    GroupRecordStore, MemoryGroupStore, RepoError, RepoResult, SqliteGroupStore,
};
pub use service::command::{CommandOutcome, EngineCommand, NoteKey};
pub use service::placement_engine::{
    compute_spacing, direction_vector, DirectionTarget, EngineError, EngineResult, LastAction,
    PlacementEngine, PlacementRecord, SwitchDirection,
};
pub use units::LengthUnit;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
