//! Domain model for note placement.
//!
//! # Responsibility
//! - Define the parameter sets (`Group`) that govern a run of note placements.
//! - Define the closed vocabularies used by placement: durations, directions,
//!   rotation axes and note angles.
//!
//! # Invariants
//! - Every group is identified by a session-unique `GroupId`.
//! - All lengths are millimeters; unit conversion happens at host boundaries.

pub mod direction;
pub mod duration;
pub mod geometry;
pub mod group;
