//! Placement use-case services.
//!
//! # Responsibility
//! - Own the placement state machine and its spacing/direction algebra.
//! - Expose one typed command per engine operation for host bindings.
//!
//! # Invariants
//! - Every mutating operation is a guarded no-op while no group is selected.
//! - Engine state is never hidden in statics; each engine is one session.

pub mod command;
pub mod placement_engine;
