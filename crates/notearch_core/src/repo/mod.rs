//! Group record persistence.
//!
//! # Responsibility
//! - Define the persisted JSON shape of a group and migrate legacy shapes.
//! - Define the record store contract used by the placement engine, with
//!   SQLite and in-memory implementations.
//!
//! # Invariants
//! - Records are keyed `GroupData_{id}`.
//! - Written records are always tagged `format=full`, `unit=mm`.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod group_record;
pub mod group_store;
