//! Host-facing command surface for the note placement engine.

pub mod api;
