//! Database module: repository input models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: typed input models accepted by the repositories.
//! - `repo`: SQL-only functions that map rows into domain entities.
//!
//! External modules should import from `clinic_booking::db` — we re-export
//! the repository API and the input models for convenience.

pub mod model;
pub mod repo;

// Re-export the repository API at `crate::db::*`.
pub use repo::*;

pub use model::{NewAppointment, NewSlot, SlotPatch};
