//! Geometry derivations over an atom snapshot.
//!
//! Each task is a pure function: it reads a slice of [`AtomSnapshot`] values (or the
//! immutable [`Model`] they were taken from) and returns freshly allocated geometry.
//! None of them mutate their input, so a caller may run several tasks on the same
//! snapshot, or discard a cancelled result, without cleanup.
//!
//! [`AtomSnapshot`]: crate::core::models::snapshot::AtomSnapshot
//! [`Model`]: crate::core::models::model::Model

pub mod backbone;
pub mod bonds;
pub mod relaxation;
pub mod ribbon;
pub mod surface;
