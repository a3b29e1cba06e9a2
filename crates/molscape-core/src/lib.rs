//! # molscape Core Library
//!
//! Parses Protein Data Bank structure files into a typed atomic model and derives the
//! geometric primitives needed to draw a molecule as ball-and-stick, space-filling,
//! ribbon/cartoon, or an approximate residue surface.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture so that parsing, geometry and
//! orchestration can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Immutable data models (`StructureFile`, `Model`,
//!   `Atom`), static element and residue tables, and the fixed-column PDB reader.
//!
//! - **[`engine`]: The Algorithms.** Pure functions over an atom snapshot: valence-ranked
//!   bond inference, backbone extraction, spline ribbons segmented by secondary
//!   structure, the grid-based space-filling relaxation solver and the residue surface
//!   approximator. Cancellation and progress reporting live here as well.
//!
//! - **[`workflows`]: The Public API.** A thin dispatcher that selects one
//!   representation, runs its derivation and returns plain geometry ready for a
//!   renderer.

pub mod core;
pub mod engine;
pub mod workflows;
