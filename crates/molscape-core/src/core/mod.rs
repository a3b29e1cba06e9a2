//! # Core Module
//!
//! This module provides the immutable building blocks every derivation in molscape is
//! computed from.
//!
//! ## Overview
//!
//! A structure file is parsed exactly once into a [`models::structure::StructureFile`]
//! holding one or more [`models::model::Model`] frames. Atoms inside a model are
//! addressed by a stable index into the model's atom sequence; residues and chains are
//! stored in arenas and addressed by key. Nothing in this module owns rendering state.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Elements, residues, chains, atoms,
//!   models and the file-level container
//! - **File I/O** ([`io`]) - Fixed-column record parsing and model assembly
//! - **Utilities** ([`utils`]) - Static lookup tables and small vector helpers
//!
//! ## Tolerance
//!
//! Structure files in the wild are frequently truncated or hand-edited. The reader
//! skips malformed lines instead of aborting, maps unknown element symbols to
//! [`models::element::Element::Unknown`], and only refuses a file that contains no
//! atoms at all.

pub mod io;
pub mod models;
pub mod utils;
