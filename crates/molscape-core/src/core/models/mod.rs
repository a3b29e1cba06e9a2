//! # Core Models Module
//!
//! This module contains the data structures used to represent a parsed structure file.
//!
//! ## Key Components
//!
//! - [`element`] - Chemical elements with van der Waals radii and valence limits
//! - [`residue`] - Residue codes and the per-residue record inside a model
//! - [`chain`] - Chain labels and chain segments
//! - [`secondary`] - Helix / sheet / loop classification
//! - [`atom`] - A single parsed atom with its residue and chain metadata
//! - [`builder`] - Incremental model assembly with duplicate suppression
//! - [`model`] - One structural frame with arenas for residues and chains
//! - [`structure`] - File-level metadata plus the ordered list of models
//! - [`snapshot`] - Lightweight atom views consumed by the geometry algorithms
//! - [`ids`] - Arena keys for residues and chains
//!
//! ## Usage
//!
//! ```ignore
//! use molscape::core::io::pdb::PdbFile;
//! use molscape::core::io::traits::MolecularFile;
//!
//! let structure = PdbFile::read_from_str(text)?;
//! let model = structure.first_model().expect("parsed structures hold at least one model");
//! for atom in model.atoms() {
//!     println!("{} {:?} {}", atom.index, atom.element, atom.position);
//! }
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod element;
pub mod ids;
pub mod model;
pub mod residue;
pub mod secondary;
pub mod snapshot;
pub mod structure;
