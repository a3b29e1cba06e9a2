//! Provides input functionality for molecular structure files.
//!
//! Parsing happens in two passes. [`records`] turns each fixed-column line into a
//! typed record, tolerating malformed lines by skipping them. [`pdb`] then walks the
//! chronological record stream and assembles models, chain segments and residues.
//! Both passes are exposed through the [`traits::MolecularFile`] interface.

pub mod pdb;
pub mod records;
pub mod traits;
