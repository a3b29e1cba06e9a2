use crate::core::models::structure::StructureFile;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading molecular structure file formats.
///
/// Implementors handle format-specific parsing and return a fully assembled
/// [`StructureFile`]. Readers never write; derived geometry is an output of the
/// engine, not of the file layer.
pub trait MolecularFile {
    /// The error type for read operations.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails or the input holds no usable atoms.
    fn read_from(reader: &mut impl BufRead) -> Result<StructureFile, Self::Error>;

    /// Reads a structure from in-memory text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text holds no usable atoms.
    fn read_from_str(text: &str) -> Result<StructureFile, Self::Error> {
        let mut reader = text.as_bytes();
        Self::read_from(&mut reader)
    }

    /// Reads a structure from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<StructureFile, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
