use crate::error::{CliError, Result};
use molscape::core::io::pdb::PdbFile;
use molscape::core::io::traits::MolecularFile;
use molscape::core::models::structure::StructureFile;
use std::path::Path;
use tracing::info;

pub mod derive;
pub mod inspect;

fn load_structure(path: &Path) -> Result<StructureFile> {
    info!("Loading input structure from {:?}", path);
    PdbFile::read_from_path(path).map_err(|source| CliError::Structure {
        path: path.to_path_buf(),
        source,
    })
}
