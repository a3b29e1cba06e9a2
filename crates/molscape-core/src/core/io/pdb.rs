use super::records::{Record, RecordSet, remark_energy};
use super::traits::MolecularFile;
use crate::core::models::builder::{ModelBuilder, NewAtom};
use crate::core::models::model::Model;
use crate::core::models::secondary::SecondaryStructureMap;
use crate::core::models::structure::StructureFile;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No atoms found in structure ({skipped} malformed lines skipped)")]
    EmptyStructure { skipped: usize },
}

/// Reader for the fixed-column PDB record subset.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<StructureFile, Self::Error> {
        let records = RecordSet::read_from(reader)?;
        assemble(records)
    }
}

struct ModelAssembler<'a> {
    secondary: &'a SecondaryStructureMap,
    models: Vec<Model>,
    current: Option<ModelBuilder>,
    next_number: u32,
    pending_energy: Option<f64>,
    duplicates: usize,
}

impl<'a> ModelAssembler<'a> {
    fn new(secondary: &'a SecondaryStructureMap) -> Self {
        Self {
            secondary,
            models: Vec::new(),
            current: None,
            next_number: 1,
            pending_energy: None,
            duplicates: 0,
        }
    }

    fn open(&mut self, serial: Option<u32>) {
        self.close();
        let number = serial.unwrap_or(self.next_number);
        self.next_number = number.saturating_add(1).max(self.next_number);
        let mut builder = ModelBuilder::new(number);
        if let Some(energy) = self.pending_energy.take() {
            builder.set_energy(energy);
        }
        self.current = Some(builder);
    }

    fn close(&mut self) {
        let Some(mut builder) = self.current.take() else {
            return;
        };
        self.duplicates += builder.duplicates();
        if builder.atom_count() == 0 {
            debug!("Dropping empty model");
            return;
        }
        builder.apply_secondary(self.secondary);
        self.models.push(builder.build());
    }

    fn finish(mut self) -> (Vec<Model>, usize) {
        self.close();
        (self.models, self.duplicates)
    }
}

/// Assembles models from a parsed record set.
///
/// `MODEL` opens a model and `ENDMDL` closes it; atoms found outside any model
/// open an implicit one, so a single-frame file yields exactly one model. Models
/// that end up without atoms are dropped.
///
/// # Errors
///
/// Returns [`PdbError::EmptyStructure`] if no model received a single atom.
pub fn assemble(records: RecordSet) -> Result<StructureFile, PdbError> {
    let mut assembler = ModelAssembler::new(&records.secondary);

    for record in &records.stream {
        match record {
            Record::Model(serial) => assembler.open(*serial),
            Record::EndModel => assembler.close(),
            Record::Terminator => {
                if let Some(builder) = assembler.current.as_mut() {
                    builder.terminate_chain();
                }
            }
            Record::Remark(text) => {
                if let Some(energy) = remark_energy(text) {
                    match assembler.current.as_mut() {
                        Some(builder) => {
                            builder.set_energy(energy);
                        }
                        None => assembler.pending_energy = Some(energy),
                    }
                }
            }
            Record::Atom(atom) => {
                if assembler.current.is_none() {
                    debug!(line = atom.line_number, "Atom outside MODEL/ENDMDL, opening implicit model");
                    assembler.open(None);
                }
                let Some(builder) = assembler.current.as_mut() else {
                    continue;
                };
                builder.start_chain(&atom.chain);
                builder.add_atom(NewAtom {
                    serial: atom.serial,
                    name: &atom.name,
                    element: atom.element,
                    position: atom.position,
                    residue_name: &atom.residue_name,
                    residue_number: atom.residue_number,
                    insertion_code: atom.insertion_code,
                    is_hetero: atom.is_hetero,
                    line_number: atom.line_number,
                });
            }
            Record::Header { .. }
            | Record::Title(_)
            | Record::Author(_)
            | Record::Helix(_)
            | Record::Sheet(_)
            | Record::End => {}
        }
    }

    let (models, duplicates) = assembler.finish();
    if models.is_empty() {
        return Err(PdbError::EmptyStructure {
            skipped: records.skipped.len(),
        });
    }

    let mut structure = StructureFile::new(models);
    structure.title = records.title();
    structure.authors = records.authors();
    structure.identifier = records.header.identifier;
    structure.classification = records.header.classification;
    structure.deposition_date = records.header.deposition_date;

    info!(
        models = structure.model_count(),
        atoms = structure.total_atoms(),
        skipped_lines = records.skipped.len(),
        duplicate_atoms = duplicates,
        alternate_conformers = records.alternate_conformers,
        "Assembled structure"
    );
    Ok(structure)
}
