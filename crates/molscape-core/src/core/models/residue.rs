use super::ids::ChainId;
use super::secondary::SecondaryStructure;
use crate::core::utils::identifiers;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum ResidueType {
    // --- Aliphatic, Nonpolar ---
    Alanine,    // ALA
    Glycine,    // GLY
    Isoleucine, // ILE
    Leucine,    // LEU
    Proline,    // PRO
    Valine,     // VAL

    // --- Aromatic ---
    Phenylalanine, // PHE
    Tryptophan,    // TRP
    Tyrosine,      // TYR

    // --- Polar, Uncharged ---
    Asparagine, // ASN
    Cysteine,   // CYS
    Glutamine,  // GLN
    Serine,     // SER
    Threonine,  // THR
    Methionine, // MET

    // --- Charged ---
    Arginine,     // ARG
    Histidine,    // HIS
    Lysine,       // LYS
    AsparticAcid, // ASP
    GlutamicAcid, // GLU

    // --- Ribonucleotides ---
    Adenosine, // A
    Cytidine,  // C
    Guanosine, // G
    Uridine,   // U

    // --- Deoxyribonucleotides ---
    Deoxyadenosine, // DA
    Deoxycytidine,  // DC
    Deoxyguanosine, // DG
    Deoxythymidine, // DT

    #[default]
    Unknown,
}

impl ResidueType {
    /// Resolves a residue name by exact match on its (trimmed) three-letter code.
    ///
    /// Names outside the standard set resolve to [`ResidueType::Unknown`].
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "ALA" => Self::Alanine,
            "GLY" => Self::Glycine,
            "ILE" => Self::Isoleucine,
            "LEU" => Self::Leucine,
            "PRO" => Self::Proline,
            "VAL" => Self::Valine,
            "PHE" => Self::Phenylalanine,
            "TRP" => Self::Tryptophan,
            "TYR" => Self::Tyrosine,
            "ASN" => Self::Asparagine,
            "CYS" => Self::Cysteine,
            "GLN" => Self::Glutamine,
            "SER" => Self::Serine,
            "THR" => Self::Threonine,
            "MET" => Self::Methionine,
            "ARG" => Self::Arginine,
            "HIS" => Self::Histidine,
            "LYS" => Self::Lysine,
            "ASP" => Self::AsparticAcid,
            "GLU" => Self::GlutamicAcid,
            "A" => Self::Adenosine,
            "C" => Self::Cytidine,
            "G" => Self::Guanosine,
            "U" => Self::Uridine,
            "DA" => Self::Deoxyadenosine,
            "DC" => Self::Deoxycytidine,
            "DG" => Self::Deoxyguanosine,
            "DT" => Self::Deoxythymidine,
            _ => Self::Unknown,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Alanine => "ALA",
            Self::Glycine => "GLY",
            Self::Isoleucine => "ILE",
            Self::Leucine => "LEU",
            Self::Proline => "PRO",
            Self::Valine => "VAL",
            Self::Phenylalanine => "PHE",
            Self::Tryptophan => "TRP",
            Self::Tyrosine => "TYR",
            Self::Asparagine => "ASN",
            Self::Cysteine => "CYS",
            Self::Glutamine => "GLN",
            Self::Serine => "SER",
            Self::Threonine => "THR",
            Self::Methionine => "MET",
            Self::Arginine => "ARG",
            Self::Histidine => "HIS",
            Self::Lysine => "LYS",
            Self::AsparticAcid => "ASP",
            Self::GlutamicAcid => "GLU",
            Self::Adenosine => "A",
            Self::Cytidine => "C",
            Self::Guanosine => "G",
            Self::Uridine => "U",
            Self::Deoxyadenosine => "DA",
            Self::Deoxycytidine => "DC",
            Self::Deoxyguanosine => "DG",
            Self::Deoxythymidine => "DT",
            Self::Unknown => "UNK",
        }
    }

    pub fn is_amino_acid(&self) -> bool {
        !self.is_nucleotide() && *self != Self::Unknown
    }

    pub fn is_nucleotide(&self) -> bool {
        matches!(
            self,
            Self::Adenosine
                | Self::Cytidine
                | Self::Guanosine
                | Self::Uridine
                | Self::Deoxyadenosine
                | Self::Deoxycytidine
                | Self::Deoxyguanosine
                | Self::Deoxythymidine
        )
    }
}

impl FromStr for ResidueType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_code(s))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_code())
    }
}

/// Coarse physico-chemical class of a residue, used to pick a surface material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidueClass {
    Hydrophobic,
    Polar,
    Acidic,
    Basic,
    #[default]
    Default,
}

impl ResidueClass {
    /// Classifies a residue by name; names missing from the table are `Default`.
    pub fn from_residue_name(name: &str) -> Self {
        identifiers::residue_class(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: i32,                        // Residue sequence number from source file
    pub insertion_code: Option<char>,       // Insertion code, if any
    pub name: String,                       // Residue name as written (e.g., "ALA", "HOH")
    pub residue_type: ResidueType,          // Resolved residue code
    pub chain_id: ChainId,                  // Parent chain segment
    pub secondary: SecondaryStructure,      // Exactly one classification per residue
    pub(crate) atoms: Vec<usize>,           // Indices into the model's atom sequence
    atom_name_map: HashMap<String, usize>,  // First atom index seen for each atom name
}

impl Residue {
    pub(crate) fn new(
        number: i32,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
    ) -> Self {
        Self {
            number,
            insertion_code,
            name: name.to_string(),
            residue_type: ResidueType::from_code(name),
            chain_id,
            secondary: SecondaryStructure::default(),
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_index: usize) {
        self.atoms.push(atom_index);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_index);
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn atom_index_by_name(&self, name: &str) -> Option<usize> {
        self.atom_name_map.get(name).copied()
    }

    pub fn class(&self) -> ResidueClass {
        ResidueClass::from_residue_name(&self.name)
    }
}
