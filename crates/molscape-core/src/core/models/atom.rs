use super::chain::ChainLabel;
use super::element::Element;
use super::ids::ResidueId;
use super::residue::ResidueType;
use nalgebra::Point3;

/// A single parsed atom.
///
/// Atoms are immutable once a model has been assembled and are identified by their
/// `index` into the owning model's atom sequence. Residue and chain metadata are
/// carried on the atom itself so that consumers never have to re-derive them.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Position of this atom in the owning model's atom sequence.
    pub index: usize,
    /// Serial number as written in columns 7-11 (0 when blank).
    pub serial: i32,
    /// Atom name, trimmed (e.g., "CA", "OG1").
    pub name: String,
    /// Resolved chemical element.
    pub element: Element,
    /// Cartesian coordinates in Ångström.
    pub position: Point3<f64>,
    /// Residue name as written (e.g., "ALA", "HOH").
    pub residue_name: String,
    /// Residue code resolved from `residue_name`.
    pub residue_type: ResidueType,
    /// Residue sequence number.
    pub residue_number: i32,
    /// Chain identifier.
    pub chain: ChainLabel,
    /// Arena key of the owning residue.
    pub residue_id: ResidueId,
    /// `true` for `HETATM` records.
    pub is_hetero: bool,
    /// 1-based line number in the source text, for diagnostics.
    pub line_number: usize,
}

impl Atom {
    pub fn is_unknown_element(&self) -> bool {
        self.element.is_unknown()
    }

    pub fn distance_to(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}
