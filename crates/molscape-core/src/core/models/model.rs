use super::atom::Atom;
use super::chain::{Chain, ChainLabel};
use super::element::Element;
use super::ids::{ChainId, ResidueId};
use super::residue::Residue;
use super::secondary::SecondaryStructure;
use super::snapshot::AtomSnapshot;
use serde::Serialize;
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};

/// Aggregate counts for one model, used for summary reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Composition {
    /// Number of atoms of each element.
    pub atoms_per_element: BTreeMap<Element, usize>,
    /// Number of atoms carrying each chain label.
    pub atoms_per_chain: BTreeMap<ChainLabel, usize>,
    /// Number of residue instances for each residue name.
    pub residues_per_name: BTreeMap<String, usize>,
    /// Number of residues in each secondary-structure class.
    pub residues_per_secondary: BTreeMap<SecondaryStructure, usize>,
}

/// One structural frame (an NMR conformer, a trajectory frame, or the single
/// implicit frame of a legacy file).
///
/// Atoms are stored in file order and addressed by index; residues and chain
/// segments live in arenas keyed by [`ResidueId`] and [`ChainId`]. A model is built
/// once by [`super::builder::ModelBuilder`] and is immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) number: u32,
    pub(crate) atoms: Vec<Atom>,
    pub(crate) residues: SlotMap<ResidueId, Residue>,
    pub(crate) chains: SlotMap<ChainId, Chain>,
    /// Chain segments in order of first appearance.
    pub(crate) chain_order: Vec<ChainId>,
    pub(crate) residue_lookup: HashMap<(ChainLabel, i32, Option<char>), ResidueId>,
    pub(crate) composition: Composition,
    pub(crate) energy: Option<f64>,
}

impl Model {
    /// Model serial number (`MODEL` record), `1` for the implicit model.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Chain segments in the order they first appear in the file.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// Finds a residue by chain label, sequence number and insertion code.
    ///
    /// When a label owns several segments the most recent one wins.
    pub fn find_residue(
        &self,
        chain: &ChainLabel,
        number: i32,
        insertion_code: Option<char>,
    ) -> Option<ResidueId> {
        self.residue_lookup
            .get(&(chain.clone(), number, insertion_code))
            .copied()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn energy(&self) -> Option<f64> {
        self.energy
    }

    /// Secondary-structure class of the residue owning `atom_index`.
    pub fn secondary_structure_of(&self, atom_index: usize) -> SecondaryStructure {
        self.atoms
            .get(atom_index)
            .and_then(|atom| self.residues.get(atom.residue_id))
            .map(|residue| residue.secondary)
            .unwrap_or_default()
    }

    /// A copy of every atom as `{index, element, position}`.
    ///
    /// Algorithms operate on this snapshot and never on the model's own atoms.
    pub fn snapshot(&self) -> Vec<AtomSnapshot> {
        self.atoms
            .iter()
            .map(|atom| AtomSnapshot::new(atom.index, atom.element, atom.position))
            .collect()
    }

    pub(crate) fn compute_composition(&mut self) {
        let mut composition = Composition::default();
        for atom in &self.atoms {
            *composition
                .atoms_per_element
                .entry(atom.element)
                .or_default() += 1;
            *composition
                .atoms_per_chain
                .entry(atom.chain.clone())
                .or_default() += 1;
        }
        for (_, residue) in &self.residues {
            *composition
                .residues_per_name
                .entry(residue.name.clone())
                .or_default() += 1;
            *composition
                .residues_per_secondary
                .entry(residue.secondary)
                .or_default() += 1;
        }
        self.composition = composition;
    }
}
