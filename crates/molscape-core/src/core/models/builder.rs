use super::atom::Atom;
use super::chain::{Chain, ChainLabel};
use super::element::Element;
use super::ids::{ChainId, ResidueId};
use super::model::Model;
use super::residue::Residue;
use super::secondary::SecondaryStructureMap;
use nalgebra::Point3;
use std::collections::HashMap;

/// Per-axis tolerance below which two same-element atoms are treated as one.
pub const DUPLICATE_TOLERANCE: f64 = 0.001;

/// Field values for one atom about to be appended to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAtom<'a> {
    pub serial: i32,
    pub name: &'a str,
    pub element: Element,
    pub position: Point3<f64>,
    pub residue_name: &'a str,
    pub residue_number: i32,
    pub insertion_code: Option<char>,
    pub is_hetero: bool,
    pub line_number: usize,
}

type CellKey = (Element, i64, i64, i64);

fn cell_key(element: Element, position: &Point3<f64>) -> CellKey {
    (
        element,
        (position.x / DUPLICATE_TOLERANCE).floor() as i64,
        (position.y / DUPLICATE_TOLERANCE).floor() as i64,
        (position.z / DUPLICATE_TOLERANCE).floor() as i64,
    )
}

/// Incrementally assembles one [`Model`] from a stream of atom records.
///
/// The builder keeps the current chain segment and residue open between calls.
/// `terminate_chain` closes the segment so that later atoms with the same label
/// start a new one.
pub struct ModelBuilder {
    model: Model,

    // --- Builder-specific state for efficient construction ---
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
    occupied: HashMap<CellKey, Vec<usize>>,
    duplicates: usize,
}

impl ModelBuilder {
    pub fn new(number: u32) -> Self {
        Self {
            model: Model {
                number,
                ..Model::default()
            },
            current_chain: None,
            current_residue: None,
            occupied: HashMap::new(),
            duplicates: 0,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.model.atoms.len()
    }

    /// Number of atom records dropped as positional duplicates so far.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Makes `label` the current chain, reusing the open segment when it matches.
    pub fn start_chain(&mut self, label: &ChainLabel) -> &mut Self {
        let reuse = self
            .current_chain
            .and_then(|id| self.model.chains.get(id))
            .is_some_and(|chain| chain.label == *label);
        if !reuse {
            let id = self.model.chains.insert(Chain::new(label.clone()));
            self.model.chain_order.push(id);
            self.current_chain = Some(id);
            self.current_residue = None;
        }
        self
    }

    /// Closes the current chain segment (a `TER` record).
    pub fn terminate_chain(&mut self) -> &mut Self {
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    fn ensure_residue(
        &mut self,
        chain_id: ChainId,
        number: i32,
        insertion_code: Option<char>,
        name: &str,
    ) -> ResidueId {
        if let Some(id) = self.current_residue {
            if let Some(residue) = self.model.residues.get(id) {
                if residue.chain_id == chain_id
                    && residue.number == number
                    && residue.insertion_code == insertion_code
                    && residue.name == name
                {
                    return id;
                }
            }
        }

        let id = self
            .model
            .residues
            .insert(Residue::new(number, insertion_code, name, chain_id));
        if let Some(chain) = self.model.chains.get_mut(chain_id) {
            chain.residues.push(id);
            self.model
                .residue_lookup
                .insert((chain.label.clone(), number, insertion_code), id);
        }
        self.current_residue = Some(id);
        id
    }

    fn is_duplicate(&self, element: Element, position: &Point3<f64>) -> bool {
        let (element, cx, cy, cz) = cell_key(element, position);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(indices) = self.occupied.get(&(
                        element,
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    ))
                    else {
                        continue;
                    };
                    let hit = indices.iter().any(|&i| {
                        let other = &self.model.atoms[i].position;
                        (other.x - position.x).abs() < DUPLICATE_TOLERANCE
                            && (other.y - position.y).abs() < DUPLICATE_TOLERANCE
                            && (other.z - position.z).abs() < DUPLICATE_TOLERANCE
                    });
                    if hit {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Appends an atom to the current chain segment.
    ///
    /// Opens the default chain when none is current. Returns the new atom index, or
    /// `None` when the atom duplicates one already present.
    pub fn add_atom(&mut self, new: NewAtom<'_>) -> Option<usize> {
        if self.is_duplicate(new.element, &new.position) {
            self.duplicates += 1;
            return None;
        }

        let chain_id = match self.current_chain {
            Some(id) => id,
            None => {
                self.start_chain(&ChainLabel::default());
                self.current_chain?
            }
        };
        let label = self.model.chains.get(chain_id)?.label.clone();
        let residue_id = self.ensure_residue(
            chain_id,
            new.residue_number,
            new.insertion_code,
            new.residue_name,
        );

        let index = self.model.atoms.len();
        let atom = Atom {
            index,
            serial: new.serial,
            name: new.name.to_string(),
            element: new.element,
            position: new.position,
            residue_name: new.residue_name.to_string(),
            residue_type: self
                .model
                .residues
                .get(residue_id)
                .map(|r| r.residue_type)
                .unwrap_or_default(),
            residue_number: new.residue_number,
            chain: label,
            residue_id,
            is_hetero: new.is_hetero,
            line_number: new.line_number,
        };

        self.occupied
            .entry(cell_key(atom.element, &atom.position))
            .or_default()
            .push(index);
        if let Some(residue) = self.model.residues.get_mut(residue_id) {
            residue.add_atom(new.name, index);
        }
        self.model.atoms.push(atom);
        Some(index)
    }

    pub fn set_energy(&mut self, energy: f64) -> &mut Self {
        self.model.energy = Some(energy);
        self
    }

    /// Classifies every residue from the collected helix and sheet ranges.
    pub fn apply_secondary(&mut self, map: &SecondaryStructureMap) -> &mut Self {
        let chains = &self.model.chains;
        for (_, residue) in self.model.residues.iter_mut() {
            if let Some(chain) = chains.get(residue.chain_id) {
                residue.secondary = map.classify(&chain.label, residue.number);
            }
        }
        self
    }

    pub fn build(mut self) -> Model {
        self.model.compute_composition();
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::secondary::{SecondaryRange, SecondaryStructure};

    fn atom<'a>(name: &'a str, element: Element, x: f64, res: i32) -> NewAtom<'a> {
        NewAtom {
            serial: 1,
            name,
            element,
            position: Point3::new(x, 0.0, 0.0),
            residue_name: "ALA",
            residue_number: res,
            insertion_code: None,
            is_hetero: false,
            line_number: 1,
        }
    }

    #[test]
    fn add_atom_without_chain_opens_default_chain() {
        let mut builder = ModelBuilder::new(1);
        assert_eq!(builder.add_atom(atom("CA", Element::Carbon, 0.0, 1)), Some(0));
        let model = builder.build();
        let (_, chain) = model.chains_iter().next().unwrap();
        assert_eq!(chain.label.as_str(), "A");
        assert_eq!(model.atoms()[0].chain.as_str(), "A");
    }

    #[test]
    fn atoms_of_same_residue_share_residue_id() {
        let mut builder = ModelBuilder::new(1);
        builder.start_chain(&ChainLabel::new("B"));
        builder.add_atom(atom("N", Element::Nitrogen, 0.0, 5));
        builder.add_atom(atom("CA", Element::Carbon, 1.5, 5));
        builder.add_atom(atom("CA", Element::Carbon, 5.0, 6));
        let model = builder.build();
        assert_eq!(model.residue_count(), 2);
        assert_eq!(model.atoms()[0].residue_id, model.atoms()[1].residue_id);
        assert_ne!(model.atoms()[1].residue_id, model.atoms()[2].residue_id);
        let id = model.find_residue(&ChainLabel::new("B"), 5, None).unwrap();
        assert_eq!(model.residue(id).unwrap().atom_index_by_name("CA"), Some(1));
    }

    #[test]
    fn duplicate_positions_of_same_element_are_dropped() {
        let mut builder = ModelBuilder::new(1);
        assert!(builder.add_atom(atom("O", Element::Oxygen, 1.0, 1)).is_some());
        assert!(builder.add_atom(atom("O", Element::Oxygen, 1.0005, 1)).is_none());
        assert!(builder.add_atom(atom("N", Element::Nitrogen, 1.0, 1)).is_some());
        assert_eq!(builder.duplicates(), 1);
        assert_eq!(builder.build().atom_count(), 2);
    }

    #[test]
    fn terminate_chain_starts_new_segment_with_same_label() {
        let mut builder = ModelBuilder::new(1);
        let label = ChainLabel::new("A");
        builder.start_chain(&label);
        builder.add_atom(atom("CA", Element::Carbon, 0.0, 1));
        builder.terminate_chain();
        builder.start_chain(&label);
        builder.add_atom(atom("O", Element::Oxygen, 9.0, 100));
        let model = builder.build();
        assert_eq!(model.chains_iter().count(), 2);
    }

    #[test]
    fn apply_secondary_classifies_residues_and_composition() {
        let mut builder = ModelBuilder::new(1);
        builder.start_chain(&ChainLabel::new("A"));
        for i in 0..4 {
            builder.add_atom(atom("CA", Element::Carbon, i as f64 * 3.8, i + 1));
        }
        let mut map = SecondaryStructureMap::new();
        map.add(SecondaryRange::new(ChainLabel::new("A"), 2, 3, SecondaryStructure::Helix));
        builder.apply_secondary(&map).set_energy(-12.5);
        let model = builder.build();

        assert_eq!(model.secondary_structure_of(0), SecondaryStructure::Loop);
        assert_eq!(model.secondary_structure_of(1), SecondaryStructure::Helix);
        assert_eq!(model.energy(), Some(-12.5));
        let composition = model.composition();
        assert_eq!(composition.atoms_per_element[&Element::Carbon], 4);
        assert_eq!(composition.residues_per_name["ALA"], 4);
        assert_eq!(composition.residues_per_secondary[&SecondaryStructure::Helix], 2);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow_duplicate_search() {
        let mut builder = ModelBuilder::new(1);
        assert_eq!(builder.add_atom(atom("CA", Element::Carbon, 1e19, 1)), Some(0));
        assert_eq!(builder.add_atom(atom("CA", Element::Carbon, -1e19, 2)), Some(1));
        assert_eq!(builder.add_atom(atom("CA", Element::Carbon, 1e19, 3)), None);
        assert_eq!(builder.build().atom_count(), 2);
    }
}
