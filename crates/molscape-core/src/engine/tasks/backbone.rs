use crate::core::models::chain::ChainLabel;
use crate::core::models::element::Element;
use crate::core::models::model::Model;
use crate::core::models::residue::Residue;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::models::snapshot::AtomSnapshot;
use crate::core::utils::identifiers::is_backbone_anchor;
use crate::engine::spatial::SpatialGrid;
use nalgebra::Point3;
use tracing::{debug, info, instrument};

/// Residue name given to anchors traced without residue metadata.
pub const UNKNOWN_RESIDUE: &str = "UNK";

/// Ordered backbone anchors of one chain segment.
#[derive(Debug, Clone, PartialEq)]
pub struct BackboneChain {
    pub chain: ChainLabel,
    pub positions: Vec<Point3<f64>>,
    pub residue_numbers: Vec<i32>,
    pub residue_names: Vec<String>,
    pub secondary: Vec<SecondaryStructure>,
}

impl BackboneChain {
    fn new(chain: ChainLabel) -> Self {
        Self {
            chain,
            positions: Vec::new(),
            residue_numbers: Vec::new(),
            residue_names: Vec::new(),
            secondary: Vec::new(),
        }
    }

    fn push(&mut self, position: Point3<f64>, number: i32, name: &str, ss: SecondaryStructure) {
        self.positions.push(position);
        self.residue_numbers.push(number);
        self.residue_names.push(name.to_string());
        self.secondary.push(ss);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn anchor_position(model: &Model, residue: &Residue) -> Option<Point3<f64>> {
    residue
        .atoms()
        .iter()
        .filter_map(|&i| model.atom(i))
        .find(|atom| is_backbone_anchor(&atom.name, atom.element))
        .map(|atom| atom.position)
}

/// Extracts one anchor per residue for every chain segment, in ascending residue order.
///
/// Segments with fewer than two anchors are dropped. When no segment yields a usable
/// trace, carbon atoms are ordered by [`trace_carbon_walk`] instead.
#[instrument(skip_all, name = "backbone_extraction_task")]
pub fn extract_backbone(model: &Model, walk_radius: f64) -> Vec<BackboneChain> {
    let mut chains = Vec::new();

    for (_, chain) in model.chains_iter() {
        let mut residues: Vec<&Residue> = chain
            .residues()
            .iter()
            .filter_map(|&id| model.residue(id))
            .collect();
        residues.sort_by_key(|r| (r.number, r.insertion_code));

        let mut trace = BackboneChain::new(chain.label.clone());
        for residue in residues {
            if let Some(position) = anchor_position(model, residue) {
                trace.push(position, residue.number, &residue.name, residue.secondary);
            }
        }

        if trace.len() >= 2 {
            chains.push(trace);
        } else if !trace.is_empty() {
            debug!(chain = %chain.label, "Dropping chain segment with a single backbone anchor");
        }
    }

    if chains.is_empty() {
        debug!("No residue backbone found, falling back to carbon walk");
        chains = trace_carbon_walk(&model.snapshot(), walk_radius);
    }

    info!(chains = chains.len(), "Backbone extraction complete.");
    chains
}

/// Orders carbon atoms into paths by a greedy nearest-unvisited walk.
///
/// The walk starts at the lowest-index carbon and repeatedly steps to the closest
/// unvisited carbon within `radius` (ties go to the lower index). When none is in
/// range, the current path ends and a new one starts at the lowest-index carbon
/// left. Paths with fewer than two atoms are dropped.
pub fn trace_carbon_walk(atoms: &[AtomSnapshot], radius: f64) -> Vec<BackboneChain> {
    let carbons: Vec<Point3<f64>> = atoms
        .iter()
        .filter(|a| a.element == Element::Carbon)
        .map(|a| a.position)
        .collect();
    if carbons.len() < 2 {
        return Vec::new();
    }

    let grid = SpatialGrid::from_points(radius, &carbons);
    let mut visited = vec![false; carbons.len()];
    let mut remaining = carbons.len();
    let mut next_unvisited = 0;
    let mut neighbors = Vec::new();
    let mut paths = Vec::new();

    while remaining > 0 {
        while visited[next_unvisited] {
            next_unvisited += 1;
        }
        let mut current = next_unvisited;
        let mut path = vec![current];
        visited[current] = true;
        remaining -= 1;

        loop {
            grid.query_neighbors(&carbons[current], &mut neighbors);
            let nearest = neighbors
                .iter()
                .copied()
                .filter(|&j| !visited[j])
                .map(|j| (nalgebra::distance(&carbons[current], &carbons[j]), j))
                .filter(|(d, _)| *d <= radius)
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let Some((_, j)) = nearest else {
                break;
            };
            visited[j] = true;
            remaining -= 1;
            path.push(j);
            current = j;
        }

        if path.len() >= 2 {
            paths.push(path);
        }
    }

    paths
        .into_iter()
        .map(|path| {
            let mut trace = BackboneChain::new(ChainLabel::default());
            for (n, &i) in path.iter().enumerate() {
                trace.push(carbons[i], n as i32 + 1, UNKNOWN_RESIDUE, SecondaryStructure::Loop);
            }
            trace
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::MolecularFile;

    fn atom_line(serial: i32, name: &str, res: &str, chain: char, seq: i32, x: f64, el: &str) -> String {
        format!(
            "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00          {:>2}",
            serial, name, res, chain, seq, x, 0.0, 0.0, el
        )
    }

    #[test]
    fn anchors_are_ordered_by_residue_number() {
        let text = [
            atom_line(1, " N", "ALA", 'A', 2, 5.0, "N"),
            atom_line(2, " CA", "ALA", 'A', 2, 6.0, "C"),
            atom_line(3, " CA", "GLY", 'A', 1, 2.0, "C"),
            atom_line(4, " CA", "SER", 'A', 3, 10.0, "C"),
        ]
        .join("\n");
        let structure = PdbFile::read_from_str(&text).unwrap();
        let chains = extract_backbone(structure.first_model().unwrap(), 3.0);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].residue_numbers, vec![1, 2, 3]);
        assert_eq!(chains[0].positions[1], Point3::new(6.0, 0.0, 0.0));
        assert_eq!(chains[0].residue_names, vec!["GLY", "ALA", "SER"]);
    }

    #[test]
    fn nucleic_acid_chains_use_phosphorus_anchors() {
        let text = [
            atom_line(1, " P", "DA", 'B', 1, 0.0, "P"),
            atom_line(2, " C1'", "DA", 'B', 1, 2.0, "C"),
            atom_line(3, " P", "DC", 'B', 2, 6.5, "P"),
        ]
        .join("\n");
        let structure = PdbFile::read_from_str(&text).unwrap();
        let chains = extract_backbone(structure.first_model().unwrap(), 3.0);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].chain.as_str(), "B");
        assert_eq!(chains[0].positions.len(), 2);
    }

    #[test]
    fn single_anchor_chains_are_dropped() {
        let text = [
            atom_line(1, " CA", "ALA", 'A', 1, 0.0, "C"),
            atom_line(2, " CA", "ALA", 'A', 2, 3.8, "C"),
            atom_line(3, " CA", "ALA", 'B', 1, 20.0, "C"),
        ]
        .join("\n");
        let structure = PdbFile::read_from_str(&text).unwrap();
        let chains = extract_backbone(structure.first_model().unwrap(), 3.0);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].chain.as_str(), "A");
    }

    #[test]
    fn model_without_anchor_atoms_falls_back_to_carbon_walk() {
        let text = [
            atom_line(1, " C1", "LIG", 'A', 1, 0.0, "C"),
            atom_line(2, " C2", "LIG", 'A', 1, 1.5, "C"),
            atom_line(3, " C3", "LIG", 'A', 1, 3.0, "C"),
        ]
        .join("\n");
        let structure = PdbFile::read_from_str(&text).unwrap();
        let chains = extract_backbone(structure.first_model().unwrap(), 3.0);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].residue_numbers, vec![1, 2, 3]);
        assert!(chains[0].secondary.iter().all(|ss| ss.is_loop()));
        assert!(chains[0].residue_names.iter().all(|n| n == UNKNOWN_RESIDUE));
    }

    #[test]
    fn carbon_walk_follows_nearest_neighbor_and_splits_gaps() {
        let p = |x: f64| AtomSnapshot::detached(Element::Carbon, Point3::new(x, 0.0, 0.0));
        let atoms = [
            p(0.0),
            p(2.0),
            p(1.0),
            AtomSnapshot::detached(Element::Oxygen, Point3::new(0.5, 0.0, 0.0)),
            p(20.0),
            p(21.5),
            p(50.0),
        ];
        let paths = trace_carbon_walk(&atoms, 3.0);
        assert_eq!(paths.len(), 2);
        let xs: Vec<f64> = paths[0].positions.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert_eq!(paths[1].positions.len(), 2);
    }
}
