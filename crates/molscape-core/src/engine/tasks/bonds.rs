use crate::core::models::element::Element;
use crate::core::models::snapshot::AtomSnapshot;
use crate::engine::config::BondConfig;
use crate::engine::spatial::SpatialGrid;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An undirected bond between two atoms of a snapshot.
///
/// Stored once per pair with `atom_a < atom_b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bond {
    pub atom_a: usize,
    pub atom_b: usize,
    /// Distance between the two atoms, in the units of the input positions.
    pub length: f64,
}

impl Bond {
    pub fn new(i: usize, j: usize, length: f64) -> Self {
        Self {
            atom_a: i.min(j),
            atom_b: i.max(j),
            length,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom_a == atom || self.atom_b == atom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondPolicy {
    /// Valence-ranked greedy pass within the strict cutoff, backfilled by the
    /// permissive pass when it leaves the structure under-bonded.
    #[default]
    StrictValence,
    /// Permissive distance pass only.
    PermissiveDistance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f64,
    i: usize,
    j: usize,
}

fn is_bondable(element: Element) -> bool {
    !element.is_unknown()
}

/// Enumerates pairs `i < j` of bondable atoms whose distance passes `cutoff`,
/// sorted by ascending distance and then by index.
fn collect_candidates<F>(atoms: &[AtomSnapshot], max_cutoff: f64, cutoff: F) -> Vec<Candidate>
where
    F: Fn(Element, Element) -> f64 + Sync,
{
    let positions: Vec<_> = atoms.iter().map(|a| a.position).collect();
    let grid = SpatialGrid::from_points(max_cutoff, &positions);

    let per_atom = |i: usize| -> Vec<Candidate> {
        let a = &atoms[i];
        if !is_bondable(a.element) {
            return Vec::new();
        }
        let mut neighbors = Vec::new();
        grid.query_neighbors(&a.position, &mut neighbors);
        neighbors
            .into_iter()
            .filter(|&j| j > i && is_bondable(atoms[j].element))
            .filter_map(|j| {
                let distance = nalgebra::distance(&a.position, &atoms[j].position);
                let limit = cutoff(a.element, atoms[j].element);
                (distance <= limit).then_some(Candidate {
                    distance,
                    i,
                    j,
                })
            })
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let mut candidates: Vec<Candidate> = (0..atoms.len()).flat_map(per_atom).collect();

    #[cfg(feature = "parallel")]
    let mut candidates: Vec<Candidate> = (0..atoms.len())
        .into_par_iter()
        .flat_map_iter(per_atom)
        .collect();

    candidates.sort_by(|x, y| {
        x.distance
            .total_cmp(&y.distance)
            .then(x.i.cmp(&y.i))
            .then(x.j.cmp(&y.j))
    });
    candidates
}

/// Greedy acceptance state shared by both passes.
struct BondGraph<'a> {
    atoms: &'a [AtomSnapshot],
    counts: Vec<usize>,
    connected: HashSet<(usize, usize)>,
    bonds: Vec<Bond>,
}

impl<'a> BondGraph<'a> {
    fn new(atoms: &'a [AtomSnapshot]) -> Self {
        Self {
            atoms,
            counts: vec![0; atoms.len()],
            connected: HashSet::new(),
            bonds: Vec::new(),
        }
    }

    fn has_capacity(&self, index: usize) -> bool {
        self.counts[index] < self.atoms[index].element.max_bonds()
    }

    fn accept_all(&mut self, candidates: &[Candidate]) -> usize {
        let before = self.bonds.len();
        for c in candidates {
            if c.i == c.j || self.connected.contains(&(c.i, c.j)) {
                continue;
            }
            if !self.has_capacity(c.i) || !self.has_capacity(c.j) {
                continue;
            }
            self.connected.insert((c.i, c.j));
            self.counts[c.i] += 1;
            self.counts[c.j] += 1;
            self.bonds.push(Bond::new(c.i, c.j, c.distance));
        }
        self.bonds.len() - before
    }
}

fn permissive_candidates(atoms: &[AtomSnapshot], config: &BondConfig) -> Vec<Candidate> {
    let max_cutoff = config
        .pair_cutoffs
        .iter()
        .map(|c| c.max_distance)
        .fold(config.permissive_cutoff, f64::max);
    collect_candidates(atoms, max_cutoff, |a, b| config.permissive_cutoff_for(a, b))
}

/// Infers bonds from atom positions.
///
/// Bond indices are positions in `atoms`. Atoms of unknown element never bond,
/// no atom exceeds its element's valence limit, and the result is identical for
/// identical input regardless of thread count.
#[instrument(skip_all, name = "bond_inference_task")]
pub fn infer_bonds(atoms: &[AtomSnapshot], policy: BondPolicy, config: &BondConfig) -> Vec<Bond> {
    if atoms.len() < 2 {
        return Vec::new();
    }
    let mut graph = BondGraph::new(atoms);

    match policy {
        BondPolicy::StrictValence => {
            let strict = collect_candidates(atoms, config.strict_cutoff, |_, _| config.strict_cutoff);
            let accepted = graph.accept_all(&strict);

            let threshold = config.underbonded_ratio * atoms.len() as f64;
            if (accepted as f64) < threshold {
                debug!(
                    strict_bonds = accepted,
                    atoms = atoms.len(),
                    "Strict pass left structure under-bonded, running permissive backfill"
                );
                let added = graph.accept_all(&permissive_candidates(atoms, config));
                debug!(added, "Permissive backfill complete");
            }
        }
        BondPolicy::PermissiveDistance => {
            graph.accept_all(&permissive_candidates(atoms, config));
        }
    }

    info!(bonds = graph.bonds.len(), atoms = atoms.len(), ?policy, "Bond inference complete.");
    graph.bonds
}
