use crate::core::models::chain::ChainLabel;
use crate::core::models::element::Element;
use crate::core::models::ids::ResidueId;
use crate::core::models::model::Model;
use crate::core::models::residue::ResidueClass;
use crate::core::models::snapshot::AtomSnapshot;
use crate::core::utils::geometry::{DEGENERATE_EPSILON, centroid};
use crate::engine::config::SurfaceConfig;
use crate::engine::spatial::SpatialGrid;
use nalgebra::Point3;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// What a blob stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BlobKey {
    Residue {
        chain: ChainLabel,
        name: String,
        number: i32,
    },
    Element {
        element: Element,
    },
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Strut {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub radius: f64,
}

/// Overlapping spheres and connective struts approximating one group's surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidueSurfaceBlob {
    pub key: BlobKey,
    pub class: ResidueClass,
    pub spheres: Vec<Sphere>,
    pub struts: Vec<Strut>,
}

struct Group {
    key: BlobKey,
    class: ResidueClass,
    members: Vec<AtomSnapshot>,
}

/// Resolves the residue owning a snapshot atom.
///
/// The snapshot's own index is trusted when it points at an atom of the same
/// element. Otherwise the nearest parsed atom of the same element within the match
/// tolerance is used.
struct ResidueResolver<'a> {
    model: &'a Model,
    grid: SpatialGrid,
    tolerance: f64,
    scratch: Vec<usize>,
}

impl<'a> ResidueResolver<'a> {
    fn new(model: &'a Model, tolerance: f64) -> Self {
        let positions: Vec<Point3<f64>> = model.atoms().iter().map(|a| a.position).collect();
        Self {
            model,
            grid: SpatialGrid::from_points(tolerance, &positions),
            tolerance,
            scratch: Vec::new(),
        }
    }

    fn resolve(&mut self, atom: &AtomSnapshot) -> Option<ResidueId> {
        if let Some(parsed) = atom.index.and_then(|i| self.model.atom(i)) {
            if parsed.element == atom.element {
                return Some(parsed.residue_id);
            }
        }

        self.grid.query_neighbors(&atom.position, &mut self.scratch);
        let matched = self
            .scratch
            .iter()
            .filter_map(|&i| self.model.atom(i))
            .filter(|parsed| parsed.element == atom.element)
            .map(|parsed| (nalgebra::distance(&parsed.position, &atom.position), parsed))
            .filter(|(d, _)| *d < self.tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.index.cmp(&b.1.index)))
            .map(|(_, parsed)| parsed.residue_id);
        if matched.is_some() {
            debug!(position = ?atom.position, "Residue resolved by position match");
        }
        matched
    }
}

fn group_atoms(model: &Model, atoms: &[AtomSnapshot], config: &SurfaceConfig) -> Vec<Group> {
    let mut resolver = ResidueResolver::new(model, config.match_tolerance);
    let mut groups: Vec<Group> = Vec::new();
    let mut by_residue: HashMap<ResidueId, usize> = HashMap::new();
    let mut leftovers: Vec<AtomSnapshot> = Vec::new();

    for atom in atoms {
        let Some(residue_id) = resolver.resolve(atom) else {
            leftovers.push(*atom);
            continue;
        };
        let Some(residue) = model.residue(residue_id) else {
            leftovers.push(*atom);
            continue;
        };
        let slot = *by_residue.entry(residue_id).or_insert_with(|| {
            let chain = model
                .chain(residue.chain_id)
                .map(|c| c.label.clone())
                .unwrap_or_default();
            groups.push(Group {
                key: BlobKey::Residue {
                    chain,
                    name: residue.name.clone(),
                    number: residue.number,
                },
                class: residue.class(),
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(*atom);
    }

    if !leftovers.is_empty() {
        debug!(count = leftovers.len(), "Grouping unmatched atoms by element");
        let mut by_element: Vec<Group> = Vec::new();
        for atom in leftovers {
            match by_element
                .iter_mut()
                .find(|g| g.key == BlobKey::Element { element: atom.element })
            {
                Some(group) => group.members.push(atom),
                None => by_element.push(Group {
                    key: BlobKey::Element {
                        element: atom.element,
                    },
                    class: ResidueClass::Default,
                    members: vec![atom],
                }),
            }
        }
        groups.extend(by_element);
    }

    groups
}

fn blob_for(group: Group, config: &SurfaceConfig) -> Option<ResidueSurfaceBlob> {
    if group.members.is_empty() {
        return None;
    }

    let spheres: Vec<Sphere> = group
        .members
        .iter()
        .map(|atom| Sphere {
            center: atom.position,
            radius: atom.element.vdw_radius() * config.sphere_scale,
        })
        .collect();

    let mut struts = Vec::new();
    if spheres.len() > 1 {
        let centers: Vec<Point3<f64>> = spheres.iter().map(|s| s.center).collect();
        let grid = SpatialGrid::from_points(config.strut_cutoff, &centers);
        let mut neighbors = Vec::new();
        for (i, a) in spheres.iter().enumerate() {
            grid.query_neighbors(&a.center, &mut neighbors);
            for &j in neighbors.iter().filter(|&&j| j > i) {
                let b = &spheres[j];
                let distance = nalgebra::distance(&a.center, &b.center);
                if distance > DEGENERATE_EPSILON && distance < config.strut_cutoff {
                    struts.push(Strut {
                        start: a.center,
                        end: b.center,
                        radius: a.radius.min(b.radius) * config.strut_radius_fraction,
                    });
                }
            }
        }
    }

    Some(ResidueSurfaceBlob {
        key: group.key,
        class: group.class,
        spheres,
        struts,
    })
}

fn placeholder(atoms: &[AtomSnapshot], config: &SurfaceConfig) -> ResidueSurfaceBlob {
    let positions: Vec<Point3<f64>> = atoms.iter().map(|a| a.position).collect();
    ResidueSurfaceBlob {
        key: BlobKey::Placeholder,
        class: ResidueClass::Default,
        spheres: vec![Sphere {
            center: centroid(&positions).unwrap_or_else(Point3::origin),
            radius: config.placeholder_radius,
        }],
        struts: Vec::new(),
    }
}

/// Builds one blob per residue from `atoms`, which may carry relaxed positions.
///
/// Atoms whose residue cannot be resolved are collected into per-element blobs.
/// The result is never empty: when no blob could be produced a single placeholder
/// sphere is returned.
#[instrument(skip_all, name = "surface_task")]
pub fn build_surface(
    model: &Model,
    atoms: &[AtomSnapshot],
    config: &SurfaceConfig,
) -> Vec<ResidueSurfaceBlob> {
    let mut blobs: Vec<ResidueSurfaceBlob> = group_atoms(model, atoms, config)
        .into_iter()
        .filter_map(|group| blob_for(group, config))
        .collect();

    if blobs.is_empty() {
        debug!("No surface groups produced, emitting placeholder");
        blobs.push(placeholder(atoms, config));
    }

    info!(
        blobs = blobs.len(),
        struts = blobs.iter().map(|b| b.struts.len()).sum::<usize>(),
        "Surface approximation complete."
    );
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::MolecularFile;
    use crate::core::models::structure::StructureFile;

    const DIPEPTIDE: &str = "\
ATOM      1  N   LEU A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  LEU A   1       1.450   0.000   0.000  1.00  0.00           C
ATOM      3  C   LEU A   1       2.000   1.400   0.000  1.00  0.00           C
ATOM      4  N   ASP A   2       3.300   1.600   0.000  1.00  0.00           N
ATOM      5  CA  ASP A   2       3.900   2.900   0.000  1.00  0.00           C
HETATM    6  O   HOH A 101      20.000  20.000  20.000  1.00  0.00           O
";

    fn structure() -> StructureFile {
        PdbFile::read_from_str(DIPEPTIDE).unwrap()
    }

    #[test]
    fn groups_by_residue_with_material_class() {
        let structure = structure();
        let model = structure.first_model().unwrap();
        let blobs = build_surface(model, &model.snapshot(), &SurfaceConfig::default());

        assert_eq!(blobs.len(), 3);
        assert_eq!(
            blobs[0].key,
            BlobKey::Residue {
                chain: ChainLabel::new("A"),
                name: "LEU".into(),
                number: 1
            }
        );
        assert_eq!(blobs[0].class, ResidueClass::Hydrophobic);
        assert_eq!(blobs[0].spheres.len(), 3);
        assert_eq!(blobs[1].class, ResidueClass::Acidic);
        assert_eq!(blobs[2].class, ResidueClass::Default);
    }

    #[test]
    fn spheres_are_enlarged_and_close_pairs_get_struts() {
        let structure = structure();
        let model = structure.first_model().unwrap();
        let config = SurfaceConfig::default();
        let blobs = build_surface(model, &model.snapshot(), &config);

        let leucine = &blobs[0];
        let expected = Element::Carbon.vdw_radius() * config.sphere_scale;
        assert!((leucine.spheres[1].radius - expected).abs() < 1e-12);
        // N-CA 1.45, CA-C ~1.50, N-C ~2.0: all below the cutoff.
        assert_eq!(leucine.struts.len(), 3);
        for strut in &leucine.struts {
            assert!(strut.radius > 0.0);
        }

        let water = &blobs[2];
        assert_eq!(water.spheres.len(), 1);
        assert!(water.struts.is_empty());
    }

    #[test]
    fn detached_atoms_are_matched_by_position() {
        let structure = structure();
        let model = structure.first_model().unwrap();
        let atoms: Vec<AtomSnapshot> = model
            .snapshot()
            .into_iter()
            .map(|a| AtomSnapshot::detached(a.element, a.position + nalgebra::Vector3::new(0.01, 0.0, 0.0)))
            .collect();
        let blobs = build_surface(model, &atoms, &SurfaceConfig::default());
        assert_eq!(blobs.len(), 3);
        assert!(matches!(blobs[1].key, BlobKey::Residue { number: 2, .. }));
    }

    #[test]
    fn unmatched_atoms_fall_back_to_element_groups() {
        let structure = structure();
        let model = structure.first_model().unwrap();
        let atoms = [
            AtomSnapshot::detached(Element::Sulfur, Point3::new(50.0, 0.0, 0.0)),
            AtomSnapshot::detached(Element::Sulfur, Point3::new(51.0, 0.0, 0.0)),
            AtomSnapshot::detached(Element::Carbon, Point3::new(60.0, 0.0, 0.0)),
        ];
        let blobs = build_surface(model, &atoms, &SurfaceConfig::default());
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].key, BlobKey::Element { element: Element::Sulfur });
        assert_eq!(blobs[0].spheres.len(), 2);
        assert_eq!(blobs[0].struts.len(), 1);
    }

    #[test]
    fn empty_input_yields_placeholder() {
        let structure = structure();
        let model = structure.first_model().unwrap();
        let config = SurfaceConfig::default();
        let blobs = build_surface(model, &[], &config);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].key, BlobKey::Placeholder);
        assert_eq!(blobs[0].spheres[0].center, Point3::origin());
        assert_eq!(blobs[0].spheres[0].radius, config.placeholder_radius);
    }
}
