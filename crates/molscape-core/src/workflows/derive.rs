use crate::core::models::model::Model;
use crate::core::models::snapshot::AtomSnapshot;
use crate::core::models::structure::StructureFile;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::GeometryConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::backbone::extract_backbone;
use crate::engine::tasks::bonds::{Bond, BondPolicy, infer_bonds};
use crate::engine::tasks::relaxation::{RelaxedPositions, relax};
use crate::engine::tasks::ribbon::{RibbonSegment, build_ribbons};
use crate::engine::tasks::surface::{ResidueSurfaceBlob, build_surface};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, instrument};

/// How a model is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Representation {
    #[default]
    BallAndStick,
    SpaceFilling,
    Ribbon,
    Surface,
}

impl Representation {
    pub const ALL: [Representation; 4] = [
        Representation::BallAndStick,
        Representation::SpaceFilling,
        Representation::Ribbon,
        Representation::Surface,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Representation::BallAndStick => "ball-and-stick",
            Representation::SpaceFilling => "space-filling",
            Representation::Ribbon => "ribbon",
            Representation::Surface => "surface",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown representation '{0}' (expected ball-and-stick, space-filling, ribbon or surface)")]
pub struct ParseRepresentationError(String);

impl FromStr for Representation {
    type Err = ParseRepresentationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "ball-and-stick" | "sticks" | "bs" => Ok(Representation::BallAndStick),
            "space-filling" | "spheres" | "cpk" => Ok(Representation::SpaceFilling),
            "ribbon" | "cartoon" => Ok(Representation::Ribbon),
            "surface" => Ok(Representation::Surface),
            _ => Err(ParseRepresentationError(s.to_string())),
        }
    }
}

/// Renderer-ready geometry for one representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "representation", rename_all = "kebab-case")]
pub enum Geometry {
    BallAndStick {
        atoms: Vec<AtomSnapshot>,
        bonds: Vec<Bond>,
    },
    SpaceFilling {
        atoms: Vec<AtomSnapshot>,
        /// Sphere radius per entry of `atoms`.
        radii: Vec<f64>,
        relaxed: RelaxedPositions,
    },
    Ribbon {
        segments: Vec<RibbonSegment>,
    },
    Surface {
        blobs: Vec<ResidueSurfaceBlob>,
    },
}

impl Geometry {
    pub fn representation(&self) -> Representation {
        match self {
            Geometry::BallAndStick { .. } => Representation::BallAndStick,
            Geometry::SpaceFilling { .. } => Representation::SpaceFilling,
            Geometry::Ribbon { .. } => Representation::Ribbon,
            Geometry::Surface { .. } => Representation::Surface,
        }
    }

    /// Number of top-level primitives a renderer would create.
    pub fn primitive_count(&self) -> usize {
        match self {
            Geometry::BallAndStick { atoms, bonds } => atoms.len() + bonds.len(),
            Geometry::SpaceFilling { atoms, .. } => atoms.len(),
            Geometry::Ribbon { segments } => segments.len(),
            Geometry::Surface { blobs } => blobs
                .iter()
                .map(|b| b.spheres.len() + b.struts.len())
                .sum(),
        }
    }

    /// Multiplies every position, length and radius by `scale`. Normals are left as is.
    pub fn rescale(&mut self, scale: f64) {
        match self {
            Geometry::BallAndStick { atoms, bonds } => {
                for atom in atoms {
                    atom.position *= scale;
                }
                for bond in bonds {
                    bond.length *= scale;
                }
            }
            Geometry::SpaceFilling {
                atoms,
                radii,
                relaxed,
            } => {
                for atom in atoms {
                    atom.position *= scale;
                }
                for radius in radii {
                    *radius *= scale;
                }
                for position in relaxed.iter_mut() {
                    *position *= scale;
                }
            }
            Geometry::Ribbon { segments } => {
                for point in segments.iter_mut().flat_map(|s| s.points.iter_mut()) {
                    *point *= scale;
                }
            }
            Geometry::Surface { blobs } => {
                for blob in blobs {
                    for sphere in &mut blob.spheres {
                        sphere.center *= scale;
                        sphere.radius *= scale;
                    }
                    for strut in &mut blob.struts {
                        strut.start *= scale;
                        strut.end *= scale;
                        strut.radius *= scale;
                    }
                }
            }
        }
    }
}

/// Picks model `index` (0-based) out of a parsed structure.
pub fn select_model(structure: &StructureFile, index: usize) -> Result<&Model, EngineError> {
    structure.model(index).ok_or(EngineError::ModelNotFound {
        index,
        available: structure.model_count(),
    })
}

/// Derives the geometry of `representation` for `model`, rescaled to render units.
///
/// # Errors
///
/// Returns [`EngineError::EmptyStructure`] for a model without atoms,
/// [`EngineError::Config`] when `config` fails validation, and
/// [`EngineError::Cancelled`] if `cancel` fires before the derivation finishes.
#[instrument(skip_all, name = "derive_workflow", fields(representation = %representation))]
pub fn derive(
    model: &Model,
    representation: Representation,
    config: &GeometryConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<Geometry, EngineError> {
    config.validate()?;
    if model.is_empty() {
        return Err(EngineError::EmptyStructure);
    }
    cancel.check(representation.name())?;

    reporter.report(Progress::PhaseStart {
        name: representation.name(),
    });
    let atoms = model.snapshot();

    let mut geometry = match representation {
        Representation::BallAndStick => {
            let bonds = infer_bonds(&atoms, BondPolicy::StrictValence, &config.bonds);
            Geometry::BallAndStick { atoms, bonds }
        }
        Representation::SpaceFilling => {
            let mut rng = StdRng::seed_from_u64(config.relaxation.seed);
            let relaxed = relax(&atoms, &config.relaxation, &mut rng, reporter, cancel)?;
            let radii = atoms
                .iter()
                .map(|a| a.element.vdw_radius() * config.relaxation.radius_scale)
                .collect();
            Geometry::SpaceFilling {
                atoms,
                radii,
                relaxed,
            }
        }
        Representation::Ribbon => {
            let chains = extract_backbone(model, config.ribbon.walk_radius);
            let segments = build_ribbons(&chains, &config.ribbon, reporter, cancel)?;
            Geometry::Ribbon { segments }
        }
        Representation::Surface => Geometry::Surface {
            blobs: build_surface(model, &atoms, &config.surface),
        },
    };
    cancel.check(representation.name())?;
    reporter.report(Progress::PhaseFinish);

    geometry.rescale(config.render_scale);
    info!(
        model = model.number(),
        primitives = geometry.primitive_count(),
        "Derived {} geometry.",
        representation
    );
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::MolecularFile;
    use crate::core::models::secondary::SecondaryStructure;
    use crate::engine::config::GeometryConfigBuilder;
    use std::sync::Mutex;

    const TWO_CARBONS: &str = "\
ATOM      1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C2  LIG A   1       1.400   0.000   0.000  1.00  0.00           C
";

    fn unit_scale() -> GeometryConfig {
        GeometryConfigBuilder::new().render_scale(1.0).build().unwrap()
    }

    fn helix_file() -> String {
        let mut text = String::from(
            "HELIX    1   1 ALA A   10  ALA A   20  1                                  11\n",
        );
        for (i, number) in (10..=20).enumerate() {
            let t = i as f64 * 100f64.to_radians();
            text.push_str(&format!(
                "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           C\n",
                i + 1,
                number,
                2.3 * t.cos(),
                2.3 * t.sin(),
                1.5 * i as f64
            ));
        }
        text
    }

    fn derive_quiet(model: &Model, representation: Representation, config: &GeometryConfig) -> Geometry {
        derive(model, representation, config, &ProgressReporter::new(), &CancellationToken::new()).unwrap()
    }

    #[test]
    fn representation_parses_names_and_aliases() {
        for representation in Representation::ALL {
            assert_eq!(representation.name().parse::<Representation>().unwrap(), representation);
        }
        assert_eq!("CARTOON".parse::<Representation>().unwrap(), Representation::Ribbon);
        assert_eq!("space_filling".parse::<Representation>().unwrap(), Representation::SpaceFilling);
        assert!("wireframe".parse::<Representation>().is_err());
    }

    #[test]
    fn two_carbons_give_one_bond_in_ball_and_stick() {
        let structure = PdbFile::read_from_str(TWO_CARBONS).unwrap();
        let model = structure.first_model().unwrap();
        let Geometry::BallAndStick { atoms, bonds } =
            derive_quiet(model, Representation::BallAndStick, &unit_scale())
        else {
            panic!("wrong variant");
        };
        assert_eq!(atoms.len(), 2);
        assert_eq!(bonds.len(), 1);
        assert!((bonds[0].length - 1.4).abs() < 1e-9);
    }

    #[test]
    fn render_scale_shrinks_positions_and_lengths() {
        let structure = PdbFile::read_from_str(TWO_CARBONS).unwrap();
        let model = structure.first_model().unwrap();
        let Geometry::BallAndStick { atoms, bonds } =
            derive_quiet(model, Representation::BallAndStick, &GeometryConfig::default())
        else {
            panic!("wrong variant");
        };
        assert!((atoms[1].position.x - 0.14).abs() < 1e-9);
        assert!((bonds[0].length - 0.14).abs() < 1e-9);
    }

    #[test]
    fn helix_record_yields_one_helix_segment_over_all_residues() {
        let structure = PdbFile::read_from_str(&helix_file()).unwrap();
        let model = structure.first_model().unwrap();
        let Geometry::Ribbon { segments } = derive_quiet(model, Representation::Ribbon, &unit_scale()) else {
            panic!("wrong variant");
        };
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].secondary, SecondaryStructure::Helix);
        let mut keyed = segments[0].residue_numbers.clone();
        keyed.dedup();
        assert_eq!(keyed, (10..=20).collect::<Vec<_>>());
        assert_eq!(segments[0].points.len(), segments[0].normals.len());
    }

    #[test]
    fn space_filling_is_reproducible_for_a_seed() {
        let structure = PdbFile::read_from_str(&helix_file()).unwrap();
        let model = structure.first_model().unwrap();
        let config = GeometryConfigBuilder::new().seed(9).build().unwrap();
        let a = derive_quiet(model, Representation::SpaceFilling, &config);
        let b = derive_quiet(model, Representation::SpaceFilling, &config);
        assert_eq!(a, b);
        let Geometry::SpaceFilling { atoms, radii, relaxed } = a else {
            panic!("wrong variant");
        };
        assert_eq!(atoms.len(), radii.len());
        assert_eq!(relaxed.len(), atoms.len());
    }

    #[test]
    fn surface_is_never_empty() {
        let structure = PdbFile::read_from_str(TWO_CARBONS).unwrap();
        let model = structure.first_model().unwrap();
        let geometry = derive_quiet(model, Representation::Surface, &unit_scale());
        assert!(geometry.primitive_count() > 0);
    }

    #[test]
    fn cancelled_token_stops_derivation() {
        let structure = PdbFile::read_from_str(&helix_file()).unwrap();
        let model = structure.first_model().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = derive(
            model,
            Representation::SpaceFilling,
            &GeometryConfig::default(),
            &ProgressReporter::new(),
            &cancel,
        );
        assert!(matches!(result, Err(EngineError::Cancelled { .. })));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let structure = PdbFile::read_from_str(TWO_CARBONS).unwrap();
        let model = structure.first_model().unwrap();
        let config = GeometryConfig {
            render_scale: -1.0,
            ..GeometryConfig::default()
        };
        let result = derive(
            model,
            Representation::Ribbon,
            &config,
            &ProgressReporter::new(),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn phases_are_reported() {
        let structure = PdbFile::read_from_str(&helix_file()).unwrap();
        let model = structure.first_model().unwrap();
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            derive(
                model,
                Representation::Ribbon,
                &GeometryConfig::default(),
                &reporter,
                &CancellationToken::new(),
            )
            .unwrap();
        }
        let events = events.into_inner().unwrap();
        assert!(matches!(events.first(), Some(Progress::PhaseStart { name: "ribbon" })));
        assert!(matches!(events.last(), Some(Progress::PhaseFinish)));
    }

    #[test]
    fn select_model_reports_range() {
        let structure = PdbFile::read_from_str(TWO_CARBONS).unwrap();
        assert!(select_model(&structure, 0).is_ok());
        assert!(matches!(
            select_model(&structure, 3),
            Err(EngineError::ModelNotFound { index: 3, available: 1 })
        ));
    }
}
