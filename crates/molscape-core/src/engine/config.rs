use crate::core::models::element::Element;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be a finite number greater than zero",
        })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be a finite, non-negative number",
        })
    }
}

fn require_at_least(name: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value: value as f64,
            reason: if min == 1 {
                "must be at least 1"
            } else {
                "is below the supported minimum"
            },
        })
    }
}

/// Maximum bond length for one unordered element pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCutoff {
    pub a: Element,
    pub b: Element,
    pub max_distance: f64,
}

impl PairCutoff {
    pub const fn new(a: Element, b: Element, max_distance: f64) -> Self {
        Self { a, b, max_distance }
    }

    pub fn matches(&self, a: Element, b: Element) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondConfig {
    /// Distance threshold for the strict valence-ranked pass.
    pub strict_cutoff: f64,
    /// Distance threshold for pairs without a specific cutoff in the permissive pass.
    pub permissive_cutoff: f64,
    /// Tighter thresholds for recognized bond types in the permissive pass.
    pub pair_cutoffs: Vec<PairCutoff>,
    /// The permissive pass runs when strict bonds < this ratio × atom count.
    pub underbonded_ratio: f64,
}

impl BondConfig {
    /// Threshold the permissive pass applies to an element pair.
    pub fn permissive_cutoff_for(&self, a: Element, b: Element) -> f64 {
        self.pair_cutoffs
            .iter()
            .find(|cutoff| cutoff.matches(a, b))
            .map_or(self.permissive_cutoff, |cutoff| cutoff.max_distance)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("bonds.strict-cutoff", self.strict_cutoff)?;
        require_positive("bonds.permissive-cutoff", self.permissive_cutoff)?;
        require_non_negative("bonds.underbonded-ratio", self.underbonded_ratio)?;
        for cutoff in &self.pair_cutoffs {
            require_positive("bonds.pair-cutoff", cutoff.max_distance)?;
        }
        Ok(())
    }
}

impl Default for BondConfig {
    fn default() -> Self {
        use Element::*;
        Self {
            strict_cutoff: 2.2,
            permissive_cutoff: 2.8,
            pair_cutoffs: vec![
                PairCutoff::new(Carbon, Carbon, 1.8),
                PairCutoff::new(Carbon, Oxygen, 1.8),
                PairCutoff::new(Carbon, Nitrogen, 1.8),
                PairCutoff::new(Oxygen, Hydrogen, 2.0),
                PairCutoff::new(Nitrogen, Hydrogen, 2.0),
                PairCutoff::new(Carbon, Sulfur, 2.0),
            ],
            underbonded_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RibbonConfig {
    /// Jacobi passes of endpoint-preserving Laplacian smoothing.
    pub smoothing_iterations: usize,
    pub helix_spacing: f64,
    pub sheet_spacing: f64,
    pub loop_spacing: f64,
    /// Cardinal spline tension; `0` is Catmull-Rom.
    pub tension: f64,
    pub samples_per_span: usize,
    /// Runs shorter than this many residues are merged into a neighbor.
    pub min_run_length: usize,
    /// Helix segments with fewer dense samples are flagged as simplified.
    pub simplified_helix_samples: usize,
    /// Samples averaged around a segment seam when blending normals.
    pub transition_window: usize,
    /// Search radius of the nearest-carbon walk used without residue metadata.
    pub walk_radius: f64,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            smoothing_iterations: 3,
            helix_spacing: 1.2,
            sheet_spacing: 1.1,
            loop_spacing: 1.05,
            tension: 0.2,
            samples_per_span: 8,
            min_run_length: 5,
            simplified_helix_samples: 8,
            transition_window: 3,
            walk_radius: 3.0,
        }
    }
}

impl RibbonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("ribbon.helix-spacing", self.helix_spacing)?;
        require_positive("ribbon.sheet-spacing", self.sheet_spacing)?;
        require_positive("ribbon.loop-spacing", self.loop_spacing)?;
        if !(self.tension.is_finite() && (0.0..=1.0).contains(&self.tension)) {
            return Err(ConfigError::InvalidParameter {
                name: "ribbon.tension",
                value: self.tension,
                reason: "must lie between 0 and 1",
            });
        }
        require_at_least("ribbon.samples-per-span", self.samples_per_span, 1)?;
        require_at_least("ribbon.min-run-length", self.min_run_length, 1)?;
        require_at_least("ribbon.transition-window", self.transition_window, 1)?;
        require_positive("ribbon.walk-radius", self.walk_radius)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationConfig {
    pub iterations: usize,
    /// Edge length of the uniform hash grid, in Ångström.
    pub cell_size: f64,
    /// Sphere radius as a multiple of the van der Waals radius.
    pub radius_scale: f64,
    pub initial_overlap: f64,
    /// Added to the overlap factor after every iteration.
    pub overlap_step: f64,
    /// Relative half-width of the force-free band around the ideal distance.
    pub tolerance: f64,
    /// Attraction acts up to this multiple of the ideal distance.
    pub attraction_range: f64,
    pub repulsion_strength: f64,
    pub attraction_strength: f64,
    /// Length of the random separating move applied to coincident atoms.
    pub nudge_distance: f64,
    /// Atoms processed between cancellation checks.
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            iterations: 6,
            cell_size: 1.0,
            radius_scale: 0.4,
            initial_overlap: 0.82,
            overlap_step: 0.02,
            tolerance: 0.02,
            attraction_range: 3.0,
            repulsion_strength: 0.5,
            attraction_strength: 0.05,
            nudge_distance: 0.01,
            batch_size: 256,
            seed: 0,
        }
    }
}

impl RelaxationConfig {
    /// Overlap factor applied during zero-based iteration `iteration`.
    pub fn overlap_at(&self, iteration: usize) -> f64 {
        self.initial_overlap + self.overlap_step * iteration as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("relaxation.cell-size", self.cell_size)?;
        require_positive("relaxation.radius-scale", self.radius_scale)?;
        require_positive("relaxation.initial-overlap", self.initial_overlap)?;
        require_non_negative("relaxation.overlap-step", self.overlap_step)?;
        require_non_negative("relaxation.tolerance", self.tolerance)?;
        require_positive("relaxation.attraction-range", self.attraction_range)?;
        require_non_negative("relaxation.repulsion-strength", self.repulsion_strength)?;
        require_non_negative("relaxation.attraction-strength", self.attraction_strength)?;
        require_positive("relaxation.nudge-distance", self.nudge_distance)?;
        require_at_least("relaxation.batch-size", self.batch_size, 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Blob sphere radius as a multiple of the van der Waals radius.
    pub sphere_scale: f64,
    /// Atoms of one group closer than this are joined by a strut, in Ångström.
    pub strut_cutoff: f64,
    /// Strut radius as a fraction of the smaller sphere it joins.
    pub strut_radius_fraction: f64,
    /// Position tolerance when matching detached atoms back to parsed atoms.
    pub match_tolerance: f64,
    pub placeholder_radius: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            sphere_scale: 1.6,
            strut_cutoff: 2.5,
            strut_radius_fraction: 0.25,
            match_tolerance: 0.05,
            placeholder_radius: 1.0,
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("surface.sphere-scale", self.sphere_scale)?;
        require_non_negative("surface.strut-cutoff", self.strut_cutoff)?;
        require_positive("surface.strut-radius-fraction", self.strut_radius_fraction)?;
        require_non_negative("surface.match-tolerance", self.match_tolerance)?;
        require_positive("surface.placeholder-radius", self.placeholder_radius)
    }
}

/// Parameters for every representation, plus the uniform rendering scale.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    pub bonds: BondConfig,
    pub ribbon: RibbonConfig,
    pub relaxation: RelaxationConfig,
    pub surface: SurfaceConfig,
    /// Factor applied to every output length (positions, radii, bond lengths).
    pub render_scale: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            bonds: BondConfig::default(),
            ribbon: RibbonConfig::default(),
            relaxation: RelaxationConfig::default(),
            surface: SurfaceConfig::default(),
            render_scale: 0.1,
        }
    }
}

impl GeometryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bonds.validate()?;
        self.ribbon.validate()?;
        self.relaxation.validate()?;
        self.surface.validate()?;
        require_positive("output.render-scale", self.render_scale)
    }
}

#[derive(Default)]
pub struct GeometryConfigBuilder {
    bonds: Option<BondConfig>,
    ribbon: Option<RibbonConfig>,
    relaxation: Option<RelaxationConfig>,
    surface: Option<SurfaceConfig>,
    render_scale: Option<f64>,
    seed: Option<u64>,
}

impl GeometryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bonds(mut self, config: BondConfig) -> Self {
        self.bonds = Some(config);
        self
    }
    pub fn ribbon(mut self, config: RibbonConfig) -> Self {
        self.ribbon = Some(config);
        self
    }
    pub fn relaxation(mut self, config: RelaxationConfig) -> Self {
        self.relaxation = Some(config);
        self
    }
    pub fn surface(mut self, config: SurfaceConfig) -> Self {
        self.surface = Some(config);
        self
    }
    pub fn render_scale(mut self, scale: f64) -> Self {
        self.render_scale = Some(scale);
        self
    }
    /// Overrides the relaxation seed without replacing the rest of its section.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<GeometryConfig, ConfigError> {
        let mut relaxation = self.relaxation.unwrap_or_default();
        if let Some(seed) = self.seed {
            relaxation.seed = seed;
        }
        let config = GeometryConfig {
            bonds: self.bonds.unwrap_or_default(),
            ribbon: self.ribbon.unwrap_or_default(),
            relaxation,
            surface: self.surface.unwrap_or_default(),
            render_scale: self.render_scale.unwrap_or(0.1),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GeometryConfig::default().validate().is_ok());
        assert_eq!(GeometryConfigBuilder::new().build().unwrap(), GeometryConfig::default());
    }

    #[test]
    fn permissive_cutoff_uses_pair_specific_thresholds_in_either_order() {
        let config = BondConfig::default();
        assert_eq!(config.permissive_cutoff_for(Element::Carbon, Element::Carbon), 1.8);
        assert_eq!(config.permissive_cutoff_for(Element::Hydrogen, Element::Oxygen), 2.0);
        assert_eq!(config.permissive_cutoff_for(Element::Sulfur, Element::Carbon), 2.0);
        assert_eq!(config.permissive_cutoff_for(Element::Iron, Element::Nitrogen), 2.8);
    }

    #[test]
    fn overlap_tightens_each_iteration() {
        let config = RelaxationConfig::default();
        assert!((config.overlap_at(0) - 0.82).abs() < 1e-12);
        assert!((config.overlap_at(5) - 0.92).abs() < 1e-12);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        let err = GeometryConfigBuilder::new().render_scale(0.0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { name: "output.render-scale", .. }
        ));

        let ribbon = RibbonConfig {
            tension: 1.5,
            ..RibbonConfig::default()
        };
        assert!(GeometryConfigBuilder::new().ribbon(ribbon).build().is_err());

        let relaxation = RelaxationConfig {
            batch_size: 0,
            ..RelaxationConfig::default()
        };
        assert!(GeometryConfigBuilder::new().relaxation(relaxation).build().is_err());
    }

    #[test]
    fn builder_seed_overrides_relaxation_section() {
        let config = GeometryConfigBuilder::new()
            .relaxation(RelaxationConfig {
                iterations: 2,
                ..RelaxationConfig::default()
            })
            .seed(99)
            .build()
            .unwrap();
        assert_eq!(config.relaxation.seed, 99);
        assert_eq!(config.relaxation.iterations, 2);
    }
}
