use crate::error::{CliError, Result};
use molscape::core::models::element::Element;
use molscape::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePairCutoff {
    pub a: String,
    pub b: String,
    pub max_distance: f64,
}

impl TryFrom<FilePairCutoff> for core_config::PairCutoff {
    type Error = CliError;

    fn try_from(p: FilePairCutoff) -> Result<Self> {
        let element = |symbol: &str| match Element::from_symbol(symbol) {
            Element::Unknown => Err(CliError::Config(format!(
                "Unknown element '{}' in bonds.pair-cutoffs",
                symbol
            ))),
            known => Ok(known),
        };
        Ok(Self {
            a: element(&p.a)?,
            b: element(&p.b)?,
            max_distance: p.max_distance,
        })
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBondsConfig {
    pub strict_cutoff: Option<f64>,
    pub permissive_cutoff: Option<f64>,
    pub underbonded_ratio: Option<f64>,
    pub pair_cutoffs: Option<Vec<FilePairCutoff>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRibbonConfig {
    pub smoothing_iterations: Option<usize>,
    pub helix_spacing: Option<f64>,
    pub sheet_spacing: Option<f64>,
    pub loop_spacing: Option<f64>,
    pub tension: Option<f64>,
    pub samples_per_span: Option<usize>,
    pub min_run_length: Option<usize>,
    pub simplified_helix_samples: Option<usize>,
    pub transition_window: Option<usize>,
    pub walk_radius: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRelaxationConfig {
    pub iterations: Option<usize>,
    pub cell_size: Option<f64>,
    pub radius_scale: Option<f64>,
    pub initial_overlap: Option<f64>,
    pub overlap_step: Option<f64>,
    pub tolerance: Option<f64>,
    pub attraction_range: Option<f64>,
    pub repulsion_strength: Option<f64>,
    pub attraction_strength: Option<f64>,
    pub nudge_distance: Option<f64>,
    pub batch_size: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSurfaceConfig {
    pub sphere_scale: Option<f64>,
    pub strut_cutoff: Option<f64>,
    pub strut_radius_fraction: Option<f64>,
    pub match_tolerance: Option<f64>,
    pub placeholder_radius: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOutputConfig {
    pub render_scale: Option<f64>,
    pub pretty: Option<bool>,
}

/// The on-disk TOML layout. Every key is optional; missing keys keep library defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bonds: Option<FileBondsConfig>,
    pub ribbon: Option<FileRibbonConfig>,
    pub relaxation: Option<FileRelaxationConfig>,
    pub surface: Option<FileSurfaceConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn read_table(path: &Path) -> Result<toml::Table> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| CliError::Config(e.to_string()))
    }
}

macro_rules! overlay {
    ($target:expr, $source:expr, [$($field:ident),+ $(,)?]) => {
        $(
            if let Some(value) = $source.$field {
                $target.$field = value;
            }
        )+
    };
}

impl FileBondsConfig {
    pub fn apply_to(self, base: &mut core_config::BondConfig) -> Result<()> {
        if let Some(pairs) = self.pair_cutoffs {
            base.pair_cutoffs = pairs
                .into_iter()
                .map(core_config::PairCutoff::try_from)
                .collect::<Result<_>>()?;
        }
        overlay!(base, self, [strict_cutoff, permissive_cutoff, underbonded_ratio]);
        Ok(())
    }
}

impl FileRibbonConfig {
    pub fn apply_to(self, base: &mut core_config::RibbonConfig) {
        overlay!(
            base,
            self,
            [
                smoothing_iterations,
                helix_spacing,
                sheet_spacing,
                loop_spacing,
                tension,
                samples_per_span,
                min_run_length,
                simplified_helix_samples,
                transition_window,
                walk_radius,
            ]
        );
    }
}

impl FileRelaxationConfig {
    pub fn apply_to(self, base: &mut core_config::RelaxationConfig) {
        overlay!(
            base,
            self,
            [
                iterations,
                cell_size,
                radius_scale,
                initial_overlap,
                overlap_step,
                tolerance,
                attraction_range,
                repulsion_strength,
                attraction_strength,
                nudge_distance,
                batch_size,
                seed,
            ]
        );
    }
}

impl FileSurfaceConfig {
    pub fn apply_to(self, base: &mut core_config::SurfaceConfig) {
        overlay!(
            base,
            self,
            [
                sphere_scale,
                strut_cutoff,
                strut_radius_fraction,
                match_tolerance,
                placeholder_radius,
            ]
        );
    }
}
