use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::DeriveArgs;
use crate::error::{CliError, Result};
use molscape::engine::config as core_config;
use tracing::debug;

/// Resolves the final configuration for `derive`.
///
/// Precedence, highest first: dedicated CLI flags, `--set KEY=VALUE` pairs, the
/// TOML file, library defaults.
pub fn build_config(args: &DeriveArgs) -> Result<AppConfig> {
    let mut table = match &args.config {
        Some(path) => FileConfig::read_table(path)?,
        None => toml::Table::new(),
    };
    apply_set_values(&mut table, &args.set_values)?;
    let file = FileConfig::from_table(table)?;

    let mut bonds = core_config::BondConfig::default();
    if let Some(section) = file.bonds {
        section.apply_to(&mut bonds)?;
    }
    let mut ribbon = core_config::RibbonConfig::default();
    if let Some(section) = file.ribbon {
        section.apply_to(&mut ribbon);
    }
    let mut relaxation = core_config::RelaxationConfig::default();
    if let Some(section) = file.relaxation {
        section.apply_to(&mut relaxation);
    }
    let mut surface = core_config::SurfaceConfig::default();
    if let Some(section) = file.surface {
        section.apply_to(&mut surface);
    }
    let output = file.output.unwrap_or_default();

    let mut builder = core_config::GeometryConfigBuilder::new()
        .bonds(bonds)
        .ribbon(ribbon)
        .relaxation(relaxation)
        .surface(surface);
    if let Some(scale) = args.render_scale.or(output.render_scale) {
        builder = builder.render_scale(scale);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let geometry = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let model_index = args
        .model
        .checked_sub(1)
        .ok_or_else(|| CliError::Argument("--model counts from 1".to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        model_index,
        representation: args.representation,
        pretty: args.pretty || output.pretty.unwrap_or(false),
        geometry,
    })
}

fn parse_set_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn apply_set_values(table: &mut toml::Table, set_values: &[String]) -> Result<()> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let Some((section, field)) = key.trim().split_once('.') else {
            return Err(CliError::Config(format!(
                "Unsupported configuration key for --set: '{}'. Expected SECTION.KEY.",
                key
            )));
        };

        let value = parse_set_value(value_str.trim());
        debug!("Applying --set {}.{} = {}", section, field, value);
        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(section_table) = entry else {
            return Err(CliError::Config(format!(
                "Configuration key '{}' is not a section",
                section
            )));
        };
        section_table.insert(field.to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn derive_args(extra: &[&str]) -> DeriveArgs {
        let mut args = vec!["molscape", "derive", "-i", "in.pdb"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Derive(args) => args,
            _ => panic!("Expected 'derive' subcommand"),
        }
    }

    fn with_config(path: &Path, extra: &[&str]) -> DeriveArgs {
        let mut args = vec!["-c", path.to_str().unwrap()];
        args.extend_from_slice(extra);
        derive_args(&args)
    }

    #[test]
    fn no_config_uses_library_defaults() {
        let config = build_config(&derive_args(&[])).unwrap();
        assert_eq!(config.geometry, core_config::GeometryConfig::default());
        assert_eq!(config.model_index, 0);
        assert!(!config.pretty);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "geometry.toml",
            r#"
        [bonds]
        strict-cutoff = 2.0
        pair-cutoffs = [{ a = "C", b = "S", max-distance = 2.1 }]

        [ribbon]
        samples-per-span = 12

        [relaxation]
        iterations = 3
        seed = 11

        [output]
        render-scale = 1.0
        pretty = true
        "#,
        );
        let config = build_config(&with_config(&path, &[])).unwrap();
        assert_eq!(config.geometry.bonds.strict_cutoff, 2.0);
        assert_eq!(config.geometry.bonds.pair_cutoffs.len(), 1);
        assert_eq!(config.geometry.ribbon.samples_per_span, 12);
        assert_eq!(config.geometry.ribbon.tension, 0.2);
        assert_eq!(config.geometry.relaxation.iterations, 3);
        assert_eq!(config.geometry.relaxation.seed, 11);
        assert_eq!(config.geometry.render_scale, 1.0);
        assert!(config.pretty);
    }

    #[test]
    fn set_values_override_file_and_flags_override_both() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "geometry.toml",
            "[relaxation]\niterations = 3\nseed = 11\n[output]\nrender-scale = 0.5\n",
        );
        let args = with_config(
            &path,
            &[
                "-S",
                "relaxation.iterations=9",
                "-S",
                "relaxation.seed=12",
                "-S",
                "surface.sphere-scale=2.0",
                "--seed",
                "13",
                "--render-scale",
                "0.2",
            ],
        );
        let config = build_config(&args).unwrap();
        assert_eq!(config.geometry.relaxation.iterations, 9);
        assert_eq!(config.geometry.relaxation.seed, 13);
        assert_eq!(config.geometry.surface.sphere_scale, 2.0);
        assert_eq!(config.geometry.render_scale, 0.2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "bad.toml", "[ribbon]\nwidth = 3.0\n");
        assert!(matches!(
            build_config(&with_config(&path, &[])),
            Err(CliError::Config(_))
        ));

        let args = derive_args(&["-S", "relaxation.speed=2"]);
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["relaxation.iterations", "iterations=3"] {
            let args = derive_args(&["-S", bad]);
            assert!(matches!(build_config(&args), Err(CliError::Config(_))));
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let args = derive_args(&["-S", "relaxation.cell-size=-1.0"]);
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_pair_cutoff_element_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "pairs.toml",
            "[bonds]\npair-cutoffs = [{ a = \"Qq\", b = \"C\", max-distance = 1.5 }]\n",
        );
        assert!(matches!(
            build_config(&with_config(&path, &[])),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn model_zero_is_an_argument_error() {
        let args = derive_args(&["--model", "0"]);
        assert!(matches!(build_config(&args), Err(CliError::Argument(_))));
    }

    #[test]
    fn unreadable_config_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "broken.toml", "[relaxation\n");
        assert!(matches!(
            build_config(&with_config(&path, &[])),
            Err(CliError::FileParsing { .. })
        ));
    }
}
