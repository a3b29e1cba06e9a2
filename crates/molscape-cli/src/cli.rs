use clap::{Args, Parser, Subcommand};
use molscape::workflows::derive::Representation;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "molscape CLI - Parse Protein Data Bank files and derive ball-and-stick, space-filling, ribbon and surface geometry.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a summary of a structure file: header, models, chains and composition.
    Inspect(InspectArgs),
    /// Derive renderable geometry for one representation and write it as JSON.
    Derive(DeriveArgs),
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the input structure file (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Print the summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `derive` subcommand.
#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Path to the input structure file (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Representation to derive: ball-and-stick, space-filling, ribbon or surface.
    #[arg(short, long, value_name = "KIND", default_value = "ball-and-stick")]
    pub representation: Representation,

    /// Path for the output JSON file. Writes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a geometry configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model to use, counted from 1 in file order.
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub model: usize,

    /// Override the relaxation seed from the config file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the render scale applied to all output coordinates.
    #[arg(long, value_name = "FLOAT")]
    pub render_scale: Option<f64>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S relaxation.iterations=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_arguments_parse_with_defaults() {
        let cli = Cli::parse_from(["molscape", "derive", "-i", "in.pdb"]);
        let Commands::Derive(args) = cli.command else {
            panic!("Expected 'derive' subcommand");
        };
        assert_eq!(args.representation, Representation::BallAndStick);
        assert_eq!(args.model, 1);
        assert!(args.output.is_none());
        assert!(args.set_values.is_empty());
    }

    #[test]
    fn derive_arguments_accept_overrides() {
        let cli = Cli::parse_from([
            "molscape",
            "-vv",
            "derive",
            "-i",
            "in.pdb",
            "-r",
            "cartoon",
            "-o",
            "out.json",
            "--seed",
            "7",
            "-S",
            "ribbon.tension=0.3",
            "-S",
            "relaxation.iterations=2",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Derive(args) = cli.command else {
            panic!("Expected 'derive' subcommand");
        };
        assert_eq!(args.representation, Representation::Ribbon);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.set_values.len(), 2);
    }

    #[test]
    fn unknown_representation_is_rejected() {
        let result = Cli::try_parse_from(["molscape", "derive", "-i", "in.pdb", "-r", "wireframe"]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["molscape", "-q", "-v", "inspect", "-i", "in.pdb"]);
        assert!(result.is_err());
    }
}
