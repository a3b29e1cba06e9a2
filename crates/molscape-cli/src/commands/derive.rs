use super::load_structure;
use crate::cli::DeriveArgs;
use crate::config::{AppConfig, build_config};
use crate::error::Result;
use crate::progress::CliProgressHandler;
use molscape::engine::cancel::CancellationToken;
use molscape::engine::progress::ProgressReporter;
use molscape::workflows::derive::{self as workflow, Geometry};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

fn write_geometry(geometry: &Geometry, pretty: bool, writer: impl Write) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, geometry)?;
    } else {
        serde_json::to_writer(&mut writer, geometry)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn execute(config: &AppConfig, progress: &CliProgressHandler) -> Result<Geometry> {
    let structure = load_structure(&config.input_path)?;
    let model = workflow::select_model(&structure, config.model_index)?;

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let cancel = CancellationToken::new();

    info!(
        "Deriving {} geometry for model {} ({} atoms)",
        config.representation,
        model.number(),
        model.atom_count()
    );
    let geometry = workflow::derive(
        model,
        config.representation,
        &config.geometry,
        &reporter,
        &cancel,
    );
    progress.finish();
    Ok(geometry?)
}

fn emit(geometry: &Geometry, config: &AppConfig) -> Result<()> {
    match config.output_path.as_deref() {
        Some(path) => {
            write_geometry(geometry, config.pretty, File::create(path)?)?;
            info!("Geometry written to {:?}", path);
            eprintln!(
                "✓ {} geometry ({} primitives) written to: {}",
                geometry.representation(),
                geometry.primitive_count(),
                path.display()
            );
        }
        None => write_geometry(geometry, config.pretty, io::stdout().lock())?,
    }
    Ok(())
}

pub fn run(args: DeriveArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args)?;
    let progress = if quiet || config.output_path.is_none() {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };

    let geometry = execute(&config, &progress)?;
    emit(&geometry, &config)
}
