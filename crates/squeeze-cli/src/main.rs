mod commands;
mod logging;
mod progress;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ConvertArgs, ScanArgs};
use dotenv::dotenv;
use progress::CliReporter;
use squeeze_core::{AppConfig, ConvertEngine};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = squeeze_core::config::load_configuration()
        .context("Error loading configuration")?;

    let args = Cli::parse();

    match args.command {
        Some(Commands::Convert(convert_args)) => run_convert(config, convert_args)?,
        Some(Commands::Scan(scan_args)) => run_scan(config, scan_args)?,
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn input_paths(config: &AppConfig, paths: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths);
    }
    if config.input_paths.is_empty() {
        bail!("No input paths given and none configured in input_paths");
    }
    Ok(config.input_paths.iter().map(PathBuf::from).collect())
}

fn run_convert(mut config: AppConfig, args: ConvertArgs) -> anyhow::Result<()> {
    let paths = input_paths(&config, args.paths)?;
    if args.delete_original {
        config.delete_original = true;
    }
    if args.keep_larger {
        config.skip_negative = false;
    }
    if args.workers.is_some() {
        config.max_workers = args.workers;
    }

    let engine = ConvertEngine::new(config);
    let reporter = CliReporter::new();
    let result = engine.run(&paths, &reporter)?;

    if engine.config().delete_original {
        info!("Waiting for originals to reach the trash...");
        let summary = engine.wait_for_disposals();
        if summary.failed > 0 {
            error!("{} original(s) could not be moved to the trash", summary.failed);
        }
        info!(
            "{} original(s) moved to the trash",
            format!("{}", summary.trashed).cyan()
        );
    }

    println!();
    info!(
        "Scan: {}, Convert: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.convert_duration.as_secs_f64()).green(),
    );
    info!(
        "{} of {} images processed, {} bytes saved",
        format!("{}", result.progress.processed).green(),
        format!("{}", result.progress.total).green(),
        format!("{}", result.progress.saved_bytes).green(),
    );

    Ok(())
}

fn run_scan(config: AppConfig, args: ScanArgs) -> anyhow::Result<()> {
    let paths = input_paths(&config, args.paths)?;
    let engine = ConvertEngine::new(config);
    let candidates = engine.scan(&paths, &CliReporter::new())?;

    for file in &candidates {
        println!("{}", file.path().display());
    }
    info!("{} images found", format!("{}", candidates.len()).cyan());

    Ok(())
}
