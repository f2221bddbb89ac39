use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "squeeze")]
#[command(about = "Losslessly re-encode images in place and report the space saved", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the given paths and convert every image found
    Convert(ConvertArgs),
    /// List the images a conversion would pick up
    Scan(ScanArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Files or directories; defaults to `input_paths` from the configuration
    pub paths: Vec<PathBuf>,
    /// Move originals to the trash after a conversion that saved space
    #[arg(long)]
    pub delete_original: bool,
    /// Keep converted files even when they are not smaller
    #[arg(long)]
    pub keep_larger: bool,
    /// Maximum number of files converted at once (default: CPU count)
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Files or directories; defaults to `input_paths` from the configuration
    pub paths: Vec<PathBuf>,
}
