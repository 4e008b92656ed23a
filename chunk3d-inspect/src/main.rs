/// Chunk3D Inspect - summarize a binary scene file
///
/// Usage: chunk3d-inspect [--materials] [--no-progress] [-v] <path>

use std::fs::File;
use std::io::{stdout, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chunk3d_inspect::{InspectApp, InspectOptions};
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "chunk3d-inspect",
    version,
    about = "Decode a binary scene file and summarize its contents"
)]
struct Args {
    /// Model file to decode
    path: PathBuf,

    /// Do not draw the progress line
    #[arg(long)]
    no_progress: bool,

    /// Also list the material table
    #[arg(long)]
    materials: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("Loading model file: {}", args.path.display());
    let file = File::open(&args.path)
        .with_context(|| format!("Failed to open model file: {}", args.path.display()))?;
    let mut reader = BufReader::new(file);

    let app = InspectApp::new(InspectOptions {
        progress: !args.no_progress,
        list_materials: args.materials,
    });
    app.run(&mut reader, &mut stdout())
        .with_context(|| format!("Failed to decode {}", args.path.display()))?;

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}
