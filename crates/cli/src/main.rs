//! Multicore MESI simulator CLI.
//!
//! Runs one simulation to completion. All file paths are positional and
//! optional: with no arguments the default relative layout is used
//! (`imem0.txt` .. `stats3.txt` in the working directory); with exactly 27
//! paths the explicit layout is used. Exits 0 on success and 1 when any
//! required file fails to open.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcsim_core::Config;
use mcsim_core::Simulator;
use mcsim_core::sim::files::{self, NUM_PATHS, SimPaths};

#[derive(Parser, Debug)]
#[command(
    name = "sim",
    author,
    version,
    about = "Cycle-accurate four-core MESI multicore simulator",
    long_about = "Simulate four five-stage cores with MESI-coherent data caches on a shared bus.\n\n\
        Pass no paths to use the default relative layout, or all 27 paths in order:\n\
        imem0..3 memin memout regout0..3 core0..3trace bustrace dsram0..3 tsram0..3 stats0..3"
)]
struct Cli {
    /// Input and output files, in fixed positional order (all 27 or none).
    paths: Vec<PathBuf>,

    /// Optional JSON configuration file (memory timing).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let paths = if cli.paths.is_empty() {
        SimPaths::default_layout()
    } else {
        match SimPaths::from_argv(&cli.paths) {
            Some(paths) => paths,
            None => {
                eprintln!(
                    "error: expected no paths or exactly {NUM_PATHS}, got {}",
                    cli.paths.len()
                );
                process::exit(1);
            }
        }
    };

    let config = match cli.config {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => match Config::from_json(&text) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("error: {err}");
                    process::exit(1);
                }
            },
            Err(err) => {
                eprintln!("error: failed to read config '{}': {err}", path.display());
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let (inputs, outputs) = match files::open_simulation(&paths) {
        Ok(opened) => opened,
        Err(errors) => {
            for err in &errors {
                eprintln!("error: {err}");
            }
            process::exit(1);
        }
    };

    let mut simulator = Simulator::new(&config, inputs, outputs);
    if let Err(err) = simulator.run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
