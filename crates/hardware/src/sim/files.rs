//! Simulation file plumbing: path layout, inputs, and output handles.
//!
//! This module gathers the twenty-seven files of a simulation run. It
//! provides:
//! 1. **`SimPaths`:** The positional path layout, with the default relative
//!    file names used when no arguments are given.
//! 2. **`SimInputs`:** The loaded instruction and memory images.
//! 3. **`SimOutputs`:** Buffered writer handles for every trace and dump,
//!    passed into the simulator at construction.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::common::SimError;
use crate::common::constants::{IMEM_WORDS, MEM_WORDS, NUM_CORES};
use crate::sim::loader;

/// Number of positional file paths of a fully explicit invocation.
pub const NUM_PATHS: usize = 27;

/// The file-path layout of one simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimPaths {
    /// Per-core instruction memory images (in).
    pub imem: [PathBuf; NUM_CORES],
    /// Main-memory image (in).
    pub memin: PathBuf,
    /// Final main-memory dump (out).
    pub memout: PathBuf,
    /// Per-core register dumps (out).
    pub regout: [PathBuf; NUM_CORES],
    /// Per-core execution traces (out).
    pub trace: [PathBuf; NUM_CORES],
    /// Bus trace (out).
    pub bustrace: PathBuf,
    /// Per-core DSRAM dumps (out).
    pub dsram: [PathBuf; NUM_CORES],
    /// Per-core TSRAM dumps (out).
    pub tsram: [PathBuf; NUM_CORES],
    /// Per-core stats files (out).
    pub stats: [PathBuf; NUM_CORES],
}

fn per_core(prefix: &str, suffix: &str) -> [PathBuf; NUM_CORES] {
    std::array::from_fn(|id| PathBuf::from(format!("{prefix}{id}{suffix}")))
}

impl SimPaths {
    /// The default relative layout (`imem0.txt` .. `stats3.txt`).
    pub fn default_layout() -> Self {
        Self {
            imem: per_core("imem", ".txt"),
            memin: PathBuf::from("memin.txt"),
            memout: PathBuf::from("memout.txt"),
            regout: per_core("regout", ".txt"),
            trace: per_core("core", "trace.txt"),
            bustrace: PathBuf::from("bustrace.txt"),
            dsram: per_core("dsram", ".txt"),
            tsram: per_core("tsram", ".txt"),
            stats: per_core("stats", ".txt"),
        }
    }

    /// Builds the layout from the 27 positional paths, in argument order.
    ///
    /// Returns `None` unless exactly [`NUM_PATHS`] paths are given.
    pub fn from_argv(paths: &[PathBuf]) -> Option<Self> {
        if paths.len() != NUM_PATHS {
            return None;
        }
        let group = |base: usize| -> [PathBuf; NUM_CORES] {
            std::array::from_fn(|id| paths[base + id].clone())
        };
        Some(Self {
            imem: group(0),
            memin: paths[4].clone(),
            memout: paths[5].clone(),
            regout: group(6),
            trace: group(10),
            bustrace: paths[14].clone(),
            dsram: group(15),
            tsram: group(19),
            stats: group(23),
        })
    }
}

/// Loaded input images of one simulation run.
#[derive(Clone, Debug, Default)]
pub struct SimInputs {
    /// Per-core instruction images.
    pub imem: [Vec<u32>; NUM_CORES],
    /// Main-memory image.
    pub mem_image: Vec<u32>,
}

/// Output handles of one core.
pub struct CoreFiles {
    /// Execution trace.
    pub trace: Box<dyn Write>,
    /// Register dump.
    pub regout: Box<dyn Write>,
    /// DSRAM dump.
    pub dsram: Box<dyn Write>,
    /// TSRAM dump.
    pub tsram: Box<dyn Write>,
    /// Stats file.
    pub stats: Box<dyn Write>,
}

impl std::fmt::Debug for CoreFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreFiles").finish_non_exhaustive()
    }
}

/// All output handles of one simulation run.
pub struct SimOutputs {
    /// Bus trace.
    pub bus_trace: Box<dyn Write>,
    /// Final main-memory dump.
    pub memout: Box<dyn Write>,
    /// Per-core output handles.
    pub cores: [CoreFiles; NUM_CORES],
}

impl std::fmt::Debug for SimOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimOutputs").finish_non_exhaustive()
    }
}

impl SimOutputs {
    /// Discards everything; used by tests that only inspect machine state.
    pub fn sink() -> Self {
        let null = || Box::new(io::sink()) as Box<dyn Write>;
        Self {
            bus_trace: null(),
            memout: null(),
            cores: std::array::from_fn(|_| CoreFiles {
                trace: null(),
                regout: null(),
                dsram: null(),
                tsram: null(),
                stats: null(),
            }),
        }
    }

    /// Flushes every output handle.
    ///
    /// # Errors
    ///
    /// Propagates the first flush failure.
    pub fn flush(&mut self) -> io::Result<()> {
        self.bus_trace.flush()?;
        self.memout.flush()?;
        for core in &mut self.cores {
            core.trace.flush()?;
            core.regout.flush()?;
            core.dsram.flush()?;
            core.tsram.flush()?;
            core.stats.flush()?;
        }
        Ok(())
    }
}

fn create_writer(path: &Path, errors: &mut Vec<SimError>) -> Box<dyn Write> {
    match File::create(path) {
        Ok(file) => Box::new(BufWriter::new(file)),
        Err(source) => {
            errors.push(SimError::CreateOutput {
                path: path.to_path_buf(),
                source,
            });
            Box::new(io::sink())
        }
    }
}

/// Loads every input and creates every output of the run.
///
/// All failures are collected so the caller can report each offending file
/// before exiting.
///
/// # Errors
///
/// Returns every open, parse, and create failure encountered.
pub fn open_simulation(paths: &SimPaths) -> Result<(SimInputs, SimOutputs), Vec<SimError>> {
    let mut errors = Vec::new();

    let mut inputs = SimInputs::default();
    for (id, path) in paths.imem.iter().enumerate() {
        match loader::load_hex_words(path, IMEM_WORDS) {
            Ok(words) => inputs.imem[id] = words,
            Err(err) => errors.push(err),
        }
    }
    match loader::load_hex_words(&paths.memin, MEM_WORDS) {
        Ok(words) => inputs.mem_image = words,
        Err(err) => errors.push(err),
    }

    let mut core_files = Vec::with_capacity(NUM_CORES);
    for id in 0..NUM_CORES {
        core_files.push(CoreFiles {
            trace: create_writer(&paths.trace[id], &mut errors),
            regout: create_writer(&paths.regout[id], &mut errors),
            dsram: create_writer(&paths.dsram[id], &mut errors),
            tsram: create_writer(&paths.tsram[id], &mut errors),
            stats: create_writer(&paths.stats[id], &mut errors),
        });
    }
    let outputs = SimOutputs {
        bus_trace: create_writer(&paths.bustrace, &mut errors),
        memout: create_writer(&paths.memout, &mut errors),
        cores: match core_files.try_into() {
            Ok(cores) => cores,
            Err(_) => return Err(errors),
        },
    };

    if errors.is_empty() {
        Ok((inputs, outputs))
    } else {
        Err(errors)
    }
}
