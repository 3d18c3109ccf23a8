//! Top-level simulator: the four cores, their caches, the bus, and memory.
//!
//! Each cycle runs one bus iteration and then steps the cores in id order, so
//! a transaction enqueued by a core in cycle N reaches the bus in cycle N+1
//! at the earliest. The run ends when every core has halted, after which the
//! register, cache, stats, and memory dumps are written. Caches are not
//! force-flushed at shutdown; the memory dump reflects only write-backs that
//! actually happened.

use crate::common::SimError;
use crate::common::constants::NUM_CORES;
use crate::config::Config;
use crate::core::Core;
use crate::core::cache::Cache;
use crate::sim::files::{SimInputs, SimOutputs};
use crate::soc::interconnect::Bus;
use crate::soc::memory::MainMemory;

/// The whole simulated machine plus its output handles.
#[derive(Debug)]
pub struct Simulator {
    bus: Bus,
    memory: MainMemory,
    cores: [Core; NUM_CORES],
    caches: [Cache; NUM_CORES],
    outputs: SimOutputs,
}

impl Simulator {
    /// Builds the machine from loaded inputs and opened outputs.
    pub fn new(config: &Config, inputs: SimInputs, outputs: SimOutputs) -> Self {
        let [imem0, imem1, imem2, imem3] = inputs.imem;
        Self {
            bus: Bus::new(),
            memory: MainMemory::new(&config.memory, inputs.mem_image),
            cores: [
                Core::new(0, imem0),
                Core::new(1, imem1),
                Core::new(2, imem2),
                Core::new(3, imem3),
            ],
            caches: std::array::from_fn(Cache::new),
            outputs,
        }
    }

    /// Returns whether every core has halted.
    pub fn halted(&self) -> bool {
        self.cores.iter().all(Core::halted)
    }

    /// Advances the machine by one clock cycle.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the trace writers.
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.bus
            .tick(&mut self.caches, &mut self.memory, &mut *self.outputs.bus_trace)?;
        for id in 0..NUM_CORES {
            self.cores[id].step(
                &mut self.caches[id],
                &mut self.bus,
                &mut *self.outputs.cores[id].trace,
            )?;
        }
        Ok(())
    }

    /// Runs the machine to completion and writes every dump file.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the trace and dump writers.
    pub fn run(&mut self) -> Result<(), SimError> {
        while !self.halted() {
            self.tick()?;
        }
        tracing::info!(bus_cycles = self.bus.iteration(), "processor halted");
        self.write_dumps()
    }

    /// One of the cores (tests and inspection).
    pub fn core(&self, id: usize) -> &Core {
        &self.cores[id]
    }

    /// One of the caches (tests and inspection).
    pub fn cache(&self, id: usize) -> &Cache {
        &self.caches[id]
    }

    /// Main memory (tests and inspection).
    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    fn write_dumps(&mut self) -> Result<(), SimError> {
        for id in 0..NUM_CORES {
            let files = &mut self.outputs.cores[id];
            self.cores[id].write_regout(&mut *files.regout)?;
            self.caches[id].dump(&mut *files.dsram, &mut *files.tsram)?;
            self.cores[id].write_stats(&self.caches[id], &mut *files.stats)?;
        }
        self.memory.dump(&mut *self.outputs.memout)?;
        self.outputs.flush()?;
        Ok(())
    }
}
