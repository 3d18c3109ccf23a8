//! Processor core: architectural state plus the pipeline that drives it.
//!
//! A core owns its PC, register file, instruction memory, and pipeline. Its
//! data cache lives alongside it in the system (the bus needs mutable access
//! to all four caches every cycle) and is handed in for each step.

/// Per-core data cache with MESI snooping.
pub mod cache;

/// Five-stage in-order pipeline.
pub mod pipeline;

use std::io::{self, Write};

use crate::common::RegisterFile;
use crate::common::constants::{FIRST_MUTABLE_REG, IMEM_WORDS, NUM_REGS};
use crate::core::cache::Cache;
use crate::core::pipeline::Pipeline;
use crate::soc::interconnect::Bus;
use crate::stats::{self, CoreCounters};

/// One of the four processor cores.
#[derive(Debug)]
pub struct Core {
    id: usize,
    pc: u16,
    regs: RegisterFile,
    imem: Vec<u32>,
    pipeline: Pipeline,
    halted: bool,
    counters: CoreCounters,
}

impl Core {
    /// Creates core `id` with the given instruction image.
    ///
    /// Images are capped at the instruction-memory size. A core with no
    /// instructions at all starts halted.
    pub fn new(id: usize, mut imem: Vec<u32>) -> Self {
        imem.truncate(IMEM_WORDS);
        let halted = imem.is_empty();
        Self {
            id,
            pc: 0,
            regs: RegisterFile::new(),
            imem,
            pipeline: Pipeline::new(),
            halted,
            counters: CoreCounters::default(),
        }
    }

    /// Returns whether this core has fully halted.
    #[inline]
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Current architectural register state.
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// The core's pipeline (tests and traces).
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Cycle and instruction counters accumulated so far.
    pub fn counters(&self) -> &CoreCounters {
        &self.counters
    }

    /// Runs the core for one cycle.
    ///
    /// A halted core does nothing. Once the pipeline has drained after a
    /// HALT, the core latches halted without tracing the cycle. Otherwise the
    /// cycle is counted, the pipeline runs, the trace line is written (stage
    /// PCs after execution, register values from the start of the cycle), and
    /// the end-of-cycle shift advances the stages.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the trace writer.
    pub fn step(&mut self, cache: &mut Cache, bus: &mut Bus, trace: &mut dyn Write) -> io::Result<()> {
        if self.halted {
            return Ok(());
        }
        if self.pipeline.flushed() {
            self.halted = true;
            tracing::debug!(core = self.id, cycles = self.counters.cycles, "core halted");
            return Ok(());
        }

        let regs_at_start = self.regs.snapshot();

        self.counters.cycles += 1;
        if !self.pipeline.halted() && !self.pipeline.mem_stall() && !self.pipeline.data_stall() {
            self.counters.instructions += 1;
        }

        self.pipeline
            .iterate(&mut self.regs, &mut self.pc, &self.imem, cache, bus);

        self.write_trace_line(trace, &regs_at_start)?;
        self.pipeline.insert_bubbles();
        Ok(())
    }

    /// Writes the final register values (R2..R15), one hex word per line.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the writer.
    pub fn write_regout(&self, out: &mut dyn Write) -> io::Result<()> {
        for idx in FIRST_MUTABLE_REG..NUM_REGS {
            writeln!(out, "{:08X}", self.regs.read(idx))?;
        }
        Ok(())
    }

    /// Writes this core's stats file.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the writer.
    pub fn write_stats(&self, cache: &Cache, out: &mut dyn Write) -> io::Result<()> {
        stats::write_core_stats(out, &self.counters, cache.stats(), self.pipeline.stats())
    }

    fn write_trace_line(&self, out: &mut dyn Write, regs: &[u32; NUM_REGS]) -> io::Result<()> {
        write!(out, "{} ", self.counters.cycles)?;
        self.pipeline.write_stage_pcs(out)?;
        for value in &regs[FIRST_MUTABLE_REG..] {
            write!(out, "{value:08X} ")?;
        }
        writeln!(out)
    }
}
