//! Five-stage in-order pipeline.
//!
//! This module implements the execution engine of one core. It provides:
//! 1. **Stage Execution:** Fetch, decode, execute, memory, and write-back,
//!    run back-to-front each cycle from the first unstalled stage.
//! 2. **Branch Resolution:** Branches evaluate in decode and redirect the PC;
//!    already-fetched wrong-path instructions drain without being squashed.
//! 3. **Stalls:** Read-after-write hazards hold decode; an incomplete cache
//!    access holds the memory stage and everything behind it.
//! 4. **Bubble Propagation:** The end-of-cycle shift that advances records
//!    and inserts bubbles where a stage produced nothing.

/// Hazard detection.
pub mod hazards;

/// Stage slots and the stage enum.
pub mod latches;

use std::io::{self, Write};

use crate::common::RegisterFile;
use crate::common::constants::{BRANCH_TARGET_MASK, BUBBLE_PC, LINK_REG, PIPE_DEPTH};
use crate::core::cache::Cache;
use crate::isa::{Instruction, Opcode, alu};
use crate::soc::interconnect::Bus;
use crate::stats::PipelineStats;

pub use latches::{Stage, StageSlot};

/// The pipeline of one core.
#[derive(Debug)]
pub struct Pipeline {
    slots: [StageSlot; PIPE_DEPTH],
    halted: bool,
    data_stall: bool,
    mem_stall: bool,
    stats: PipelineStats,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates a pipeline with every stage empty except fetch, which points
    /// at PC 0.
    pub fn new() -> Self {
        let mut slots = [StageSlot::bubble(); PIPE_DEPTH];
        slots[Stage::Fetch as usize].pc = 0;
        Self {
            slots,
            halted: false,
            data_stall: false,
            mem_stall: false,
            stats: PipelineStats::default(),
        }
    }

    /// Returns whether a HALT has been decoded.
    #[inline]
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Returns whether decode is held by a data hazard.
    #[inline]
    pub fn data_stall(&self) -> bool {
        self.data_stall
    }

    /// Returns whether the memory stage is held by the cache.
    #[inline]
    pub fn mem_stall(&self) -> bool {
        self.mem_stall
    }

    /// Stall counters accumulated so far.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// The record currently held by `stage` (tests and traces).
    pub fn slot(&self, stage: Stage) -> &StageSlot {
        &self.slots[stage as usize]
    }

    /// Returns whether the pipeline has fully drained after a HALT.
    pub fn flushed(&self) -> bool {
        self.halted && self.slots.iter().all(StageSlot::is_bubble)
    }

    /// Runs one cycle of stage execution.
    ///
    /// Recomputes the hazard wire, picks the first stage allowed to run
    /// (memory under a memory stall, execute under a data stall, decode
    /// otherwise), fetches unless halted, then executes every occupied stage
    /// from that point on and updates the stall counters.
    pub fn iterate(
        &mut self,
        regs: &mut RegisterFile,
        pc: &mut u16,
        imem: &[u32],
        cache: &mut Cache,
        bus: &mut Bus,
    ) {
        self.data_stall = hazards::data_hazard(&self.slots);

        let start = if self.mem_stall {
            Stage::Mem
        } else if self.data_stall {
            Stage::Execute
        } else {
            Stage::Decode
        };

        if !self.halted {
            self.fetch(pc, imem);
        }

        for idx in (start as usize)..PIPE_DEPTH {
            if self.slots[idx].is_bubble() {
                continue;
            }
            match idx {
                i if i == Stage::Decode as usize => self.decode(regs, pc),
                i if i == Stage::Execute as usize => self.execute(regs),
                i if i == Stage::Mem as usize => self.mem(regs, cache, bus),
                _ => self.write_back(regs),
            }
        }

        self.stats.decode_stalls += u64::from(self.data_stall && !self.mem_stall);
        self.stats.mem_stalls += u64::from(self.mem_stall);
    }

    /// End-of-cycle shift: advances records back-to-front and inserts
    /// bubbles.
    ///
    /// A memory stall retires only write-back; a data hazard re-injects a
    /// bubble into execute while decode holds. Once halted, fetch and decode
    /// stay empty so the pipeline drains.
    pub fn insert_bubbles(&mut self) {
        for stage in (1..PIPE_DEPTH).rev() {
            if self.mem_stall {
                self.slots[Stage::WriteBack as usize].pc = BUBBLE_PC;
                break;
            }
            if self.data_stall && stage == Stage::Execute as usize {
                self.slots[stage].pc = BUBBLE_PC;
                break;
            }
            if self.slots[stage - 1].is_bubble() {
                self.slots[stage].pc = BUBBLE_PC;
            } else {
                self.slots[stage] = self.slots[stage - 1];
            }
        }

        if self.halted {
            self.slots[Stage::Fetch as usize].pc = BUBBLE_PC;
            self.slots[Stage::Decode as usize].pc = BUBBLE_PC;
        }
    }

    /// Writes the five stage PCs of the trace line (`%03X` or `---`, each
    /// followed by a space).
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the writer.
    pub fn write_stage_pcs(&self, out: &mut dyn Write) -> io::Result<()> {
        for slot in &self.slots {
            if slot.is_bubble() {
                write!(out, "--- ")?;
            } else {
                write!(out, "{:03X} ", slot.pc)?;
            }
        }
        Ok(())
    }

    fn fetch(&mut self, pc: &mut u16, imem: &[u32]) {
        // Inert while the memory stage holds the pipeline.
        if self.mem_stall {
            return;
        }
        let slot = &mut self.slots[Stage::Fetch as usize];
        slot.pc = *pc;
        slot.inst = Instruction(imem.get(*pc as usize).copied().unwrap_or(0));
        if !self.data_stall {
            *pc = pc.wrapping_add(1);
        }
    }

    fn decode(&mut self, regs: &mut RegisterFile, pc: &mut u16) {
        let inst = self.slots[Stage::Decode as usize].inst;
        let Some(op) = inst.opcode() else {
            return;
        };
        if op == Opcode::Halt {
            self.halted = true;
            return;
        }
        if op.is_branch() {
            let (rs, rt) = self.gather_operands(Stage::Decode, regs);
            if alu::branch_taken(op, rs, rt) {
                let target = self.slots[Stage::Decode as usize].result;
                *pc = (target & BRANCH_TARGET_MASK) as u16;
            }
        }
    }

    fn execute(&mut self, regs: &mut RegisterFile) {
        let inst = self.slots[Stage::Execute as usize].inst;
        let Some(op) = inst.opcode() else {
            return;
        };
        if !op.is_branch() && !op.is_memory() && op != Opcode::Halt {
            let (rs, rt) = self.gather_operands(Stage::Execute, regs);
            self.slots[Stage::Execute as usize].result = alu::execute(op, rs, rt);
        }
    }

    fn mem(&mut self, regs: &mut RegisterFile, cache: &mut Cache, bus: &mut Bus) {
        let inst = self.slots[Stage::Mem as usize].inst;
        let Some(op) = inst.opcode() else {
            return;
        };
        if !op.is_memory() {
            return;
        }

        let (rs, rt) = self.gather_operands(Stage::Mem, regs);
        let addr = rs.wrapping_add(rt);
        let done = if op == Opcode::Lw {
            match cache.read(addr, bus) {
                Some(word) => {
                    self.slots[Stage::Mem as usize].result = word;
                    true
                }
                None => false,
            }
        } else {
            cache.write(addr, self.slots[Stage::Mem as usize].result, bus)
        };
        self.mem_stall = !done;
    }

    fn write_back(&mut self, regs: &mut RegisterFile) {
        let slot = &self.slots[Stage::WriteBack as usize];
        let dest = if slot.inst.opcode() == Some(Opcode::Jal) {
            LINK_REG
        } else {
            slot.inst.rd()
        };
        regs.write(dest, slot.result);
    }

    /// Loads the operand pack for the instruction in `stage`: R1 takes the
    /// sign-extended immediate first, then the old rd value is captured as
    /// the stage result and the rs/rt values are read out.
    fn gather_operands(&mut self, stage: Stage, regs: &mut RegisterFile) -> (u32, u32) {
        let inst = self.slots[stage as usize].inst;
        regs.write(crate::common::constants::IMM_REG, inst.imm());
        self.slots[stage as usize].result = regs.read(inst.rd());
        (regs.read(inst.rs()), regs.read(inst.rt()))
    }
}
