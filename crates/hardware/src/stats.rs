//! Simulation statistics collection and reporting.
//!
//! This module tracks the per-core counters emitted into the `statsN.txt`
//! files. It provides:
//! 1. **Cache counters:** Read/write hits and misses.
//! 2. **Pipeline counters:** Decode (hazard) stalls and memory stalls.
//! 3. **Core counters:** Cycles and retired instructions.
//! 4. **Emission:** The fixed `key value` text layout of the stats files.

use std::io::{self, Write};

/// Hit/miss counters of one data cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// CPU reads served from the cache.
    pub read_hits: u64,
    /// CPU reads that had to fetch the block over the bus.
    pub read_misses: u64,
    /// CPU writes committed in place.
    pub write_hits: u64,
    /// CPU writes that needed ownership or a fill first.
    pub write_misses: u64,
}

/// Stall counters of one pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Cycles lost to read-after-write hazards (counted only when the memory
    /// stage is not also stalled).
    pub decode_stalls: u64,
    /// Cycles in which the memory stage could not complete its access.
    pub mem_stalls: u64,
}

/// Cycle and instruction counters of one core.
///
/// The cycle counter starts at -1 and pre-increments each stepped cycle, so
/// the first traced cycle is 0. Stats emission reports `cycles + 1` and
/// `instructions - 1`; a core that starts halted therefore reports
/// `cycles 0` and `instructions -1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreCounters {
    /// Cycles the core has been stepped (-1 before the first cycle).
    pub cycles: i64,
    /// Cycles in which an instruction advanced (no halt, no stall).
    pub instructions: i64,
}

impl Default for CoreCounters {
    fn default() -> Self {
        Self {
            cycles: -1,
            instructions: 0,
        }
    }
}

/// Writes one core's stats file.
///
/// # Errors
///
/// Propagates I/O errors from the writer.
pub fn write_core_stats(
    out: &mut dyn Write,
    counters: &CoreCounters,
    cache: &CacheStats,
    pipeline: &PipelineStats,
) -> io::Result<()> {
    writeln!(out, "cycles {}", counters.cycles + 1)?;
    writeln!(out, "instructions {}", counters.instructions - 1)?;
    writeln!(out, "read_hit {}", cache.read_hits)?;
    writeln!(out, "write_hit {}", cache.write_hits)?;
    writeln!(out, "read_miss {}", cache.read_misses)?;
    writeln!(out, "write_miss {}", cache.write_misses)?;
    writeln!(out, "decode_stall {}", pipeline.decode_stalls)?;
    writeln!(out, "mem_stall {}", pipeline.mem_stalls)?;
    Ok(())
}
