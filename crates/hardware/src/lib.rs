//! Cycle-accurate four-core multicore simulator library.
//!
//! This crate models a four-core processor with MESI-coherent data caches on
//! a shared snoopy bus:
//! 1. **Cores:** Five-stage in-order pipelines over a small 32-bit
//!    instruction set; branches resolve in decode.
//! 2. **Caches:** Direct-mapped write-back write-allocate data caches (256
//!    words, 4-word blocks) with MESI snooping.
//! 3. **Bus:** A single shared bus serializing all coherence transactions,
//!    with cache-to-cache supply for Modified blocks.
//! 4. **Memory:** A flat 2^20-word main memory with fixed access latency.
//! 5. **Simulation:** `Simulator` (cores + caches + bus + memory), hex image
//!    loaders, per-cycle trace files, and end-of-run dumps.

/// Common types and constants (addresses, registers, errors).
pub mod common;
/// Simulator configuration.
pub mod config;
/// Processor core (pipeline, cache).
pub mod core;
/// Instruction set (decode, opcode table, ALU).
pub mod isa;
/// Simulation: `Simulator`, loaders, file plumbing.
pub mod sim;
/// Interconnect: bus, participant traits, main memory.
pub mod soc;
/// Statistics records and emission.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// One processor core.
pub use crate::core::Core;
/// Top-level simulator; owns the machine and its output handles.
pub use crate::sim::Simulator;
/// The shared bus arbiter.
pub use crate::soc::Bus;
